// Batch mutations: per-item independence, numbering, tags, dimensions.

mod common;

use blocs_backend::services::batch_service::DimensionsPatch;
use blocs_backend::services::bloc_service::NewBloc;
use common::{actor, bloc, create_one, setup, warehouse};
use uuid::Uuid;

#[tokio::test]
async fn create_count_numbers_names_in_order() {
    let (services, _) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let result = services
        .blocs
        .create_blocs(
            NewBloc {
                count: 3,
                same_name_for_all: false,
                ..bloc("Crate", wh)
            },
            user,
        )
        .await
        .unwrap();

    let names: Vec<_> = result.created.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Crate_1", "Crate_2", "Crate_3"]);
}

#[tokio::test]
async fn create_count_can_share_one_name() {
    let (services, _) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let result = services
        .blocs
        .create_blocs(
            NewBloc {
                count: 3,
                same_name_for_all: true,
                ..bloc("Crate", wh)
            },
            user,
        )
        .await
        .unwrap();

    assert_eq!(result.created.len(), 3);
    assert!(result.created.iter().all(|b| b.name == "Crate"));
}

#[tokio::test]
async fn rename_follows_input_order() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(&services, bloc("Old1", wh), user).await;
    let b = create_one(&services, bloc("Old2", wh), user).await;
    let c = create_one(&services, bloc("Old3", wh), user).await;

    let results = services
        .batch
        .rename(&[b.id, a.id, c.id], "Box", false, user)
        .await
        .unwrap();
    assert!(results.iter().all(|r| r.is_updated()));

    assert_eq!(stores.blocs.find(b.id).await.unwrap().unwrap().name, "Box_1");
    assert_eq!(stores.blocs.find(a.id).await.unwrap().unwrap().name, "Box_2");
    assert_eq!(stores.blocs.find(c.id).await.unwrap().unwrap().name, "Box_3");
}

#[tokio::test]
async fn rename_skips_unknown_ids_and_continues() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(&services, bloc("Old", wh), user).await;
    let ghost = Uuid::new_v4();

    let results = services
        .batch
        .rename(&[ghost, a.id], "Box", true, user)
        .await
        .unwrap();

    assert!(!results[0].is_updated());
    assert!(results[1].is_updated());
    assert_eq!(stores.blocs.find(a.id).await.unwrap().unwrap().name, "Box");
}

#[tokio::test]
async fn resize_applies_only_provided_fields() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(
        &services,
        NewBloc {
            width: Some(1.0),
            height: Some(2.0),
            ..bloc("A", wh)
        },
        user,
    )
    .await;

    services
        .batch
        .resize(
            &[a.id],
            DimensionsPatch {
                width: Some(9.0),
                ..Default::default()
            },
            user,
        )
        .await
        .unwrap();

    let a = stores.blocs.find(a.id).await.unwrap().unwrap();
    assert_eq!(a.width, Some(9.0));
    assert_eq!(a.height, Some(2.0));
}

#[tokio::test]
async fn resize_weight_respects_parent_capacity_per_item() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let parent = create_one(
        &services,
        NewBloc {
            max_weight: Some(5.0),
            ..bloc("Pallet", wh)
        },
        user,
    )
    .await;
    let first = create_one(
        &services,
        NewBloc {
            parent: Some(parent.id),
            weight: Some(1.0),
            ..bloc("A", wh)
        },
        user,
    )
    .await;
    let second = create_one(
        &services,
        NewBloc {
            parent: Some(parent.id),
            weight: Some(1.0),
            ..bloc("B", wh)
        },
        user,
    )
    .await;

    // 4kg each: the first fits (2 -> 5), the second would blow the ceiling
    let results = services
        .batch
        .resize(
            &[first.id, second.id],
            DimensionsPatch {
                weight: Some(4.0),
                ..Default::default()
            },
            user,
        )
        .await
        .unwrap();

    assert!(results[0].is_updated());
    assert!(!results[1].is_updated());

    let parent = stores.blocs.find(parent.id).await.unwrap().unwrap();
    assert_eq!(parent.weight, Some(5.0));
    let second = stores.blocs.find(second.id).await.unwrap().unwrap();
    assert_eq!(second.weight, Some(1.0));
}

#[tokio::test]
async fn retag_union_never_duplicates() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let t1 = services
        .tags
        .create(wh, "fragile".into(), "#ff0000".into(), user)
        .await
        .unwrap();
    let t2 = services
        .tags
        .create(wh, "heavy".into(), "#0000ff".into(), user)
        .await
        .unwrap();

    let a = create_one(
        &services,
        NewBloc {
            tags: vec![t1.id],
            ..bloc("A", wh)
        },
        user,
    )
    .await;

    services
        .batch
        .retag(&[a.id], vec![t1.id, t2.id], false, user)
        .await
        .unwrap();
    services
        .batch
        .retag(&[a.id], vec![t1.id, t2.id], false, user)
        .await
        .unwrap();

    let a = stores.blocs.find(a.id).await.unwrap().unwrap();
    assert_eq!(a.tags, vec![t1.id, t2.id]);
}

#[tokio::test]
async fn retag_replace_mode_swaps_the_set() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let t1 = services
        .tags
        .create(wh, "fragile".into(), "#ff0000".into(), user)
        .await
        .unwrap();
    let t2 = services
        .tags
        .create(wh, "heavy".into(), "#0000ff".into(), user)
        .await
        .unwrap();

    let a = create_one(
        &services,
        NewBloc {
            tags: vec![t1.id],
            ..bloc("A", wh)
        },
        user,
    )
    .await;

    services
        .batch
        .retag(&[a.id], vec![t2.id], true, user)
        .await
        .unwrap();

    let a = stores.blocs.find(a.id).await.unwrap().unwrap();
    assert_eq!(a.tags, vec![t2.id]);
}

#[tokio::test]
async fn retag_drops_unknown_tag_ids() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let t1 = services
        .tags
        .create(wh, "fragile".into(), "#ff0000".into(), user)
        .await
        .unwrap();
    let a = create_one(&services, bloc("A", wh), user).await;

    services
        .batch
        .retag(&[a.id], vec![t1.id, Uuid::new_v4()], false, user)
        .await
        .unwrap();

    let a = stores.blocs.find(a.id).await.unwrap().unwrap();
    assert_eq!(a.tags, vec![t1.id]);
}

#[tokio::test]
async fn set_picture_points_every_bloc_at_one_blob() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(&services, bloc("A", wh), user).await;
    let b = create_one(&services, bloc("B", wh), user).await;

    let results = services
        .batch
        .set_picture(&[a.id, b.id], "/uploads/bloc/1.png", user)
        .await
        .unwrap();
    assert!(results.iter().all(|r| r.is_updated()));

    for id in [a.id, b.id] {
        let stored = stores.blocs.find(id).await.unwrap().unwrap();
        assert_eq!(stored.picture.as_deref(), Some("/uploads/bloc/1.png"));
    }
}
