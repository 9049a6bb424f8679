// Hierarchy behaviour: weight aggregation, capacity enforcement, cascade
// delete and reparenting.

mod common;

use blocs_backend::common::error::AppError;
use blocs_backend::services::bloc_service::NewBloc;
use common::{actor, bloc, create_one, setup, warehouse};
use uuid::Uuid;

#[tokio::test]
async fn child_weight_flows_into_parent_aggregate() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let parent = create_one(
        &services,
        NewBloc {
            weight: Some(5.0),
            max_weight: Some(100.0),
            ..bloc("Pallet", wh)
        },
        user,
    )
    .await;
    create_one(
        &services,
        NewBloc {
            parent: Some(parent.id),
            weight: Some(3.0),
            ..bloc("Box", wh)
        },
        user,
    )
    .await;

    let parent = stores.blocs.find(parent.id).await.unwrap().unwrap();
    assert_eq!(parent.weight, Some(8.0));
}

#[tokio::test]
async fn creation_over_capacity_fails_that_item_only() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let parent = create_one(
        &services,
        NewBloc {
            weight: Some(5.0),
            max_weight: Some(6.0),
            ..bloc("Pallet", wh)
        },
        user,
    )
    .await;
    let result = services
        .blocs
        .create_blocs(
            NewBloc {
                parent: Some(parent.id),
                weight: Some(3.0),
                ..bloc("Box", wh)
            },
            user,
        )
        .await
        .unwrap();

    assert!(result.created.is_empty());
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].error.kind, "CAPACITY_EXCEEDED");

    // the rejected item must not have touched the parent
    let parent = stores.blocs.find(parent.id).await.unwrap().unwrap();
    assert_eq!(parent.weight, Some(5.0));
}

#[tokio::test]
async fn capacity_failure_spares_fitting_siblings() {
    let (services, _) = setup();
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
    // 3 siblings of 2kg against a 5kg ceiling: two fit, the third does not
    let result = services
        .blocs
        .create_blocs(
            NewBloc {
                parent: Some(parent.id),
                weight: Some(2.0),
                count: 3,
                ..bloc("Box", wh)
            },
            user,
        )
        .await
        .unwrap();

    assert_eq!(result.created.len(), 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].index, 2);
}

#[tokio::test]
async fn delete_cascades_through_subtree_and_notes() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(&services, bloc("A", wh), user).await;
    let b = create_one(
        &services,
        NewBloc {
            parent: Some(a.id),
            ..bloc("B", wh)
        },
        user,
    )
    .await;
    let c = create_one(
        &services,
        NewBloc {
            parent: Some(b.id),
            ..bloc("C", wh)
        },
        user,
    )
    .await;
    let note = services
        .notes
        .create(c.id, "fragile".into(), user)
        .await
        .unwrap();

    services.blocs.delete_bloc(a.id, user).await.unwrap();

    assert!(stores.blocs.find(a.id).await.unwrap().is_none());
    assert!(stores.blocs.find(b.id).await.unwrap().is_none());
    assert!(stores.blocs.find(c.id).await.unwrap().is_none());
    assert!(stores.notes.find(note.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_settles_parent_weight() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let parent = create_one(
        &services,
        NewBloc {
            weight: Some(10.0),
            ..bloc("Pallet", wh)
        },
        user,
    )
    .await;
    let child = create_one(
        &services,
        NewBloc {
            parent: Some(parent.id),
            weight: Some(4.0),
            ..bloc("Box", wh)
        },
        user,
    )
    .await;

    services.blocs.delete_bloc(child.id, user).await.unwrap();

    let parent = stores.blocs.find(parent.id).await.unwrap().unwrap();
    assert_eq!(parent.weight, Some(10.0));
}

#[tokio::test]
async fn reparent_moves_weight_between_parents() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(
        &services,
        NewBloc {
            weight: Some(10.0),
            max_weight: Some(100.0),
            ..bloc("A", wh)
        },
        user,
    )
    .await;
    let b = create_one(
        &services,
        NewBloc {
            max_weight: Some(100.0),
            ..bloc("B", wh)
        },
        user,
    )
    .await;
    let c = create_one(
        &services,
        NewBloc {
            parent: Some(a.id),
            weight: Some(4.0),
            ..bloc("C", wh)
        },
        user,
    )
    .await;

    let moved = services
        .blocs
        .change_parent(c.id, Some(b.id), user)
        .await
        .unwrap();
    assert_eq!(moved.parent(), Some(b.id));

    let a = stores.blocs.find(a.id).await.unwrap().unwrap();
    let b = stores.blocs.find(b.id).await.unwrap().unwrap();
    assert_eq!(a.weight, Some(10.0));
    assert_eq!(b.weight, Some(4.0));
}

#[tokio::test]
async fn reparent_over_capacity_leaves_everything_in_place() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(&services, bloc("A", wh), user).await;
    let b = create_one(
        &services,
        NewBloc {
            weight: Some(5.0),
            max_weight: Some(6.0),
            ..bloc("B", wh)
        },
        user,
    )
    .await;
    let c = create_one(
        &services,
        NewBloc {
            parent: Some(a.id),
            weight: Some(4.0),
            ..bloc("C", wh)
        },
        user,
    )
    .await;

    let err = services
        .blocs
        .change_parent(c.id, Some(b.id), user)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded { .. }));

    let c = stores.blocs.find(c.id).await.unwrap().unwrap();
    let b = stores.blocs.find(b.id).await.unwrap().unwrap();
    assert_eq!(c.parent(), Some(a.id));
    assert_eq!(b.weight, Some(5.0));
}

#[tokio::test]
async fn reparent_into_own_subtree_is_rejected() {
    let (services, _) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(&services, bloc("A", wh), user).await;
    let b = create_one(
        &services,
        NewBloc {
            parent: Some(a.id),
            ..bloc("B", wh)
        },
        user,
    )
    .await;

    let err = services
        .blocs
        .change_parent(a.id, Some(b.id), user)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CycleDetected));

    let err = services
        .blocs
        .change_parent(a.id, Some(a.id), user)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CycleDetected));
}

#[tokio::test]
async fn reparent_rejects_parent_from_another_warehouse() {
    let (services, _) = setup();
    let user = actor();
    let wh1 = warehouse(&services, user).await;
    let wh2 = warehouse(&services, user).await;

    let a = create_one(&services, bloc("A", wh1), user).await;
    let other = create_one(&services, bloc("Other", wh2), user).await;

    let err = services
        .blocs
        .change_parent(a.id, Some(other.id), user)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::WrongWarehouse));
}

#[tokio::test]
async fn batch_reparent_skips_unknown_ids() {
    let (services, _) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let parent = create_one(&services, bloc("Pallet", wh), user).await;
    let a = create_one(&services, bloc("A", wh), user).await;
    let ghost = Uuid::new_v4();

    let results = services
        .blocs
        .change_parents_batch(&[a.id, ghost], Some(parent.id), user)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_updated());
    assert!(!results[1].is_updated());
}

#[tokio::test]
async fn root_and_child_lists_stay_exclusive() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let root = create_one(&services, bloc("Root", wh), user).await;
    let child = create_one(
        &services,
        NewBloc {
            parent: Some(root.id),
            ..bloc("Child", wh)
        },
        user,
    )
    .await;

    let roots = services.blocs.roots(wh, user).await.unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, root.id);

    services
        .blocs
        .change_parent(child.id, None, user)
        .await
        .unwrap();

    let roots = services.blocs.roots(wh, user).await.unwrap();
    assert_eq!(roots.len(), 2);
    assert!(stores
        .blocs
        .children_of(root.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn update_weight_pushes_delta_into_parent() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let parent = create_one(
        &services,
        NewBloc {
            max_weight: Some(10.0),
            ..bloc("Pallet", wh)
        },
        user,
    )
    .await;
    let child = create_one(
        &services,
        NewBloc {
            parent: Some(parent.id),
            weight: Some(2.0),
            ..bloc("Box", wh)
        },
        user,
    )
    .await;

    services
        .blocs
        .update_bloc(
            child.id,
            blocs_backend::services::bloc_service::BlocPatch {
                weight: Some(7.0),
                ..Default::default()
            },
            user,
        )
        .await
        .unwrap();

    let parent = stores.blocs.find(parent.id).await.unwrap().unwrap();
    assert_eq!(parent.weight, Some(7.0));

    let err = services
        .blocs
        .update_bloc(
            child.id,
            blocs_backend::services::bloc_service::BlocPatch {
                weight: Some(20.0),
                ..Default::default()
            },
            user,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded { .. }));
}

#[tokio::test]
async fn get_bloc_resolves_children_and_ancestors() {
    let (services, _) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(&services, bloc("A", wh), user).await;
    let b = create_one(
        &services,
        NewBloc {
            parent: Some(a.id),
            ..bloc("B", wh)
        },
        user,
    )
    .await;
    let c = create_one(
        &services,
        NewBloc {
            parent: Some(b.id),
            ..bloc("C", wh)
        },
        user,
    )
    .await;

    let detail = services.blocs.get_bloc(c.id, user).await.unwrap();
    assert_eq!(detail.bloc.id, c.id);
    assert!(detail.children.is_empty());
    let chain: Vec<_> = detail.ancestors.iter().map(|x| x.id).collect();
    assert_eq!(chain, vec![b.id, a.id]);

    let detail = services.blocs.get_bloc(b.id, user).await.unwrap();
    assert_eq!(detail.children.len(), 1);
    assert_eq!(detail.children[0].id, c.id);
}

#[tokio::test]
async fn rejected_combined_update_writes_nothing() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(&services, bloc("A", wh), user).await;
    let b = create_one(
        &services,
        NewBloc {
            max_weight: Some(5.0),
            ..bloc("B", wh)
        },
        user,
    )
    .await;
    let c = create_one(
        &services,
        NewBloc {
            parent: Some(a.id),
            weight: Some(2.0),
            ..bloc("C", wh)
        },
        user,
    )
    .await;

    // 7kg does not fit under B; the whole patch must be refused atomically
    let err = services
        .blocs
        .update_bloc(
            c.id,
            blocs_backend::services::bloc_service::BlocPatch {
                weight: Some(7.0),
                parent: Some(blocs_backend::models::Container::Child(b.id)),
                ..Default::default()
            },
            user,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded { .. }));

    let a = stores.blocs.find(a.id).await.unwrap().unwrap();
    let b = stores.blocs.find(b.id).await.unwrap().unwrap();
    let c = stores.blocs.find(c.id).await.unwrap().unwrap();
    assert_eq!(a.weight, Some(2.0));
    assert_eq!(b.weight, None);
    assert_eq!(c.weight, Some(2.0));
    assert_eq!(c.parent(), Some(a.id));
}

#[tokio::test]
async fn combined_update_carries_the_new_weight_into_the_new_parent() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let a = create_one(&services, bloc("A", wh), user).await;
    let b = create_one(
        &services,
        NewBloc {
            max_weight: Some(10.0),
            ..bloc("B", wh)
        },
        user,
    )
    .await;
    let c = create_one(
        &services,
        NewBloc {
            parent: Some(a.id),
            weight: Some(2.0),
            ..bloc("C", wh)
        },
        user,
    )
    .await;

    let updated = services
        .blocs
        .update_bloc(
            c.id,
            blocs_backend::services::bloc_service::BlocPatch {
                weight: Some(7.0),
                parent: Some(blocs_backend::models::Container::Child(b.id)),
                ..Default::default()
            },
            user,
        )
        .await
        .unwrap();
    assert_eq!(updated.weight, Some(7.0));
    assert_eq!(updated.parent(), Some(b.id));

    // the old parent loses the old weight, the new one gains the new weight
    let a = stores.blocs.find(a.id).await.unwrap().unwrap();
    let b = stores.blocs.find(b.id).await.unwrap().unwrap();
    assert_eq!(a.weight, Some(0.0));
    assert_eq!(b.weight, Some(7.0));
}
