// Cross-warehouse migration of whole subtrees.

mod common;

use blocs_backend::common::error::AppError;
use blocs_backend::services::bloc_service::NewBloc;
use common::{actor, bloc, create_one, setup, warehouse};

#[tokio::test]
async fn migration_restamps_every_descendant() {
    let (services, stores) = setup();
    let user = actor();
    let wh1 = warehouse(&services, user).await;
    let wh2 = warehouse(&services, user).await;

    let a = create_one(&services, bloc("A", wh1), user).await;
    let b = create_one(
        &services,
        NewBloc {
            parent: Some(a.id),
            ..bloc("B", wh1)
        },
        user,
    )
    .await;
    let c = create_one(
        &services,
        NewBloc {
            parent: Some(b.id),
            ..bloc("C", wh1)
        },
        user,
    )
    .await;

    services
        .blocs
        .change_warehouse(a.id, wh2, user)
        .await
        .unwrap();

    for id in [a.id, b.id, c.id] {
        let moved = stores.blocs.find(id).await.unwrap().unwrap();
        assert_eq!(moved.warehouse, wh2);
    }
    // links inside the subtree survive the move
    let b = stores.blocs.find(b.id).await.unwrap().unwrap();
    let c = stores.blocs.find(c.id).await.unwrap().unwrap();
    assert_eq!(b.parent(), Some(a.id));
    assert_eq!(c.parent(), Some(b.id));
    assert!(stores.blocs.in_warehouse(wh1).await.unwrap().is_empty());
}

#[tokio::test]
async fn migrated_bloc_detaches_and_becomes_a_root() {
    let (services, stores) = setup();
    let user = actor();
    let wh1 = warehouse(&services, user).await;
    let wh2 = warehouse(&services, user).await;

    let pallet = create_one(
        &services,
        NewBloc {
            weight: Some(10.0),
            ..bloc("Pallet", wh1)
        },
        user,
    )
    .await;
    let boxed = create_one(
        &services,
        NewBloc {
            parent: Some(pallet.id),
            weight: Some(3.0),
            ..bloc("Box", wh1)
        },
        user,
    )
    .await;

    let moved = services
        .blocs
        .change_warehouse(boxed.id, wh2, user)
        .await
        .unwrap();

    assert!(moved.container.is_root());
    assert_eq!(moved.warehouse, wh2);

    let roots = services.blocs.roots(wh2, user).await.unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, boxed.id);

    // the old parent no longer carries the box's weight
    let pallet = stores.blocs.find(pallet.id).await.unwrap().unwrap();
    assert_eq!(pallet.weight, Some(10.0));
}

#[tokio::test]
async fn migration_to_same_warehouse_is_a_noop() {
    let (services, stores) = setup();
    let user = actor();
    let wh = warehouse(&services, user).await;

    let parent = create_one(&services, bloc("Pallet", wh), user).await;
    let child = create_one(
        &services,
        NewBloc {
            parent: Some(parent.id),
            ..bloc("Box", wh)
        },
        user,
    )
    .await;

    services
        .blocs
        .change_warehouse(child.id, wh, user)
        .await
        .unwrap();

    // still attached: no detach happens when nothing moves
    let child = stores.blocs.find(child.id).await.unwrap().unwrap();
    assert_eq!(child.parent(), Some(parent.id));
}

#[tokio::test]
async fn migration_requires_write_access_on_the_target() {
    let (services, _) = setup();
    let owner = actor();
    let stranger = actor();
    let wh1 = warehouse(&services, owner).await;
    let wh2 = warehouse(&services, stranger).await;

    let a = create_one(&services, bloc("A", wh1), owner).await;

    let err = services
        .blocs
        .change_warehouse(a.id, wh2, owner)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied));
}
