mod common;

use assert_matches::assert_matches;
use common::TestApp;
use resale_catalog::ServiceError;

#[tokio::test]
async fn self_join_recovers_parent_names() {
    let app = TestApp::new().await;
    let fx = app.seed().await;

    let rows = app.services.catalog.categories_with_parent().await.unwrap();
    let handbags = rows.iter().find(|r| r.id == fx.handbags.id).unwrap();
    assert_eq!(handbags.parent_id, Some(fx.bags.id));
    assert_eq!(handbags.parent_name.as_deref(), Some("Bags"));

    let bags = rows.iter().find(|r| r.id == fx.bags.id).unwrap();
    assert_eq!(bags.parent_name, None);
}

#[tokio::test]
async fn traversal_walks_up_and_down_the_tree() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let catalog = &app.services.catalog;
    let mini = catalog
        .create_category("Mini Bags", Some(fx.handbags.id))
        .await
        .unwrap();
    let clutches = catalog
        .create_category("Clutches", Some(fx.bags.id))
        .await
        .unwrap();

    let ancestors: Vec<i32> = catalog
        .category_ancestors(mini.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ancestors, vec![fx.handbags.id, fx.bags.id]);

    let descendants: Vec<i32> = catalog
        .category_descendants(fx.bags.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(descendants, vec![fx.handbags.id, clutches.id, mini.id]);

    assert_eq!(
        catalog.category_path(mini.id).await.unwrap(),
        "Bags > Handbags > Mini Bags"
    );
    assert_matches!(
        catalog.category_ancestors(31_337).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn cycles_are_rejected() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let catalog = &app.services.catalog;
    let mini = catalog
        .create_category("Mini Bags", Some(fx.handbags.id))
        .await
        .unwrap();

    assert_matches!(
        catalog.move_category(fx.bags.id, Some(mini.id)).await,
        Err(ServiceError::InvalidOperation(_))
    );
    assert_matches!(
        catalog.move_category(fx.handbags.id, Some(fx.handbags.id)).await,
        Err(ServiceError::InvalidOperation(_))
    );
    assert_matches!(
        catalog.create_category("Orphan", Some(9_999)).await,
        Err(ServiceError::NotFound(_))
    );

    // A legal move: Mini Bags directly under Bags, then to the top level
    let moved = catalog.move_category(mini.id, Some(fx.bags.id)).await.unwrap();
    assert_eq!(moved.parent_id, Some(fx.bags.id));
    let root = catalog.move_category(mini.id, None).await.unwrap();
    assert_eq!(root.parent_id, None);
    assert!(catalog.category_ancestors(mini.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn default_conditions_are_seeded_once() {
    let app = TestApp::new().await;
    let first = app.services.catalog.ensure_default_conditions().await.unwrap();
    let second = app.services.catalog.ensure_default_conditions().await.unwrap();
    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
}
