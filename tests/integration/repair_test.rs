//! Integration tests for closure verification and rebuild.

mod helpers;

use helpers::TestApp;
use threadhub_core::error::ErrorKind;
use threadhub_database::CommentStore;
use threadhub_entity::ClosureEdge;
use threadhub_service::ClosureIssue;

struct Tree {
    app: TestApp,
    root: threadhub::CommentView,
    child: threadhub::CommentView,
    leaf: threadhub::CommentView,
}

async fn tree() -> Tree {
    let app = TestApp::new();
    let root = app.root(&app.alice, "root").await;
    let child = app.reply(&app.bob, root.id, "child").await;
    let leaf = app.reply(&app.alice, child.id, "leaf").await;
    app.reply(&app.bob, root.id, "sibling").await;
    Tree {
        app,
        root,
        child,
        leaf,
    }
}

#[tokio::test]
async fn test_healthy_table_verifies_clean() {
    let t = tree().await;
    let report = t.app.engine.repair().verify().await.expect("verify");

    assert!(report.is_consistent());
    assert_eq!(report.comments_checked, 4);
    assert_eq!(report.edges_checked, 1 + 2 + 3 + 2);
}

#[tokio::test]
async fn test_missing_edges_are_reported_and_rebuilt() {
    let t = tree().await;
    let original = t.app.edges(t.leaf.id).await;
    t.app.store.strip_edges(t.leaf.id).await;

    let report = t.app.engine.repair().verify().await.expect("verify");
    assert_eq!(report.issues.len(), 3);
    assert!(report.issues.contains(&ClosureIssue::MissingEdge {
        descendant_id: t.leaf.id,
        ancestor_id: t.root.id,
        depth: 2,
    }));

    let rebuilt = t.app.engine.repair().rebuild().await.expect("rebuild");
    assert_eq!(rebuilt.comments_rebuilt, 4);
    assert_eq!(rebuilt.edges_written, 8);
    assert!(rebuilt.skipped.is_empty());

    assert_eq!(t.app.edges(t.leaf.id).await, original);
    assert!(t.app.engine.repair().verify().await.expect("verify").is_consistent());
}

#[tokio::test]
async fn test_unexpected_and_misdepthed_edges_are_reported() {
    let t = tree().await;
    let sibling_id = t.app.engine.get_replies(t.root.id).await.expect("replies")[1].id;

    t.app
        .store
        .inject_edges(&[ClosureEdge {
            descendant_id: sibling_id,
            ancestor_id: t.child.id,
            depth: 1,
        }])
        .await;
    t.app.store.strip_edges(t.child.id).await;
    t.app
        .store
        .inject_edges(&[
            ClosureEdge::self_edge(t.child.id),
            ClosureEdge {
                descendant_id: t.child.id,
                ancestor_id: t.root.id,
                depth: 4,
            },
        ])
        .await;

    let report = t.app.engine.repair().verify().await.expect("verify");
    assert!(report.issues.contains(&ClosureIssue::UnexpectedEdge {
        descendant_id: sibling_id,
        ancestor_id: t.child.id,
        depth: 1,
    }));
    assert!(report.issues.contains(&ClosureIssue::WrongDepth {
        descendant_id: t.child.id,
        ancestor_id: t.root.id,
        expected: 1,
        actual: 4,
    }));

    t.app.engine.repair().rebuild().await.expect("rebuild");
    let report = t.app.engine.repair().verify().await.expect("verify");
    assert!(report.is_consistent(), "issues: {:?}", report.issues);
}

#[tokio::test]
async fn test_duplicate_edges_are_reported_and_rebuilt() {
    let t = tree().await;
    t.app
        .store
        .inject_edges(&[ClosureEdge::self_edge(t.root.id)])
        .await;
    assert_eq!(t.app.edges(t.root.id).await.len(), 2);

    let report = t.app.engine.repair().verify().await.expect("verify");
    assert!(!report.is_consistent());
    assert_eq!(
        report.issues,
        vec![ClosureIssue::DuplicateEdge {
            descendant_id: t.root.id,
            ancestor_id: t.root.id,
            count: 2,
        }]
    );

    t.app.engine.repair().rebuild().await.expect("rebuild");
    assert_eq!(t.app.edges(t.root.id).await.len(), 1);
    assert!(t.app.engine.repair().verify().await.expect("verify").is_consistent());
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let t = tree().await;
    let before = t.app.store.count_edges().await.expect("count");

    t.app.engine.repair().rebuild().await.expect("first rebuild");
    t.app.engine.repair().rebuild().await.expect("second rebuild");

    assert_eq!(t.app.store.count_edges().await.expect("count"), before);
    assert!(t.app.engine.repair().verify().await.expect("verify").is_consistent());
}

#[tokio::test]
async fn test_rebuild_unblocks_writes_under_damaged_parent() {
    let t = tree().await;
    t.app.store.strip_edges(t.child.id).await;

    let err = t
        .app
        .engine
        .create_comment(&t.app.bob, t.app.post_id, Some(t.child.id), "blocked")
        .await
        .expect_err("parent has no edges");
    assert_eq!(err.kind, ErrorKind::Consistency);

    t.app.engine.repair().rebuild().await.expect("rebuild");

    let reply = t.app.reply(&t.app.bob, t.child.id, "unblocked").await;
    let ancestors = t.app.engine.get_ancestors(reply.id).await.expect("ancestors");
    assert_eq!(
        ancestors.iter().map(|v| v.id).collect::<Vec<_>>(),
        vec![t.child.id, t.root.id]
    );
}
