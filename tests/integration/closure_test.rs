//! Integration tests for closure table maintenance.

mod helpers;

use std::collections::HashSet;

use helpers::{TestApp, ids};
use threadhub_core::error::ErrorKind;
use threadhub_core::types::{CommentId, PostId};
use threadhub_database::CommentStore;
use threadhub_entity::ClosureEdge;

#[tokio::test]
async fn test_root_comment_has_no_relatives() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "first").await;

    assert!(app.engine.get_ancestors(r1.id).await.expect("ancestors").is_empty());
    assert!(app.engine.get_descendants(r1.id).await.expect("descendants").is_empty());
    assert_eq!(app.edges(r1.id).await, vec![ClosureEdge::self_edge(r1.id)]);
}

#[tokio::test]
async fn test_reply_chain_relations() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let c1 = app.reply(&app.bob, r1.id, "child").await;
    let c2 = app.reply(&app.alice, c1.id, "grandchild").await;

    let ancestors = app.engine.get_ancestors(c2.id).await.expect("ancestors");
    assert_eq!(ids(&ancestors), vec![c1.id, r1.id]);

    let descendants = app.engine.get_descendants(r1.id).await.expect("descendants");
    assert_eq!(ids(&descendants), vec![c1.id, c2.id]);
    assert_eq!(
        descendants.iter().map(|v| v.depth).collect::<Vec<_>>(),
        vec![Some(1), Some(2)]
    );

    assert_eq!(ids(&app.engine.get_replies(r1.id).await.expect("replies")), vec![c1.id]);
    assert_eq!(ids(&app.engine.get_replies(c1.id).await.expect("replies")), vec![c2.id]);
    assert!(app.engine.get_replies(c2.id).await.expect("replies").is_empty());
}

#[tokio::test]
async fn test_edge_count_and_depths_follow_parent_chain() {
    let app = TestApp::new();
    let mut chain = vec![app.root(&app.alice, "level 0").await.id];
    for level in 1..8 {
        let parent = chain[level - 1];
        chain.push(app.reply(&app.alice, parent, &format!("level {level}")).await.id);
    }

    for (depth, id) in chain.iter().enumerate() {
        let edges = app.edges(*id).await;
        assert_eq!(edges.len(), depth + 1, "comment at depth {depth}");

        let self_edges: Vec<_> = edges.iter().filter(|e| e.is_self_edge()).collect();
        assert_eq!(self_edges.len(), 1);

        for edge in &edges {
            let ancestor_index = chain
                .iter()
                .position(|c| *c == edge.ancestor_id)
                .expect("ancestor is on the chain");
            assert_eq!(edge.depth as usize, depth - ancestor_index);
        }

        if depth > 0 {
            let parent_edges = app.edges(chain[depth - 1]).await;
            for parent_edge in &parent_edges {
                assert!(edges.contains(&ClosureEdge::extend(*id, parent_edge)));
            }
        }
    }

    let expected_total: usize = (1..=chain.len()).sum();
    assert_eq!(
        app.store.count_edges().await.expect("count") as usize,
        expected_total
    );
}

#[tokio::test]
async fn test_existing_edges_are_never_rewritten() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let c1 = app.reply(&app.bob, r1.id, "child").await;
    let before = (app.edges(r1.id).await, app.edges(c1.id).await);

    let c2 = app.reply(&app.alice, c1.id, "grandchild").await;
    app.reply(&app.bob, r1.id, "sibling").await;
    app.reply(&app.bob, c2.id, "deep").await;

    assert_eq!((app.edges(r1.id).await, app.edges(c1.id).await), before);
}

#[tokio::test]
async fn test_queries_are_idempotent() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let c1 = app.reply(&app.bob, r1.id, "child").await;
    app.reply(&app.alice, c1.id, "grandchild").await;
    app.reply(&app.alice, r1.id, "sibling").await;

    let first = (
        app.engine.get_descendants(r1.id).await.expect("descendants"),
        app.engine.get_thread(c1.id).await.expect("thread"),
    );
    let second = (
        app.engine.get_descendants(r1.id).await.expect("descendants"),
        app.engine.get_thread(c1.id).await.expect("thread"),
    );
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_parent_is_rejected_without_writes() {
    let app = TestApp::new();
    app.root(&app.alice, "root").await;

    let err = app
        .engine
        .create_comment(&app.bob, app.post_id, Some(CommentId::new()), "orphan")
        .await
        .expect_err("parent does not exist");

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(app.store.len().await, 1);
    assert_eq!(app.store.count_edges().await.expect("count"), 1);
}

#[tokio::test]
async fn test_parent_on_another_post_is_rejected() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;

    let err = app
        .engine
        .create_comment(&app.bob, PostId::new(), Some(r1.id), "wrong post")
        .await
        .expect_err("cross-post reply");

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn test_corrupt_parent_rows_abort_creation() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let c1 = app.reply(&app.bob, r1.id, "child").await;
    app.store.strip_edges(c1.id).await;
    app.store
        .inject_edges(&[ClosureEdge {
            descendant_id: c1.id,
            ancestor_id: r1.id,
            depth: 1,
        }])
        .await;

    let err = app
        .engine
        .create_comment(&app.alice, app.post_id, Some(c1.id), "reply to damaged parent")
        .await
        .expect_err("parent has no self edge");

    assert_eq!(err.kind, ErrorKind::Consistency);
    assert_eq!(app.store.len().await, 2);
    assert_eq!(app.edges(c1.id).await.len(), 1);
}

#[tokio::test]
async fn test_branching_tree_is_consistent() {
    let app = TestApp::new();
    let mut created = Vec::new();
    for r in 0..3 {
        let root = app.root(&app.alice, &format!("root {r}")).await;
        created.push(root.id);
        for c in 0..3 {
            let child = app.reply(&app.bob, root.id, &format!("child {r}.{c}")).await;
            created.push(child.id);
            for g in 0..2 {
                let ctx = if g == 0 { &app.alice } else { &app.bob };
                created.push(app.reply(ctx, child.id, "leaf").await.id);
            }
        }
    }

    let report = app.engine.repair().verify().await.expect("verify");
    assert!(report.is_consistent(), "issues: {:?}", report.issues);
    assert_eq!(report.comments_checked as usize, created.len());
    // 3 roots * 1 + 9 children * 2 + 18 leaves * 3
    assert_eq!(report.edges_checked, 3 + 18 + 54);

    let unique: HashSet<_> = created.iter().collect();
    assert_eq!(unique.len(), created.len());
}
