//! Integration tests for concurrent comment creation.

mod helpers;

use std::sync::Arc;

use helpers::{TestApp, ids};
use threadhub::RequestContext;
use threadhub_core::error::ErrorKind;
use threadhub_core::types::UserId;
use threadhub_database::{CommentStore, StoreTransaction};
use threadhub_entity::{ClosureEdge, NewComment};
use threadhub_service::ClosureMaintainer;

#[tokio::test]
async fn test_interleaved_replies_to_same_parent() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let c1 = app.reply(&app.bob, r1.id, "child").await;
    let maintainer = ClosureMaintainer::new();

    let new_reply = |content: &str| NewComment {
        post_id: app.post_id,
        author_id: app.alice.actor_id,
        parent_id: Some(c1.id),
        content: content.to_string(),
    };

    let mut tx_a = app.store.begin().await.expect("begin a");
    let c2a = tx_a.insert_comment(new_reply("a")).await.expect("insert a");
    let mut tx_b = app.store.begin().await.expect("begin b");
    let c2b = tx_b.insert_comment(new_reply("b")).await.expect("insert b");

    maintainer.populate(tx_a.as_mut(), &c2a).await.expect("edges a");
    maintainer.populate(tx_b.as_mut(), &c2b).await.expect("edges b");

    tx_a.commit().await.expect("commit a");
    tx_b.commit().await.expect("commit b");

    let replies = app.engine.get_replies(c1.id).await.expect("replies");
    assert_eq!(ids(&replies), vec![c2a.id, c2b.id]);

    for reply in [&c2a, &c2b] {
        let edges = app.edges(reply.id).await;
        assert_eq!(
            edges,
            vec![
                ClosureEdge::self_edge(reply.id),
                ClosureEdge {
                    descendant_id: reply.id,
                    ancestor_id: c1.id,
                    depth: 1
                },
                ClosureEdge {
                    descendant_id: reply.id,
                    ancestor_id: r1.id,
                    depth: 2
                },
            ]
        );
    }

    let report = app.engine.repair().verify().await.expect("verify");
    assert!(report.is_consistent(), "issues: {:?}", report.issues);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_replies() {
    let app = Arc::new(TestApp::new());
    let root_id = app.root(&app.alice, "root").await.id;

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let app = Arc::clone(&app);
            tokio::spawn(async move {
                let ctx = RequestContext::new(UserId::new());
                app.engine
                    .create_comment(&ctx, app.post_id, Some(root_id), &format!("reply {i}"))
                    .await
            })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        result.expect("task panicked").expect("reply created");
    }

    assert_eq!(app.engine.get_replies_count(root_id).await.expect("count"), 32);
    assert_eq!(app.store.count_edges().await.expect("count"), 1 + 32 * 2);

    let report = app.engine.repair().verify().await.expect("verify");
    assert!(report.is_consistent(), "issues: {:?}", report.issues);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_chains_stay_independent() {
    let app = Arc::new(TestApp::new());

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let app = Arc::clone(&app);
            tokio::spawn(async move {
                let ctx = RequestContext::new(UserId::new());
                let mut parent = app
                    .engine
                    .create_comment(&ctx, app.post_id, None, "chain root")
                    .await
                    .expect("root");
                let root_id = parent.id;
                for depth in 1..=6 {
                    parent = app
                        .engine
                        .create_comment(&ctx, app.post_id, Some(parent.id), &format!("d{depth}"))
                        .await
                        .expect("reply");
                }
                (root_id, parent.id)
            })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        let (root_id, leaf_id) = result.expect("task panicked");
        let ancestors = app.engine.get_ancestors(leaf_id).await.expect("ancestors");
        assert_eq!(ancestors.len(), 6);
        assert_eq!(ancestors.last().map(|v| v.id), Some(root_id));
        assert_eq!(app.engine.get_thread(leaf_id).await.expect("thread").size(), 7);
    }
}

#[tokio::test]
async fn test_racing_edge_writers_conflict_on_commit() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    app.store.strip_edges(r1.id).await;

    let mut first = app.store.begin().await.expect("begin");
    let mut second = app.store.begin().await.expect("begin");
    first
        .insert_edges(&[ClosureEdge::self_edge(r1.id)])
        .await
        .expect("stage first");
    second
        .insert_edges(&[ClosureEdge::self_edge(r1.id)])
        .await
        .expect("stage second");

    first.commit().await.expect("first commit wins");
    let err = second.commit().await.expect_err("duplicate pair");
    assert_eq!(err.kind, ErrorKind::Conflict);

    assert_eq!(app.edges(r1.id).await, vec![ClosureEdge::self_edge(r1.id)]);
}

#[tokio::test]
async fn test_uncommitted_comment_is_invisible_to_queries() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;

    let mut tx = app.store.begin().await.expect("begin");
    let pending = tx
        .insert_comment(NewComment {
            post_id: app.post_id,
            author_id: app.bob.actor_id,
            parent_id: Some(r1.id),
            content: "pending".to_string(),
        })
        .await
        .expect("insert");
    ClosureMaintainer::new()
        .populate(tx.as_mut(), &pending)
        .await
        .expect("edges");

    assert!(app.engine.get_replies(r1.id).await.expect("replies").is_empty());
    assert!(app.engine.get_descendants(r1.id).await.expect("descendants").is_empty());

    tx.rollback().await.expect("rollback");
    assert_eq!(app.store.len().await, 1);
    assert_eq!(app.store.count_edges().await.expect("count"), 1);
}
