//! Integration tests for soft-delete visibility and thread assembly.

mod helpers;

use helpers::{TestApp, ids};
use threadhub::{QueryOptions, RequestContext};
use threadhub_core::config::AppConfig;
use threadhub_core::error::ErrorKind;
use threadhub_core::types::{CommentId, UserId};
use threadhub_database::CommentStore;

#[tokio::test]
async fn test_soft_delete_hides_reply_but_keeps_structure() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let c1 = app.reply(&app.bob, r1.id, "child").await;
    let c2 = app.reply(&app.alice, c1.id, "grandchild").await;
    let edges_before = app.store.count_edges().await.expect("count");

    app.engine
        .soft_delete_comment(&app.bob, c1.id)
        .await
        .expect("author deletes");

    assert!(app.engine.get_replies(r1.id).await.expect("replies").is_empty());
    assert_eq!(app.engine.get_replies_count(r1.id).await.expect("count"), 0);

    let descendants = app.engine.get_descendants(r1.id).await.expect("descendants");
    assert_eq!(ids(&descendants), vec![c1.id, c2.id]);
    assert!(descendants[0].is_tombstone());
    assert_eq!(descendants[1].content.as_deref(), Some("grandchild"));

    let ancestors = app.engine.get_ancestors(c2.id).await.expect("ancestors");
    assert_eq!(ids(&ancestors), vec![c1.id, r1.id]);
    assert!(ancestors[0].is_tombstone());

    assert_eq!(app.store.count_edges().await.expect("count"), edges_before);
}

#[tokio::test]
async fn test_include_deleted_exposes_content_and_list_entries() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let c1 = app.reply(&app.bob, r1.id, "hidden words").await;
    app.engine
        .soft_delete_comment(&app.bob, c1.id)
        .await
        .expect("delete");

    let options = QueryOptions::including_deleted();
    let replies = app
        .engine
        .queries()
        .replies_of(r1.id, options)
        .await
        .expect("replies");
    assert_eq!(ids(&replies), vec![c1.id]);
    assert!(replies[0].is_deleted);
    assert_eq!(replies[0].content.as_deref(), Some("hidden words"));

    assert_eq!(
        app.engine
            .queries()
            .replies_count(r1.id, options)
            .await
            .expect("count"),
        1
    );
}

#[tokio::test]
async fn test_restore_brings_reply_back() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let c1 = app.reply(&app.bob, r1.id, "child").await;

    app.engine
        .soft_delete_comment(&app.bob, c1.id)
        .await
        .expect("delete");
    app.engine
        .restore_comment(&app.bob, c1.id)
        .await
        .expect("restore");

    let replies = app.engine.get_replies(r1.id).await.expect("replies");
    assert_eq!(ids(&replies), vec![c1.id]);
    assert_eq!(replies[0].content.as_deref(), Some("child"));
    assert!(!replies[0].is_deleted);
}

#[tokio::test]
async fn test_only_author_may_delete_or_restore() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;

    let err = app
        .engine
        .soft_delete_comment(&app.bob, r1.id)
        .await
        .expect_err("not the author");
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert!(!app.engine.get_comment(r1.id).await.expect("get").is_deleted);

    app.engine
        .soft_delete_comment(&app.alice, r1.id)
        .await
        .expect("author deletes");
    let err = app
        .engine
        .restore_comment(&app.bob, r1.id)
        .await
        .expect_err("not the author");
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_unknown_comment_is_not_found() {
    let app = TestApp::new();
    let missing = CommentId::new();
    let ctx = RequestContext::new(UserId::new());

    let errors = [
        app.engine.get_ancestors(missing).await.expect_err("ancestors"),
        app.engine.get_descendants(missing).await.expect_err("descendants"),
        app.engine.get_replies(missing).await.expect_err("replies"),
        app.engine.get_thread(missing).await.expect_err("thread"),
        app.engine.get_comment(missing).await.expect_err("get"),
        app.engine
            .soft_delete_comment(&ctx, missing)
            .await
            .expect_err("delete"),
        app.engine
            .restore_comment(&ctx, missing)
            .await
            .expect_err("restore"),
    ];
    for err in errors {
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}

#[tokio::test]
async fn test_thread_nests_replies_in_creation_order() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let a = app.reply(&app.bob, r1.id, "a").await;
    let b = app.reply(&app.alice, r1.id, "b").await;
    let a1 = app.reply(&app.alice, a.id, "a1").await;
    let a2 = app.reply(&app.bob, a.id, "a2").await;
    let a1x = app.reply(&app.bob, a1.id, "a1x").await;

    let thread = app.engine.get_thread(a1x.id).await.expect("thread");

    assert_eq!(thread.comment.id, r1.id);
    assert_eq!(thread.size(), 6);
    assert_eq!(thread.ids(), vec![r1.id, a.id, a1.id, a1x.id, a2.id, b.id]);

    let node_a = thread.find(a.id).expect("a is in the thread");
    assert_eq!(node_a.comment.replies_count, 2);
    assert_eq!(
        node_a.replies.iter().map(|n| n.comment.id).collect::<Vec<_>>(),
        vec![a1.id, a2.id]
    );
}

#[tokio::test]
async fn test_thread_keeps_deleted_comment_as_tombstone() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let c1 = app.reply(&app.bob, r1.id, "child").await;
    let c2 = app.reply(&app.alice, c1.id, "grandchild").await;
    app.engine
        .soft_delete_comment(&app.bob, c1.id)
        .await
        .expect("delete");

    let thread = app.engine.get_thread(r1.id).await.expect("thread");
    let node = thread.find(c1.id).expect("deleted comment stays in thread");
    assert!(node.comment.is_tombstone());
    assert_eq!(node.replies.len(), 1);
    assert_eq!(node.replies[0].comment.id, c2.id);
    assert_eq!(thread.comment.replies_count, 0);

    let json = serde_json::to_value(&thread).expect("serialize");
    assert!(json["replies"][0]["comment"]["content"].is_null());
    assert_eq!(json["replies"][0]["comment"]["is_deleted"], true);
    assert_eq!(
        json["replies"][0]["replies"][0]["comment"]["content"],
        "grandchild"
    );
}

#[tokio::test]
async fn test_top_level_comments_newest_first_without_deleted() {
    let app = TestApp::new();
    let first = app.root(&app.alice, "first").await;
    let second = app.root(&app.bob, "second").await;
    let third = app.root(&app.alice, "third").await;
    app.reply(&app.bob, second.id, "reply").await;
    app.engine
        .soft_delete_comment(&app.alice, third.id)
        .await
        .expect("delete");

    let roots = app
        .engine
        .top_level_comments(app.post_id)
        .await
        .expect("top level");
    assert_eq!(ids(&roots), vec![second.id, first.id]);
    assert_eq!(roots[0].replies_count, 1);
}

#[tokio::test]
async fn test_reply_to_deleted_comment_is_allowed() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    app.engine
        .soft_delete_comment(&app.alice, r1.id)
        .await
        .expect("delete");

    let reply = app.reply(&app.bob, r1.id, "still replying").await;
    let ancestors = app.engine.get_ancestors(reply.id).await.expect("ancestors");
    assert_eq!(ids(&ancestors), vec![r1.id]);
    assert!(ancestors[0].is_tombstone());
}

#[tokio::test]
async fn test_edit_updates_content_only() {
    let app = TestApp::new();
    let r1 = app.root(&app.alice, "root").await;
    let c1 = app.reply(&app.bob, r1.id, "draft").await;
    let edges = app.edges(c1.id).await;

    let edited = app
        .engine
        .edit_comment(&app.bob, c1.id, "<strong>final</strong>")
        .await
        .expect("edit");
    assert_eq!(edited.content, "<strong>final</strong>");
    assert_eq!(edited.parent_id, Some(r1.id));
    assert_eq!(app.edges(c1.id).await, edges);

    let err = app
        .engine
        .edit_comment(&app.alice, c1.id, "hijack")
        .await
        .expect_err("not the author");
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_content_rules_are_enforced() {
    let mut config = AppConfig::in_memory();
    config.comments.max_content_length = 20;
    let app = TestApp::with_config(config);

    for content in [
        "   ",
        "<script>x</script>",
        "<a onclick=\"x\">y</a>",
        "<i>unclosed",
        "this comment is far too long",
    ] {
        let err = app
            .engine
            .create_comment(&app.alice, app.post_id, None, content)
            .await
            .expect_err(content);
        assert_eq!(err.kind, ErrorKind::Validation, "{content}");
    }
    assert!(app.store.is_empty().await);

    let ok = app.root(&app.alice, r#"<a href="/x">ok</a>"#).await;
    assert_eq!(ok.content.as_deref(), Some(r#"<a href="/x">ok</a>"#));
}

#[tokio::test]
async fn test_thread_at_depth_limit_resolves_and_deeper_reply_is_rejected() {
    let mut config = AppConfig::in_memory();
    config.comments.max_thread_depth = 3;
    let app = TestApp::with_config(config);

    let root = app.root(&app.alice, "root").await;
    let mut leaf = root.id;
    for level in 1..=3 {
        leaf = app.reply(&app.bob, leaf, &format!("level {level}")).await.id;
    }

    let thread = app.engine.get_thread(leaf).await.expect("thread at the limit");
    assert_eq!(thread.comment.id, root.id);
    assert_eq!(thread.ids().len(), 4);
    assert_eq!(app.engine.get_ancestors(leaf).await.expect("ancestors").len(), 3);

    let edges_before = app.store.count_edges().await.expect("count");
    let err = app
        .engine
        .create_comment(&app.alice, app.post_id, Some(leaf), "level 4")
        .await
        .expect_err("past the limit");
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(app.store.len().await, 4);
    assert_eq!(app.store.count_edges().await.expect("count"), edges_before);
}
