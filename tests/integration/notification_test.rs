//! Integration tests for comment notifications.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{ChannelSink, TestApp};
use threadhub::RequestContext;
use threadhub_core::events::{CommentEvent, EventPayload};
use threadhub_core::types::UserId;
use threadhub_entity::{Notification, NotificationKind};
use threadhub_service::{
    InMemoryPostDirectory, NotificationDispatcher, NotificationRules, TracingNotificationSink,
};
use tokio::sync::mpsc::UnboundedReceiver;

struct NotifyingApp {
    app: TestApp,
    post_author: RequestContext,
    received: UnboundedReceiver<Notification>,
}

async fn setup() -> NotifyingApp {
    let app = TestApp::new();
    let post_author = RequestContext::new(UserId::new());
    let posts = Arc::new(InMemoryPostDirectory::new());
    posts.register(app.post_id, post_author.actor_id).await;

    let (sink, received) = ChannelSink::new();
    app.engine.spawn_notifications(posts, sink);

    NotifyingApp {
        app,
        post_author,
        received,
    }
}

async fn next(received: &mut UnboundedReceiver<Notification>) -> Notification {
    tokio::time::timeout(Duration::from_secs(5), received.recv())
        .await
        .expect("notification within timeout")
        .expect("dispatcher running")
}

#[tokio::test]
async fn test_root_comment_notifies_post_author() {
    let mut ctx = setup().await;
    let comment = ctx.app.root(&ctx.app.alice, "nice post").await;

    let notification = next(&mut ctx.received).await;
    assert_eq!(notification.recipient_id, ctx.post_author.actor_id);
    assert_eq!(notification.kind, NotificationKind::CommentOnPost);
    assert_eq!(notification.actor_id, ctx.app.alice.actor_id);
    assert_eq!(notification.comment_id, comment.id);
    assert_eq!(notification.title, "New comment");
}

#[tokio::test]
async fn test_reply_notifies_parent_author() {
    let mut ctx = setup().await;
    let parent = ctx.app.root(&ctx.app.alice, "question").await;
    next(&mut ctx.received).await;

    let reply = ctx.app.reply(&ctx.app.bob, parent.id, "answer").await;

    let notification = next(&mut ctx.received).await;
    assert_eq!(notification.recipient_id, ctx.app.alice.actor_id);
    assert_eq!(notification.kind, NotificationKind::ReplyToComment);
    assert_eq!(notification.comment_id, reply.id);
}

#[tokio::test]
async fn test_own_comments_do_not_notify() {
    let mut ctx = setup().await;
    let author = ctx.post_author.clone();

    // The post author commenting on their own post, then replying to it.
    let own = ctx.app.root(&author, "author note").await;
    ctx.app.reply(&author, own.id, "follow-up").await;
    let marker = ctx.app.reply(&ctx.app.bob, own.id, "from bob").await;

    let notification = next(&mut ctx.received).await;
    assert_eq!(notification.comment_id, marker.id);
    assert_eq!(notification.recipient_id, author.actor_id);
}

#[tokio::test]
async fn test_deleted_comment_does_not_notify() {
    let app = TestApp::new();
    let posts = Arc::new(InMemoryPostDirectory::new());
    let post_author = UserId::new();
    posts.register(app.post_id, post_author).await;
    let dispatcher = NotificationDispatcher::new(
        NotificationRules::new(Arc::clone(app.engine.store()), posts),
        Arc::new(TracingNotificationSink),
    );

    let mut events = app.engine.subscribe();
    let comment = app.root(&app.alice, "regret").await;
    let created = events.recv().await.expect("created event");
    let EventPayload::Comment(CommentEvent::Created { comment_id, .. }) = &created.payload else {
        panic!("expected a created event, got {:?}", created.payload);
    };
    assert_eq!(*comment_id, comment.id);

    app.engine
        .soft_delete_comment(&app.alice, comment.id)
        .await
        .expect("delete");

    assert!(dispatcher.handle(&created).await.expect("handle").is_none());
}

#[tokio::test]
async fn test_unknown_post_author_is_skipped() {
    let app = TestApp::new();
    let dispatcher = NotificationDispatcher::new(
        NotificationRules::new(
            Arc::clone(app.engine.store()),
            Arc::new(InMemoryPostDirectory::new()),
        ),
        Arc::new(TracingNotificationSink),
    );

    let mut events = app.engine.subscribe();
    app.root(&app.alice, "hello").await;
    let created = events.recv().await.expect("created event");

    assert!(dispatcher.handle(&created).await.expect("handle").is_none());
}

#[tokio::test]
async fn test_lifecycle_events_are_published_in_order() {
    let app = TestApp::new();
    let mut events = app.engine.subscribe();

    let comment = app.root(&app.alice, "v1").await;
    app.engine
        .edit_comment(&app.alice, comment.id, "v2")
        .await
        .expect("edit");
    app.engine
        .soft_delete_comment(&app.alice, comment.id)
        .await
        .expect("delete");
    app.engine
        .restore_comment(&app.alice, comment.id)
        .await
        .expect("restore");

    let mut kinds = Vec::new();
    for _ in 0..4 {
        let event = events.recv().await.expect("event");
        assert_eq!(event.actor_id, Some(app.alice.actor_id));
        let EventPayload::Comment(payload) = event.payload;
        assert_eq!(payload.comment_id(), comment.id);
        kinds.push(match payload {
            CommentEvent::Created { .. } => "created",
            CommentEvent::Edited { .. } => "edited",
            CommentEvent::Deleted { .. } => "deleted",
            CommentEvent::Restored { .. } => "restored",
        });
    }
    assert_eq!(kinds, vec!["created", "edited", "deleted", "restored"]);
}
