//! End-to-end request/reply scenarios over raw message bytes.
//!
//! Requests are encoded exactly as a caller would publish them, handled by
//! the dispatcher, and replies are decoded from their wire form.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use post_bridge_core::{
    CORRELATION_ID_HEADER, CorrelationContext, Dispatcher, OutboundEnvelope, OutcomeBody,
    PostRequest, REPLY_TOPIC_HEADER, Status,
};
use post_bridge_testing::fixtures::{PARTITION, envelope};
use post_bridge_testing::{InMemoryPostStore, RecordingReplyPublisher, init_tracing};
use proptest::prelude::*;
use std::sync::Arc;

fn headers<'a>(reply_to: &'a [u8], correlation_id: &'a [u8]) -> CorrelationContext {
    CorrelationContext::from_headers([
        (REPLY_TOPIC_HEADER, Some(reply_to)),
        (CORRELATION_ID_HEADER, Some(correlation_id)),
    ])
}

#[tokio::test]
async fn create_then_read_round_trip() {
    init_tracing();
    let store = InMemoryPostStore::new();
    let dispatcher = Dispatcher::new(Arc::new(store.clone()), PARTITION);
    let publisher = RecordingReplyPublisher::new();

    // Create with full addressing: stored, nothing sent.
    let sent = dispatcher
        .serve(
            br#"{"method":"POST","payload":{"id":42,"text":"hi"}}"#,
            &headers(b"R", b"C"),
            &publisher,
        )
        .await
        .unwrap();
    assert!(!sent);
    assert!(publisher.published().is_empty());
    assert_eq!(store.get(PARTITION, 42).unwrap().content, "hi");

    // Read it back: reply goes to R with correlation C.
    let sent = dispatcher
        .serve(
            br#"{"method":"GET","payload":{"id":42}}"#,
            &headers(b"R", b"C"),
            &publisher,
        )
        .await
        .unwrap();
    assert!(sent);

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    let reply = &published[0];
    assert_eq!(reply.destination, "R");
    assert_eq!(reply.correlation_id, b"C".to_vec());

    let wire = reply.envelope.to_vec().unwrap();
    let decoded = OutboundEnvelope::from_slice(&wire).unwrap();
    assert_eq!(decoded.status(), Status::Approve);
    let OutcomeBody::Post(post) = decoded.body() else {
        unreachable!("single read yields a post body");
    };
    assert_eq!(post.id, 42);
    assert_eq!(post.content, "hi");
}

#[tokio::test]
async fn binary_correlation_tokens_survive_unchanged() {
    let store = InMemoryPostStore::new();
    let dispatcher = Dispatcher::new(Arc::new(store), PARTITION);

    let token = [0x00_u8, 0xff, 0x10, 0x80];
    let reply = dispatcher
        .handle(envelope("GET", None), &headers(b"replies", &token))
        .await
        .unwrap();

    assert_eq!(reply.correlation_id, token.to_vec());
    assert_eq!(reply.destination, "replies");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_create_and_delete_leave_a_serial_state() {
    for round in 0..200_i64 {
        let store = InMemoryPostStore::new();
        let dispatcher = Dispatcher::new(Arc::new(store.clone()), PARTITION);
        let content = format!("round-{round}");

        let creator = {
            let dispatcher = dispatcher.clone();
            let request = PostRequest::new(round, content.clone()).issue_id(round);
            tokio::spawn(async move {
                dispatcher
                    .handle(envelope("POST", Some(request)), &CorrelationContext::none())
                    .await
            })
        };
        let deleter = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .handle(
                        envelope("DELETE", Some(PostRequest::with_id(round))),
                        &CorrelationContext::none(),
                    )
                    .await
            })
        };

        creator.await.unwrap();
        deleter.await.unwrap();

        // Either delete ran first (post present, intact) or create ran first
        // (post removed). Nothing in between.
        match store.get(PARTITION, round) {
            Some(post) => {
                assert_eq!(post.content, content);
                assert_eq!(post.issue_id, Some(round));
            },
            None => assert!(store.is_empty()),
        }
    }
}

proptest! {
    #[test]
    fn update_then_read_returns_what_was_written(
        id in any::<i64>(),
        issue_id in proptest::option::of(any::<i64>()),
        content in "\\PC{0,64}",
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let store = InMemoryPostStore::new();
        let dispatcher = Dispatcher::new(Arc::new(store), PARTITION);

        let request = PostRequest { id: Some(id), issue_id, content: content.clone() };
        let reply = runtime.block_on(async {
            dispatcher
                .handle(envelope("PUT", Some(request)), &headers(b"R", b"C"))
                .await;
            dispatcher
                .handle(envelope("GET", Some(PostRequest::with_id(id))), &headers(b"R", b"C"))
                .await
        });

        let reply = reply.unwrap();
        prop_assert_eq!(reply.envelope.status(), Status::Approve);
        let OutcomeBody::Post(post) = reply.envelope.body() else {
            unreachable!("single read yields a post body");
        };
        prop_assert_eq!(post.id, id);
        prop_assert_eq!(post.issue_id, issue_id);
        prop_assert_eq!(&post.content, &content);
    }
}
