//! Integration tests for the approving device: inspection and approval.

mod common;

use std::sync::Mutex;

use common::{remote_error, success_reply, token_info, transport_error, Harness, RecordingSink};
use handoff_core::error::{HandoffError, InspectError};
use handoff_core::handoff::{approve, inspect};
use handoff_core::rpc::{Call, Response, UpdateBatch};

fn batch() -> UpdateBatch {
    UpdateBatch {
        seq: 17,
        updates: vec![b"updateNewAuthorization".to_vec(), b"updateUser".to_vec()],
    }
}

#[tokio::test]
async fn test_inspect_returns_token_info() {
    let harness = Harness::new(2);
    harness
        .home
        .push_reply(Ok(Response::LoginTokenInfo(token_info())));

    let info = inspect(&harness.session, b"scanned").await.unwrap();

    assert_eq!(info, token_info());
    assert_eq!(
        harness.home.calls(),
        vec![Call::CheckLoginToken {
            token: b"scanned".to_vec()
        }]
    );
}

#[tokio::test]
async fn test_inspect_expired() {
    let harness = Harness::new(2);
    harness.home.push_reply(remote_error("AUTH_TOKEN_EXPIRED"));

    let result = inspect(&harness.session, b"t").await;
    assert_eq!(result, Err(InspectError::Expired));
}

#[tokio::test]
async fn test_inspect_invalid() {
    let harness = Harness::new(2);
    harness.home.push_reply(remote_error("AUTH_TOKEN_INVALID"));

    let result = inspect(&harness.session, b"t").await;
    assert_eq!(result, Err(InspectError::Invalid));
}

#[tokio::test]
async fn test_inspect_already_accepted() {
    let harness = Harness::new(2);
    harness
        .home
        .push_reply(remote_error("AUTH_TOKEN_ALREADY_ACCEPTED"));

    let result = inspect(&harness.session, b"t").await;
    assert_eq!(result, Err(InspectError::AlreadyAccepted));
}

#[tokio::test]
async fn test_inspect_other_failures_are_generic() {
    let replies = [
        remote_error("SESSION_PASSWORD_NEEDED"),
        remote_error(""),
        transport_error(),
        success_reply(1),
    ];

    for reply in replies {
        let harness = Harness::new(2);
        harness.home.push_reply(reply);

        let result = inspect(&harness.session, b"t").await;
        assert_eq!(result, Err(InspectError::Generic));
    }
}

#[tokio::test]
async fn test_inspect_is_repeatable() {
    let harness = Harness::new(2);
    for _ in 0..2 {
        harness
            .home
            .push_reply(Ok(Response::LoginTokenInfo(token_info())));
    }

    let first = inspect(&harness.session, b"t").await.unwrap();
    let second = inspect(&harness.session, b"t").await.unwrap();

    assert_eq!(first, second);
    assert!(harness.journal.commits().is_empty());
}

#[tokio::test]
async fn test_approve_forwards_exact_batch() {
    let harness = Harness::new(2);
    harness.home.push_reply(Ok(Response::Updates(batch())));
    let sink = RecordingSink::default();

    approve(&harness.session, b"scanned", &sink).await.unwrap();

    assert_eq!(sink.batches(), vec![batch()]);
    assert_eq!(
        harness.home.calls(),
        vec![Call::AcceptLoginToken {
            token: b"scanned".to_vec()
        }]
    );
    assert!(harness.journal.commits().is_empty());
}

#[tokio::test]
async fn test_approve_failure_forwards_nothing() {
    let replies = [
        transport_error(),
        remote_error("AUTH_TOKEN_EXPIRED"),
        remote_error("AUTH_TOKEN_ALREADY_ACCEPTED"),
        Ok(Response::LoginTokenInfo(token_info())),
    ];

    for reply in replies {
        let harness = Harness::new(2);
        harness.home.push_reply(reply);
        let sink = RecordingSink::default();

        let result = approve(&harness.session, b"t", &sink).await;

        assert_eq!(result, Err(HandoffError::Generic));
        assert!(sink.batches().is_empty());
    }
}

#[tokio::test]
async fn test_approve_accepts_closure_sink() {
    let harness = Harness::new(2);
    harness.home.push_reply(Ok(Response::Updates(batch())));
    let seen = Mutex::new(Vec::new());

    approve(&harness.session, b"t", &|b: UpdateBatch| {
        seen.lock().unwrap().push(b.seq);
    })
    .await
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![17]);
}
