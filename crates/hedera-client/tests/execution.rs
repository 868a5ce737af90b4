//! Execution engine behaviour against a scripted network
//!
//! Time is paused in every async test, so backoff sleeps advance the clock
//! instantly and elapsed time can be asserted exactly.

use assert_matches::assert_matches;
use hedera_client::signing::verify_signatures;
use hedera_client::{CancellationToken, Client, TransferTransaction};
use hedera_core::{AccountId, Hbar, HederaError, Key, KeyList, Status};
use hedera_testkit::{init_tracing, test_key, MockNetwork, MockReply, OPERATOR_ACCOUNT};
use std::time::Duration;
use tokio::time::Instant;

fn transfer() -> TransferTransaction {
    let mut tx = TransferTransaction::new();
    tx.hbar_transfer(OPERATOR_ACCOUNT, Hbar::new(-1))
        .hbar_transfer(AccountId::new(0, 0, 1001), Hbar::new(1));
    tx
}

fn setup(nodes: u64) -> (MockNetwork, Client) {
    init_tracing();
    let network = MockNetwork::new(nodes);
    let client = network.client_builder().unwrap().build().unwrap();
    (network, client)
}

fn totals(client: &Client) -> (u64, u64) {
    client.registry().nodes().iter().fold((0, 0), |(f, s), node| {
        let health = node.health();
        (f + health.total_failures, s + health.total_successes)
    })
}

#[tokio::test(start_paused = true)]
async fn test_retryable_failures_then_success() {
    for k in 0..4u64 {
        let (network, client) = setup(3);
        network.push_replies((0..k).map(|_| MockReply::Precheck(Status::Busy)));

        let response = transfer().execute(&client).await.unwrap();

        let requests = network.requests();
        assert_eq!(requests.len() as u64, k + 1);
        assert_eq!(requests.last().unwrap().node, response.node_id);
        assert_eq!(totals(&client), (k, 1));

        // Rotation: a failed node is never asked again on the very next attempt
        for pair in requests.windows(2) {
            assert_ne!(pair[0].node, pair[1].node);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_every_attempt_is_addressed_and_signed_for_its_node() {
    let (network, client) = setup(3);
    network.push_replies([
        MockReply::Precheck(Status::PlatformNotActive),
        MockReply::Transport("connection reset".into()),
    ]);

    let response = transfer().execute(&client).await.unwrap();

    let requests = network.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        let body = request.transaction_body().unwrap();
        assert_eq!(body.node_account_id, request.node);
        assert_eq!(body.transaction_id, response.transaction_id);
        verify_signatures(request.signed_transaction().unwrap()).unwrap();
    }
    assert_eq!(
        requests[2].signed_transaction().unwrap().hash().unwrap(),
        response.transaction_hash
    );
}

#[tokio::test(start_paused = true)]
async fn test_fatal_precheck_is_not_retried() {
    for status in [
        Status::InsufficientTxFee,
        Status::InvalidSignature,
        Status::TransactionExpired,
        Status::Unrecognized(9_999),
    ] {
        let (network, client) = setup(3);
        network.push_reply(MockReply::Precheck(status));

        let start = Instant::now();
        let err = transfer().execute(&client).await.unwrap_err();

        assert_matches!(
            err,
            HederaError::PrecheckRejected { status: s, transaction_id: Some(_), .. } if s == status
        );
        assert_eq!(network.request_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(totals(&client), (0, 1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_attempts_exhausted() {
    let (network, client) = setup(2);
    network.push_replies((0..5).map(|_| MockReply::Precheck(Status::Busy)));

    let err = transfer().max_attempts(3).execute(&client).await.unwrap_err();

    match err {
        HederaError::DeadlineExceeded { attempts, last } => {
            assert_eq!(attempts, 3);
            assert_eq!(last.and_then(|e| e.status()), Some(Status::Busy));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(network.request_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_time_budget_exhausted() {
    let (network, client) = setup(1);
    network.push_replies((0..100).map(|_| MockReply::Transport("unreachable".into())));

    let start = Instant::now();
    let err = transfer()
        .max_attempts(100)
        .request_timeout(Duration::from_millis(500))
        .execute(&client)
        .await
        .unwrap_err();

    assert_matches!(err, HederaError::DeadlineExceeded { attempts, last: Some(ref last) }
        if attempts < 100 && matches!(**last, HederaError::Transport { .. }));
    assert!(start.elapsed() <= Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_single_node_retries_same_node() {
    let (network, client) = setup(1);
    network.push_replies([
        MockReply::Precheck(Status::Busy),
        MockReply::Precheck(Status::Busy),
    ]);

    let start = Instant::now();
    transfer().execute(&client).await.unwrap();

    let requests = network.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.node == AccountId::new(0, 0, 3)));
    // Two backoffs of at least 2 * 10ms and 4 * 10ms were waited out
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[tokio::test(start_paused = true)]
async fn test_pinned_nodes_never_fall_back() {
    let (network, client) = setup(3);
    let pinned = AccountId::new(0, 0, 4);
    network.push_replies([
        MockReply::Precheck(Status::Busy),
        MockReply::Transport("reset".into()),
    ]);

    let response = transfer()
        .node_account_ids([pinned])
        .execute(&client)
        .await
        .unwrap();

    assert_eq!(response.node_id, pinned);
    assert!(network.requests().iter().all(|r| r.node == pinned));

    let err = transfer()
        .node_account_ids([AccountId::new(0, 0, 99)])
        .execute(&client)
        .await
        .unwrap_err();
    assert_matches!(err, HederaError::UnknownNode { .. });
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_node_is_avoided() {
    let (network, client) = setup(2);
    let down = AccountId::new(0, 0, 3);
    network.set_unreachable(down, true);

    for _ in 0..5 {
        let response = transfer().execute(&client).await.unwrap();
        assert_eq!(response.node_id, AccountId::new(0, 0, 4));
    }

    let health = client.registry().get(&down).unwrap().health();
    assert_eq!(health.total_successes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_incomplete_signature_fails_before_submission() {
    let (network, client) = setup(3);
    let a = test_key(1).unwrap();
    let b = test_key(2).unwrap();
    let c = test_key(3).unwrap();
    let threshold = KeyList::threshold(2, [a.public_key(), b.public_key(), c.public_key()]);

    let mut tx = transfer();
    tx.require_key(threshold.clone()).sign(a.clone());
    let err = tx.execute(&client).await.unwrap_err();
    assert_matches!(err, HederaError::IncompleteSignature { transaction_id: Some(_), .. });
    assert_eq!(network.request_count(), 0);

    let mut tx = transfer();
    tx.require_key(Key::List(threshold)).sign(a).sign(c);
    tx.execute(&client).await.unwrap();
    let requests = network.requests();
    assert_eq!(requests.len(), 1);
    // operator plus the two threshold signers
    assert_eq!(requests[0].signed_transaction().unwrap().sig_map.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_identity_is_reused_verbatim() {
    let (network, client) = setup(3);
    let mut tx = transfer();
    tx.freeze_with(&client).unwrap();
    let id = tx.get_transaction_id().unwrap();

    network.push_reply(MockReply::Precheck(Status::Busy));
    let response = tx.execute(&client).await.unwrap();

    assert_eq!(response.transaction_id, id);
    for request in network.requests() {
        assert_eq!(request.transaction_body().unwrap().transaction_id, id);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_spawned_execution() {
    let (network, client) = setup(1);
    network.push_reply(MockReply::Delayed(
        Duration::from_secs(3_600),
        Box::new(MockReply::Precheck(Status::Ok)),
    ));

    let handle = transfer().execute_spawned(&client);
    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.cancel();

    assert_matches!(handle.await, Err(HederaError::Cancelled));
    assert_eq!(network.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_stops_retrying() {
    let (network, client) = setup(1);
    network.push_replies((0..10).map(|_| MockReply::Precheck(Status::Busy)));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        canceller.cancel();
    });

    let err = transfer()
        .execute_with_cancel(&client, &token)
        .await
        .unwrap_err();

    assert_matches!(err, HederaError::Cancelled);
    let sent = network.request_count();
    assert!(sent >= 1 && sent < 10);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(network.request_count(), sent);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_execution_completes() {
    let (network, client) = setup(2);
    network.push_reply(MockReply::Precheck(Status::Busy));

    let handle = transfer().execute_spawned(&client);
    let response = handle.await.unwrap();
    assert_eq!(network.request_count(), 2);
    assert_eq!(response.transaction_hash.len(), 48);
}

#[tokio::test(start_paused = true)]
async fn test_failed_channel_is_replaced() {
    let (network, client) = setup(1);
    network.push_reply(MockReply::Transport("stream reset".into()));

    transfer().execute(&client).await.unwrap();
    assert_eq!(network.request_count(), 2);
    assert_eq!(network.connect_count(), 2);
    assert_eq!(client.channels().len(), 1);
}

#[test]
fn test_blocking_execution() {
    let (network, client) = setup(2);
    let response = transfer().execute_blocking(&client).unwrap();
    assert_eq!(network.request_count(), 1);
    assert!(network.node_ids().contains(&response.node_id));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_executions_share_channels() {
    let (network, client) = setup(3);

    let handles: Vec<_> = (0..20).map(|_| transfer().execute_spawned(&client)).collect();
    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().transaction_id);
    }

    assert_eq!(ids.len(), 20);
    assert_eq!(network.request_count(), 20);
    assert!(network.connect_count() <= 3);
}
