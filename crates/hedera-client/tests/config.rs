//! Loading a client from configuration

use hedera_client::{ClientConfig, NodeSelection, SelectionOrder};
use hedera_core::{AccountId, Hbar};
use hedera_testkit::{init_tracing, MockNetwork};
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const CONFIG: &str = r#"
max_attempts = 4
request_timeout_ms = 30000
min_backoff_ms = 5
max_backoff_ms = 50
max_query_payment_tinybars = 500
selection = "round_robin"

[network]
"0.0.3" = ["mock://0.0.3"]
"0.0.4" = ["mock://0.0.4"]

[operator]
account_id = "0.0.2"
private_key = "2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a"
"#;

#[tokio::test(start_paused = true)]
async fn test_client_from_file() {
    init_tracing();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = ClientConfig::from_file(file.path()).unwrap();
    assert_eq!(config.selection, SelectionOrder::RoundRobin);

    let network = MockNetwork::new(2);
    let client = config
        .into_builder()
        .unwrap()
        .channel_factory(Arc::new(network.clone()))
        .build()
        .unwrap();

    assert_eq!(client.max_attempts(), 4);
    assert_eq!(client.request_timeout(), Duration::from_secs(30));
    assert_eq!(client.max_query_payment(), Hbar::from_tinybars(500));
    assert_eq!(client.registry().backoff().min_backoff, Duration::from_millis(5));
    assert_eq!(
        client.operator().unwrap().public_key(),
        network.operator_key().unwrap().public_key()
    );

    // Round-robin visits both nodes
    let seen: HashSet<_> = (0..4)
        .map(|_| {
            client
                .registry()
                .select(&NodeSelection::Any, &HashSet::new())
                .unwrap()
                .node
                .account_id()
        })
        .collect();
    assert_eq!(seen.len(), 2);

    let balance = hedera_client::AccountBalanceQuery::new()
        .account_id(AccountId::new(0, 0, 1001))
        .execute(&client)
        .await
        .unwrap();
    assert_eq!(balance.hbars, Hbar::new(100));
}

#[test]
fn test_missing_file_is_config_error() {
    let err = ClientConfig::from_file("/nonexistent/hedera-client.toml").unwrap_err();
    assert!(matches!(err, hedera_core::HederaError::Config { .. }));
}

#[test]
fn test_builder_requires_transport() {
    let err = ClientConfig::default().into_builder().unwrap().build().unwrap_err();
    assert!(matches!(err, hedera_core::HederaError::Config { .. }));
}
