//! HTTP-based integration tests for the Flow access client and the dev wallet.
//!
//! Uses `wiremock` to stand in for the access node REST API and the wallet
//! service's authorization endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

use fns_client::domain::{
    Address, AppError, ChainError, ChainGateway, Session, WalletConnector, WalletError,
};
use fns_client::infra::flow::cadence::encode_base64;
use fns_client::infra::{
    AccessClientConfig, DevWallet, DevWalletConfig, FlowAccessClient, FlowNetworkConfig,
};
use fns_client::test_utils::{MockWallet, TEST_OWNER, test_owner};

fn fast_config() -> AccessClientConfig {
    AccessClientConfig {
        timeout: Duration::from_secs(5),
        max_retries: 2,
        retry_delay: Duration::from_millis(10),
        poll_interval: Duration::from_millis(10),
        seal_timeout: Duration::from_secs(2),
    }
}

fn client_for(server: &MockServer) -> FlowAccessClient {
    let network = FlowNetworkConfig::testnet().with_access_node(server.uri());
    FlowAccessClient::new(network, Arc::new(MockWallet::new()), fast_config()).unwrap()
}

/// Access node answer to `POST /v1/scripts`: a JSON string holding base64 JSON-Cadence
fn script_response(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(Value::String(encode_base64(&value)))
}

mod access_client_tests {
    use super::*;

    #[tokio::test]
    async fn test_check_is_initialized_true() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/scripts"))
            .and(query_param("block_height", "sealed"))
            .respond_with(script_response(json!({"type": "Bool", "value": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.check_is_initialized(&test_owner()).await.unwrap());
    }

    #[tokio::test]
    async fn test_script_arguments_are_base64_json_cadence() {
        let server = MockServer::start().await;

        let expected_args = json!({
            "arguments": [
                encode_base64(&json!({"type": "String", "value": "alice"})),
                encode_base64(&json!({"type": "UFix64", "value": "63072000.0"})),
            ]
        });

        Mock::given(method("POST"))
            .and(path("/v1/scripts"))
            .and(body_partial_json(expected_args))
            .respond_with(script_response(
                json!({"type": "UFix64", "value": "2.00000000"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let cost = client.get_rent_cost("alice.fns", 63_072_000).await.unwrap();
        assert!((cost - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_domain_info_decoded() {
        let server = MockServer::start().await;

        let info = json!({
            "type": "Optional",
            "value": {
                "type": "Struct",
                "value": {
                    "id": "A.2566f24c5d792f8f.Domains.DomainInfo",
                    "fields": [
                        { "name": "id", "value": { "type": "UInt64", "value": "3" } },
                        { "name": "owner", "value": { "type": "Address", "value": TEST_OWNER } },
                        { "name": "name", "value": { "type": "String", "value": "alice.fns" } },
                        { "name": "nameHash", "value": { "type": "String", "value": "abc" } },
                        { "name": "expiresAt", "value": { "type": "UFix64", "value": "1700000000.00000000" } },
                        { "name": "address", "value": { "type": "Optional", "value": null } },
                        { "name": "bio", "value": { "type": "String", "value": "gm" } },
                        { "name": "createdAt", "value": { "type": "UFix64", "value": "1668464000.00000000" } }
                    ]
                }
            }
        });

        Mock::given(method("POST"))
            .and(path("/v1/scripts"))
            .respond_with(script_response(info))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let domain = client
            .get_domain_info_by_name_hash(&test_owner(), "abc")
            .await
            .unwrap();

        assert_eq!(domain.id, 3);
        assert_eq!(domain.name, "alice.fns");
        assert_eq!(domain.owner, test_owner());
        assert_eq!(domain.bio.as_deref(), Some("gm"));
        assert_eq!(domain.address, None);
        assert_eq!(domain.expires_at, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_missing_domain_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/scripts"))
            .respond_with(script_response(json!({"type": "Optional", "value": null})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.get_domain_info_by_name_hash(&test_owner(), "nope").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/scripts"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.check_is_initialized(&test_owner()).await;
        assert!(matches!(
            result,
            Err(AppError::Chain(ChainError::Connection(_)))
        ));
    }

    #[tokio::test]
    async fn test_script_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/scripts"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 400,
                "message": "cannot find declaration `Domains`"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.check_is_initialized(&test_owner()).await;
        match result {
            Err(AppError::Chain(ChainError::ScriptFailed(msg))) => {
                assert!(msg.contains("cannot find declaration"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_for_seal_polls_until_sealed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/transaction_results/tx1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Pending",
                "status_code": 0,
                "error_message": ""
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/transaction_results/tx1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Sealed",
                "status_code": 0,
                "error_message": ""
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.wait_for_seal("tx1").await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_seal_reports_execution_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/transaction_results/tx2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Sealed",
                "status_code": 1,
                "error_message": "panic: domain expired"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.wait_for_seal("tx2").await;
        assert!(matches!(
            result,
            Err(AppError::Chain(ChainError::TransactionFailed(_)))
        ));
    }

    #[tokio::test]
    async fn test_health_check_pings_sealed_block() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/blocks"))
            .and(query_param("height", "sealed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.health_check().await.unwrap();
    }
}

mod dev_wallet_tests {
    use super::*;

    fn wallet_for(server: &MockServer, token: Option<&str>) -> DevWallet {
        DevWallet::new(DevWalletConfig {
            account: Some(test_owner()),
            authz_url: Some(format!("{}/authz", server.uri())),
            authz_token: token.map(|t| t.to_string().into()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_bio_update_goes_through_wallet() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/authz"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({
                "limit": 1000,
                "proposer": TEST_OWNER,
                "payer": TEST_OWNER,
                "authorizations": [TEST_OWNER],
                "arguments": [
                    {"type": "String", "value": "abc"},
                    {"type": "String", "value": "gm"}
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"transactionId": "f00d"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let wallet = Arc::new(wallet_for(&server, Some("secret")));
        wallet.authenticate().await.unwrap();

        let network = FlowNetworkConfig::testnet().with_access_node(server.uri());
        let client = FlowAccessClient::new(network, wallet, fast_config()).unwrap();

        let tx_id = client.update_bio_for_domain("abc", "gm").await.unwrap();
        assert_eq!(tx_id, "f00d");
    }

    #[tokio::test]
    async fn test_rejection_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/authz"))
            .respond_with(ResponseTemplate::new(403).set_body_string("declined"))
            .mount(&server)
            .await;

        let wallet = wallet_for(&server, None);
        wallet.authenticate().await.unwrap();

        let tx = fns_client::domain::TransactionRequest {
            cadence: "transaction {}".to_string(),
            arguments: vec![],
            gas_limit: 1000,
        };
        let result = wallet.authorize_and_send(&tx).await;
        assert!(matches!(
            result,
            Err(AppError::Wallet(WalletError::Rejected(_)))
        ));
    }

    #[tokio::test]
    async fn test_login_publishes_configured_account() {
        let server = MockServer::start().await;
        let wallet = wallet_for(&server, None);
        let rx = wallet.subscribe();

        wallet.authenticate().await.unwrap();

        let expected: Address = TEST_OWNER.parse().unwrap();
        assert_eq!(*rx.borrow(), Session::logged_in(expected));
    }
}
