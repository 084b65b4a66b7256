//! Failure handling: fetch errors, empty rosters, silent nodes

mod common;

use std::time::Duration;

use ::common::client::PublicHashSession;
use ::common::fetch::FetchError;
use ::common::orchestrator::OrchestratorConfig;
use ::common::protocol::ProtocolError;
use ::common::request::HashPublicRequest;
use ::common::roster::{Roster, TreeError};
use ::common::testkit::{Behaviour, StaticFetcher, TestNetwork};

fn failing_web() -> StaticFetcher {
    StaticFetcher::new().with_error(common::URL, FetchError::NonOkStatus(503))
}

#[tokio::test]
async fn test_every_leaf_failing_is_insufficient() {
    let net = TestNetwork::new(4, failing_web());
    let session = PublicHashSession::new(net.roster().clone(), common::URL).unwrap();

    let started = tokio::time::Instant::now();
    let result = net.orchestrator(0).hash_public(session.request().clone()).await;

    assert!(matches!(
        result,
        Err(ProtocolError::Insufficient {
            received: 0,
            required: 1
        })
    ));
    // closed edges complete the run without waiting for the timeout
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_every_leaf_failing_with_no_quorum_returns_empty() {
    let net = TestNetwork::builder(4, failing_web())
        .config(OrchestratorConfig {
            min_contributions: 0,
            ..OrchestratorConfig::default()
        })
        .build();
    let session = PublicHashSession::new(net.roster().clone(), common::URL).unwrap();

    let response = net
        .orchestrator(0)
        .hash_public(session.request().clone())
        .await
        .unwrap();
    assert!(response.responses.is_empty());
    assert_eq!(response.missing.len(), 3);
}

#[tokio::test]
async fn test_unsupported_content_type_is_excluded() {
    let net = TestNetwork::builder(3, common::honest_web())
        .fetcher_for(
            2,
            StaticFetcher::new().with_error(
                common::URL,
                FetchError::UnsupportedContentType("application/json".into()),
            ),
        )
        .build();
    let session = PublicHashSession::new(net.roster().clone(), common::URL).unwrap();

    let response = net
        .orchestrator(0)
        .hash_public(session.request().clone())
        .await
        .unwrap();
    assert_eq!(response.responses.len(), 1);
    assert_eq!(response.missing, vec![net.public_key(2)]);
}

#[tokio::test]
async fn test_empty_roster_is_rejected_before_start() {
    let net = TestNetwork::new(1, common::honest_web());
    let request = HashPublicRequest::new(Roster::default(), common::URL);

    let result = net.orchestrator(0).hash_public(request).await;
    assert!(matches!(
        result,
        Err(ProtocolError::TreeConstruction(TreeError::EmptyRoster))
    ));
}

#[tokio::test]
async fn test_leader_outside_roster_is_rejected() {
    let net = TestNetwork::new(3, common::honest_web());
    let others = TestNetwork::new(2, common::honest_web());
    let request = HashPublicRequest::new(others.roster().clone(), common::URL);

    let result = net.orchestrator(0).hash_public(request).await;
    assert!(matches!(
        result,
        Err(ProtocolError::TreeConstruction(TreeError::RootNotInRoster(_)))
    ));
}

#[tokio::test]
async fn test_single_member_roster_completes_immediately() {
    let net = TestNetwork::new(1, common::honest_web());
    let session = PublicHashSession::new(net.roster().clone(), common::URL).unwrap();

    let response = net
        .orchestrator(0)
        .hash_public(session.request().clone())
        .await
        .unwrap();
    assert!(response.responses.is_empty());
    assert!(response.missing.is_empty());
}

#[tokio::test]
async fn test_silent_child_times_out() {
    let net = TestNetwork::builder(3, common::honest_web())
        .behaviour(1, Behaviour::Silent)
        .config(OrchestratorConfig {
            timeout: Duration::from_millis(200),
            ..OrchestratorConfig::default()
        })
        .build();
    let session = PublicHashSession::new(net.roster().clone(), common::URL).unwrap();

    let result = net.orchestrator(0).hash_public(session.request().clone()).await;
    assert!(matches!(result, Err(ProtocolError::Timeout(_))));
}

#[tokio::test]
async fn test_slow_fetch_is_cut_off_by_the_timeout() {
    let net = TestNetwork::builder(2, common::honest_web().with_delay(Duration::from_secs(30)))
        .config(OrchestratorConfig {
            timeout: Duration::from_millis(200),
            ..OrchestratorConfig::default()
        })
        .build();
    let session = PublicHashSession::new(net.roster().clone(), common::URL).unwrap();

    let started = tokio::time::Instant::now();
    let result = net.orchestrator(1).hash_public(session.request().clone()).await;
    assert!(matches!(result, Err(ProtocolError::Timeout(_))));
    assert!(started.elapsed() < Duration::from_secs(5));
}
