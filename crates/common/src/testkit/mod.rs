/// In-process harness for multi-node protocol tests
///
/// Runs every roster member inside the test's own runtime: a
/// [`LocalOverlay`] stands in for the network and spawns one leaf instance
/// per delivered announcement, and a [`StaticFetcher`] stands in for the
/// web.
///
/// # Example
///
/// ```rust,ignore
/// use common::testkit::{StaticFetcher, TestNetwork};
///
/// #[tokio::test]
/// async fn test_every_node_agrees() -> anyhow::Result<()> {
///     let fetcher = StaticFetcher::new().with_html("https://example.com/", "<html/>");
///     let net = TestNetwork::new(4, fetcher);
///
///     let session = PublicHashSession::new(net.roster().clone(), "https://example.com/")?;
///     let response = net.orchestrator(0).hash_public(session.request().clone()).await?;
///     assert_eq!(session.verify(&response)?.len(), 3);
///     Ok(())
/// }
/// ```
mod fetcher;
mod network;
mod overlay;

pub use fetcher::StaticFetcher;
pub use network::{TestNetwork, TestNetworkBuilder};
pub use overlay::{Behaviour, LocalOverlay};
