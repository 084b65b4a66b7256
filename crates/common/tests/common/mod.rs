//! Shared fixtures for multi-node protocol tests
#![allow(dead_code)]

use ::common::testkit::StaticFetcher;

pub const URL: &str = "https://dpcc.example/test.html";
pub const PAGE: &[u8] = b"<html><body>vantage</body></html>";
pub const TAMPERED_PAGE: &[u8] = b"<html><body>tampered</body></html>";

/// A web in which `URL` serves `PAGE` as HTML
pub fn honest_web() -> StaticFetcher {
    StaticFetcher::new().with_html(URL, PAGE)
}

/// A web in which `URL` serves different content
pub fn tampered_web() -> StaticFetcher {
    StaticFetcher::new().with_html(URL, TAMPERED_PAGE)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
