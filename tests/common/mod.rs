//! Common test infrastructure
//!
//! End-to-end tests talk to a local fake catalog provider over real HTTP.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{deezer_track_json, FakeProvider};
//!
//! #[tokio::test]
//! async fn test_search() {
//!     let provider = FakeProvider::spawn().await;
//!     provider.respond_json("/search", 200, serde_json::json!({"data": []}));
//!     // point a client at provider.base_url ...
//! }
//! ```

mod fake_provider;
mod fixtures;

#[allow(unused_imports)]
pub use fake_provider::{unreachable_base_url, FakeProvider, FakeResponse, RecordedRequest};
#[allow(unused_imports)]
pub use fixtures::*;
