//! Shared test setup.
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//! }
//! ```
//!
//! `RUST_LOG` selects what is printed, e.g. `RUST_LOG=radix_rs=trace`
//! shows every split, merge, prune and height change.

#![allow(dead_code)]

use std::sync::Once;

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a test-writer subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call takes effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Record type for byte trie scenarios: the key is the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: Vec<u8>,
    pub id: u32,
}

impl Record {
    pub fn new(name: &[u8], id: u32) -> Self {
        Self {
            name: name.to_vec(),
            id,
        }
    }
}
