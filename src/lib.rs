//! Flow Name Service client.
//!
//! Layers follow the usual split: `domain` holds types, traits and errors,
//! `infra` talks to the Flow access node and the wallet, `app` holds the
//! session provider and the domain management workflow, and `api` exposes
//! both over HTTP.

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
