//! Flow network access: configuration, JSON-Cadence codec, Cadence sources
//! and the access node client.

pub mod access;
pub mod cadence;
pub mod config;
pub mod scripts;

pub use access::{
    AccessApiProvider, AccessClientConfig, DEFAULT_GAS_LIMIT, FlowAccessClient,
    HttpAccessApiProvider, TransactionResult,
};
pub use cadence::{CadenceValue, domain_info_from_cadence};
pub use config::FlowNetworkConfig;
