//! Infrastructure layer implementations.

pub mod flow;
pub mod wallet;

pub use flow::{AccessClientConfig, FlowAccessClient, FlowNetworkConfig};
pub use wallet::{DevWallet, DevWalletConfig};
