//! Test helpers shared by unit and integration tests.

pub mod mocks;

pub use mocks::{MockChainGateway, MockConfig, MockWallet};

use crate::domain::{Address, DomainInfo};

/// Owner used across tests
pub const TEST_OWNER: &str = "0x01cf0e2f2f715450";

#[must_use]
pub fn test_owner() -> Address {
    TEST_OWNER
        .parse()
        .unwrap_or_else(|_| unreachable!("TEST_OWNER is a valid address"))
}

/// A freshly registered domain with no bio and no linked address
#[must_use]
pub fn sample_domain(owner: &Address, name: &str, name_hash: &str) -> DomainInfo {
    DomainInfo {
        id: 1,
        owner: owner.clone(),
        name: name.to_string(),
        name_hash: name_hash.to_string(),
        created_at: 1_668_464_000,
        expires_at: 1_700_000_000,
        bio: None,
        address: None,
    }
}
