//! Domain types with validation support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::error::ValidationError;

/// Suffix every FNS name carries in its display form
pub const FNS_SUFFIX: &str = ".fns";

/// One year in seconds, the unit renewals are priced in
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Strip the `.fns` suffix from a display name.
///
/// The registry prices and renews the bare label, so `"alice.fns"` becomes
/// `"alice"`. Names without the suffix pass through unchanged.
#[must_use]
pub fn bare_name(name: &str) -> &str {
    name.strip_suffix(FNS_SUFFIX).unwrap_or(name)
}

/// Renewal duration in seconds for a whole number of years
#[must_use]
pub fn renewal_duration_secs(years: u32) -> u64 {
    u64::from(years) * SECONDS_PER_YEAR
}

/// Flow account address, always stored as `0x` + 16 lower-case hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Number of hex digits in a Flow address
    pub const HEX_LEN: usize = 16;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex.is_empty() || hex.len() > Self::HEX_LEN {
            return Err(ValidationError::InvalidAddress(s.to_string()));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidAddress(s.to_string()));
        }

        Ok(Self(format!(
            "0x{:0>width$}",
            hex.to_ascii_lowercase(),
            width = Self::HEX_LEN
        )))
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet session as published by the wallet connector.
///
/// `addr` is present exactly when `logged_in` is true; use [`Session::normalized`]
/// on anything received from outside.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub logged_in: bool,
    #[schema(value_type = Option<String>, example = "0x2566f24c5d792f8f")]
    pub addr: Option<Address>,
}

impl Session {
    #[must_use]
    pub fn logged_out() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn logged_in(addr: Address) -> Self {
        Self {
            logged_in: true,
            addr: Some(addr),
        }
    }

    /// Enforce the `addr.is_some() == logged_in` invariant.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self {
                logged_in: true,
                addr: Some(addr),
            } => Self::logged_in(addr),
            _ => Self::logged_out(),
        }
    }
}

/// Session plus the derived initialization flag
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct SessionSnapshot {
    pub session: Session,
    /// Whether the account has completed the one-time FNS collection setup
    pub is_initialized: bool,
}

/// Snapshot of an on-chain domain record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DomainInfo {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(value_type = String, example = "0x2566f24c5d792f8f")]
    pub owner: Address,
    #[schema(example = "alice.fns")]
    pub name: String,
    pub name_hash: String,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub expires_at: i64,
    pub bio: Option<String>,
    #[schema(value_type = Option<String>)]
    pub address: Option<Address>,
}

/// Write workflows available on a domain
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Bio,
    Address,
    Renew,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bio => "bio",
            Self::Address => "address",
            Self::Renew => "renew",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a transaction as reported by the access node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TransactionStatus {
    #[default]
    Unknown,
    Pending,
    Finalized,
    Executed,
    /// Durably committed; safe to read back
    Sealed,
    Expired,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Pending => "Pending",
            Self::Finalized => "Finalized",
            Self::Executed => "Executed",
            Self::Sealed => "Sealed",
            Self::Expired => "Expired",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(Self::Unknown),
            "Pending" => Ok(Self::Pending),
            "Finalized" => Ok(Self::Finalized),
            "Executed" => Ok(Self::Executed),
            "Sealed" => Ok(Self::Sealed),
            "Expired" => Ok(Self::Expired),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction ready for the wallet to authorize, sign and send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Cadence source with contract aliases already resolved
    pub cadence: String,
    /// JSON-Cadence encoded arguments, in declaration order
    pub arguments: Vec<serde_json::Value>,
    pub gas_limit: u64,
}

/// Price to extend a domain by a number of years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RenewalQuote {
    pub years: u32,
    pub duration_secs: u64,
    /// Cost in FLOW
    #[schema(example = 2.5)]
    pub cost: f64,
}

/// Result of the renewal cost pipeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuoteState {
    /// No quote requested yet, or the inputs do not allow one
    #[default]
    Unknown,
    Ready { quote: RenewalQuote },
    Failed { reason: String },
}

/// Request to update a domain's bio
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateBioRequest {
    #[validate(length(max = 256, message = "Bio must be at most 256 characters"))]
    #[schema(example = "What's on your mind?")]
    pub bio: String,
}

/// Request to link an address to a domain
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAddressRequest {
    #[validate(length(min = 1, message = "Address is required"))]
    #[schema(example = "0x631e88ae7f1d7c20")]
    pub address: String,
}

/// Request to renew a domain
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RenewRequest {
    #[validate(range(min = 1, max = 100, message = "Years must be between 1 and 100"))]
    #[schema(example = 1)]
    pub years: u32,
}

/// Query parameters for a renewal quote
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteParams {
    #[serde(default = "default_years")]
    pub years: u32,
}

fn default_years() -> u32 {
    1
}

impl Default for QuoteParams {
    fn default() -> Self {
        Self {
            years: default_years(),
        }
    }
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Access node reachability
    pub chain: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn new(chain: HealthStatus) -> Self {
        Self {
            status: chain,
            chain,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error type identifier
    #[schema(example = "validation_error")]
    pub r#type: String,
    /// Human-readable error message
    #[schema(example = "Must be renewing for at least one year")]
    pub message: String,
}
