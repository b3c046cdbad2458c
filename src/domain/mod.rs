//! Domain layer containing core types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AppError, ChainError, ConfigError, ValidationError, WalletError};
pub use traits::{ChainGateway, WalletConnector};
pub use types::{
    Address, DomainInfo, ErrorDetail, ErrorResponse, FNS_SUFFIX, HealthResponse, HealthStatus,
    MutationKind, QuoteParams, QuoteState, RenewRequest, RenewalQuote, SECONDS_PER_YEAR, Session,
    SessionSnapshot, TransactionRequest, TransactionStatus, UpdateAddressRequest,
    UpdateBioRequest, bare_name, renewal_duration_secs,
};
