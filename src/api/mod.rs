//! The API layer, containing web handlers and routing.

pub mod handlers;
pub mod router;

pub use handlers::{ApiDoc, NetworkConfigResponse};
pub use router::{DEFAULT_REQUEST_TIMEOUT, create_router, create_router_with_timeout};
