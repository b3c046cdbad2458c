//! Application layer: session state, navigation and domain management.

pub mod manage;
pub mod navigation;
pub mod session;
pub mod state;

pub use manage::{DomainManager, MANAGE_PAGE_TITLE, ManagePage, NOT_SET, ViewPhase};
pub use navigation::{NavAction, NavBar, NavLink, SessionControl};
pub use session::SessionProvider;
pub use state::AppState;
