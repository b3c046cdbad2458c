//! Navigation bar model.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Session;

/// A navigation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NavLink {
    #[schema(example = "Home")]
    pub label: String,
    #[schema(example = "/")]
    pub href: String,
}

impl NavLink {
    fn new(label: &str, href: &str) -> Self {
        Self {
            label: label.to_string(),
            href: href.to_string(),
        }
    }
}

/// What the session control does when pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NavAction {
    Login,
    Logout,
}

/// Login / logout control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionControl {
    #[schema(example = "Login")]
    pub label: String,
    pub action: NavAction,
}

/// Top navigation: fixed links plus the session control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NavBar {
    pub links: Vec<NavLink>,
    pub control: SessionControl,
}

impl NavBar {
    #[must_use]
    pub fn for_session(session: &Session) -> Self {
        let control = match session.addr {
            Some(_) => SessionControl {
                label: "Log Out".to_string(),
                action: NavAction::Logout,
            },
            None => SessionControl {
                label: "Login".to_string(),
                action: NavAction::Login,
            },
        };

        Self {
            links: vec![
                NavLink::new("Home", "/"),
                NavLink::new("Purchase", "/purchase"),
                NavLink::new("Manage", "/manage"),
            ],
            control,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_owner;

    #[test]
    fn test_logged_out_shows_login() {
        let nav = NavBar::for_session(&Session::logged_out());
        assert_eq!(nav.control.label, "Login");
        assert_eq!(nav.control.action, NavAction::Login);
    }

    #[test]
    fn test_logged_in_shows_logout() {
        let nav = NavBar::for_session(&Session::logged_in(test_owner()));
        assert_eq!(nav.control.label, "Log Out");
        assert_eq!(nav.control.action, NavAction::Logout);
    }

    #[test]
    fn test_links_are_fixed() {
        let nav = NavBar::for_session(&Session::logged_out());
        let hrefs: Vec<&str> = nav.links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, ["/", "/purchase", "/manage"]);
        assert_eq!(nav.links[0].label, "Home");
    }
}
