//! Navigation Context
//!
//! The host application tells the map which route is active. Only two routes
//! are recognised; everything else frames the map with the default offset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Route the host application is displaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteContext {
    Signup,
    Login,
    #[default]
    Other,
}

impl RouteContext {
    /// Parses a route name or path. Leading slashes, surrounding whitespace and
    /// case are ignored; unknown routes map to [`RouteContext::Other`].
    pub fn from_route(route: &str) -> Self {
        let name = route.trim().trim_start_matches('/').to_lowercase();
        match name.as_str() {
            "signup" => RouteContext::Signup,
            "login" => RouteContext::Login,
            _ => RouteContext::Other,
        }
    }
}

impl From<&str> for RouteContext {
    fn from(route: &str) -> Self {
        Self::from_route(route)
    }
}

impl fmt::Display for RouteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteContext::Signup => write!(f, "signup"),
            RouteContext::Login => write!(f, "login"),
            RouteContext::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_routes() {
        assert_eq!(RouteContext::from_route("signup"), RouteContext::Signup);
        assert_eq!(RouteContext::from_route("/signup"), RouteContext::Signup);
        assert_eq!(RouteContext::from_route(" /Login\n"), RouteContext::Login);
    }

    #[test]
    fn test_unknown_routes_fall_back() {
        assert_eq!(RouteContext::from_route(""), RouteContext::Other);
        assert_eq!(RouteContext::from_route("/dashboard"), RouteContext::Other);
        assert_eq!(RouteContext::from("/signup/extra"), RouteContext::Other);
    }
}
