// Credential realms and request classification

use serde::{Deserialize, Serialize};

/// Root of the administrative API namespace.
pub const ADMIN_API_ROOT: &str = "/admin/";

/// Independent authentication domain with its own token pair and entry point.
///
/// A request classified into one realm is never authenticated or refreshed
/// with the other realm's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Realm {
    /// End-user dashboard session
    User,

    /// Administrative console session
    Admin,
}

impl Realm {
    pub const ALL: [Realm; 2] = [Realm::User, Realm::Admin];

    /// Classify a request path into its credential realm.
    /// Unmatched paths default to `User`.
    pub fn of_path(path: &str) -> Realm {
        if path.starts_with(ADMIN_API_ROOT) {
            Realm::Admin
        } else {
            Realm::User
        }
    }

    /// Login page the user is sent to when the realm's session is torn down.
    pub fn entry_path(self) -> &'static str {
        match self {
            Realm::User => "/login",
            Realm::Admin => "/admin/login",
        }
    }

    /// Login endpoint that issues a fresh token pair for the realm.
    pub fn login_path(self) -> &'static str {
        match self {
            Realm::User => "/auth/login",
            Realm::Admin => "/admin/login",
        }
    }

    /// Token refresh endpoint for the realm.
    pub fn refresh_path(self) -> &'static str {
        match self {
            Realm::User => "/auth/refresh",
            Realm::Admin => "/admin/refresh",
        }
    }

    /// Key under which the realm's token pair is persisted.
    pub fn storage_key(self) -> &'static str {
        match self {
            Realm::User => "user:tokens",
            Realm::Admin => "admin:tokens",
        }
    }

    /// Stable index for per-realm state tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Realm::User => 0,
            Realm::Admin => 1,
        }
    }
}

/// Whether an authentication failure on this path must surface directly
/// instead of triggering a refresh.
///
/// Covers the refresh endpoints themselves plus login, registration and
/// password-reset: a 401 there means the credentials are wrong, and routing
/// it through the coordinator would loop.
pub fn refresh_exempt(path: &str) -> bool {
    path.starts_with("/auth/")
        || path == Realm::Admin.login_path()
        || path == Realm::Admin.refresh_path()
}
