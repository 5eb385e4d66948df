// Session teardown
// Runs when a realm's refresh is rejected: the session is over.

use crate::realm::Realm;
use crate::store::CredentialStore;

/// Navigation seam toward the embedding UI.
///
/// The client only needs to know where the user currently is and how to
/// send them to a realm's login page when its session ends.
pub trait Navigator: Send + Sync {
    /// Path the user is currently looking at.
    fn current_path(&self) -> String;

    /// Send the user to the given path.
    fn navigate(&self, path: &str);
}

/// Navigator that goes nowhere, for headless use.
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn navigate(&self, _path: &str) {}
}

/// Clear the realm's stored credentials and send the user to its login page
/// unless they are already there.
///
/// Terminal for the realm: no request succeeds afterwards until a fresh
/// login repopulates the store. Store failures are logged, never panic.
pub fn teardown(store: &dyn CredentialStore, navigator: &dyn Navigator, realm: Realm) {
    if let Err(e) = store.clear(realm) {
        tracing::error!(realm = ?realm, "Failed to clear credentials during teardown: {:#}", e);
    }

    let entry = realm.entry_path();
    if navigator.current_path() != entry {
        tracing::warn!(realm = ?realm, "Session ended, redirecting to {}", entry);
        navigator.navigate(entry);
    } else {
        tracing::warn!(realm = ?realm, "Session ended at {}", entry);
    }
}
