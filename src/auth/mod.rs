// Authentication module
// Wire types and the per-realm refresh call

pub mod refresh;
pub mod types;

pub use refresh::refresh_realm;
