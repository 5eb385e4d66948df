// Altura API client - library root

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod realm;
pub mod session;
pub mod store;

pub use client::ApiClient;
pub use error::ClientError;
pub use realm::Realm;
