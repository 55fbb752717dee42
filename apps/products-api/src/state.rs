//! Application state management

use mongodb::{Client, Database};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// Connected backend, absent for the in-memory store
    pub mongo: Option<MongoBackend>,
}

#[derive(Clone)]
pub struct MongoBackend {
    pub client: Client,
    pub db: Database,
}
