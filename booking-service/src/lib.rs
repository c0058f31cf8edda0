pub mod app;
pub mod booking_handlers;
pub mod config;
pub mod countries;
pub mod credential_store;
pub mod health;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod token_handlers;

pub use app::{build_router, AppState, AuthSettings};
