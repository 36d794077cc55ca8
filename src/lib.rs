pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod validation;
pub mod views;

pub use api::router;
pub use state::AppState;
