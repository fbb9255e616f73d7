pub mod app;
pub mod articles;
pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod newsletter;
pub mod pages;
pub mod papers;
pub mod state;
pub mod store;

pub use app::build_app;
pub use state::AppState;
