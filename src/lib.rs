pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod models;

pub use infrastructure::config;
pub use infrastructure::db;
