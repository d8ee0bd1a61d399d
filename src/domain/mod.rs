//! Domain layer - Pure business abstractions
//!
//! Trait definitions, validation rules, and domain error types.
//! No Axum here; SeaORM only appears as an error conversion.

pub mod errors;
pub mod repositories;
pub mod validation;

pub use errors::DomainError;
pub use repositories::*;
pub use validation::*;
