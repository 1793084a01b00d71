//! Core business logic for pingoo.
//!
//! Services own the business rules and open the transactions; persistence
//! goes through `pingoo-db` repositories.

pub mod services;

pub use services::*;
