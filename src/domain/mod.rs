//! Domain layer types and invariants.

pub mod books;
pub mod entities;
pub mod error;
pub mod rating;
