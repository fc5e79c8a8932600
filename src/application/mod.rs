//! Application services layer.

pub mod books;
pub mod error;
pub mod jobs;
pub mod recommendations;
pub mod repos;
