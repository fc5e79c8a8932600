//! Lectern: a book catalog with ratings and a cached weekly top-books list.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
