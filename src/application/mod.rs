//! Application services: catalog use cases, exports and background jobs.

pub mod catalog;
pub mod error;
pub mod export;
pub mod jobs;
pub mod repos;
pub mod seed;
