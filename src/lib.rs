//! Carte: a cached menu → submenu → dish catalog with background spreadsheet exports.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
