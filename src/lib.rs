//! Graph-based movie recommendation service.
//!
//! [`engine`] holds the recommender itself; the remaining modules are the
//! HTTP service around it.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
