//! Biblioteca Library Management System
//!
//! A Rust REST backend for library management: book catalog, users, and the
//! loan lifecycle (availability, renewals, fines, FIFO reservations).

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod dates;
pub mod error;
pub mod isbn;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
