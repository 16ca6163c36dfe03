//! Clinica - clinical and veterinary administration backend
//!
//! Establishments, units, professionals, customers, pets, medicines and
//! prescriptions exposed over a JSON REST API. Writes go through a single
//! orchestration path: uniqueness validation, address reconciliation, the
//! owner write and its relation rows, all inside one unit of work.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
