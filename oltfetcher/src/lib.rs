//! Client for the fiber-OLT provisioning platform.

pub mod client;
pub mod error;
pub mod models;

pub use client::OltClient;
pub use error::{OltError, Result};
pub use models::OnuHealth;
