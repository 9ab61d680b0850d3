//! Client for the administrative billing/CRM platform.
//!
//! Wraps every call in a bearer-token session with single-retry-on-expiry
//! semantics, and walks the bulk listing endpoints with a defensive
//! `(limit, offset)` loop.

pub mod client;
pub mod error;
pub mod models;
pub mod paginate;
pub mod session;

pub use client::AdminClient;
pub use error::{CrmError, Result};
pub use session::{AuthSession, Credentials};
