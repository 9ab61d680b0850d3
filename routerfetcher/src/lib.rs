//! Client for the access routers' AAA REST interface.

pub mod client;
pub mod error;
pub mod models;

pub use client::{RouterClient, RouterCredentials, RouterFleet};
pub use error::{Result, RouterError};
pub use models::{ActiveSession, TrafficSample};
