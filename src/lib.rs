//! Probe for the file import API: authenticates with OAuth scope fallback,
//! opens an import session and tries single and batch multipart uploads,
//! reporting which request shapes the server accepted.

pub mod auth;
pub mod checksum;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod multipart;
pub mod rest_types;
pub mod upload;

mod serde_utils;

pub use auth::{AccessToken, Credentials};
pub use client::ImportClient;
pub use driver::{Driver, ProbeReport, RunOptions};
pub use error::ProbeError;
