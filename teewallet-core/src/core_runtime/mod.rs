//! Remote runtime access
//!
//! Client seam, runtime metadata and the HTTP implementation.

pub mod client;
pub mod errors;
pub mod http;
pub mod info;

pub use client::{ClientParams, RuntimeClient, RuntimeConnector};
pub use errors::{RuntimeError, RuntimeResult};
pub use http::{HttpConnector, HttpRuntimeClient};
pub use info::RuntimeInfo;
