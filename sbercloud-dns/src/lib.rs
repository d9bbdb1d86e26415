//! # sbercloud-dns
//!
//! Client for the SberCloud (Huawei-Cloud-compatible) IAM and DNS APIs,
//! providing the operations an ACME DNS-01 hook needs: resolve a project,
//! resolve a hosted zone, create a `_acme-challenge` TXT record, and remove
//! it again.
//!
//! ## Modules
//!
//! - [`client`] - the [`SberCloudDns`] client and its operations
//! - [`error`] - the [`ApiError`] error type
//! - [`sign`] - SDK-HMAC-SHA256 request signing
//! - [`types`] - API request/response payloads
//!
//! ## Example
//!
//! ```rust,no_run
//! use sbercloud_dns::SberCloudDns;
//!
//! # async fn run() -> sbercloud_dns::Result<()> {
//! let mut dns = SberCloudDns::for_region(
//!     "access-key".to_string(),
//!     "secret-key".to_string(),
//!     "ru-moscow-1",
//! )?;
//!
//! let project_id = dns.find_project_id("my-project").await?;
//! dns.set_project_id(project_id);
//!
//! let zone_id = dns.find_zone_id("example.com.").await?;
//! dns.present(&zone_id, "_acme-challenge.example.com.", "token").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
mod http;
pub mod sign;
pub mod types;
mod util;

pub use client::{Endpoints, SberCloudDns, SberCloudDnsBuilder};
pub use error::{ApiError, Result};
pub use sign::Signer;
