//! Vendor-neutral DNS management for cloud providers
//!
//! Supported features:
//! - Unified zone and record API over Vultr DNS and HP Cloud DNS (OpenStack Designate)
//! - Asynchronous operations
//! - Builder pattern for provider configuration
//! - HTTP status codes mapped to typed errors
//!
//! # Example
//! ```no_run
//! use cloud_dns_drivers::client::{DnsClient, DnsProvider, DnsProviderImpl};
//! use cloud_dns_drivers::models::{Extra, RecordType};
//!
//! # async fn run() -> Result<(), cloud_dns_drivers::error::DnsError> {
//! let client = DnsProviderImpl::new(DnsProvider::Vultr)
//!     .set_param("api_key", "your_key")
//!     .build()?;
//!
//! let zone = client.get_zone("example.com").await?;
//! let record = client
//!     .create_record(Some("www"), &zone, RecordType::A, "192.0.2.10", Extra::new())
//!     .await?;
//! println!("created {}", record.fqdn());
//! # Ok(())
//! # }
//! ```

// Copyright 2023 rust-dns-sdk authors
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

pub(crate) mod providers;
pub mod client;
pub mod error;
pub mod models;
pub mod utils;

pub use client::{DnsClient, DnsProvider, DnsProviderBuilder, DnsProviderImpl};
pub use error::DnsError;
pub use models::{Extra, Record, RecordType, Zone, ZoneType};
