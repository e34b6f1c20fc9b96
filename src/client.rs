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

//! Provider selection, configuration and the vendor-neutral client trait.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::debug;

use crate::error::DnsError;
use crate::models::{Extra, Record, RecordType, Zone, ZoneType};
use crate::providers::hpcloud::{HpCloudDns, HpCloudDnsBuilder};
use crate::providers::vultr::{VultrDns, VultrDnsBuilder};
use crate::utils::request::{DefaultDnsClient, DnsHttpClient};

/// Supported DNS providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsProvider {
    Vultr,
    HpCloud,
}

impl DnsProvider {
    pub fn name(&self) -> &'static str {
        match self {
            DnsProvider::Vultr => "Vultr DNS",
            DnsProvider::HpCloud => "HP Public Cloud (Helion)",
        }
    }

    pub fn website(&self) -> &'static str {
        match self {
            DnsProvider::Vultr => "http://www.vultr.com/",
            DnsProvider::HpCloud => "http://www.hpcloud.com/",
        }
    }

    /// Builder parameters and the environment variables `from_env` reads them from.
    fn env_params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            DnsProvider::Vultr => &[("api_key", "VULTR_API_KEY"), ("endpoint", "VULTR_ENDPOINT")],
            DnsProvider::HpCloud => &[
                ("username", "HPCLOUD_USERNAME"),
                ("password", "HPCLOUD_PASSWORD"),
                ("domain_name", "HPCLOUD_DOMAIN_NAME"),
                ("tenant_name", "HPCLOUD_TENANT_NAME"),
                ("auth_token", "HPCLOUD_AUTH_TOKEN"),
                ("auth_url", "HPCLOUD_AUTH_URL"),
                ("endpoint", "HPCLOUD_ENDPOINT"),
            ],
        }
    }
}

impl fmt::Display for DnsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsProvider::Vultr => write!(f, "vultr"),
            DnsProvider::HpCloud => write!(f, "hpcloud"),
        }
    }
}

impl FromStr for DnsProvider {
    type Err = DnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vultr" => Ok(DnsProvider::Vultr),
            "hpcloud" | "hp" => Ok(DnsProvider::HpCloud),
            _ => Err(DnsError::InvalidParam(format!("unknown provider '{}'", s))),
        }
    }
}

/// Collects provider parameters and produces a client.
pub trait DnsProviderBuilder {
    type Output;

    fn set_param(self: Box<Self>, key: &str, value: &str) -> Box<dyn DnsProviderBuilder<Output = Self::Output>>;

    fn build(self: Box<Self>) -> Result<Self::Output, DnsError>;
}

/// Vendor-neutral zone and record management.
#[async_trait]
pub trait DnsClient: Send + Sync {
    fn provider(&self) -> DnsProvider;

    /// Record types this provider can create.
    fn list_record_types(&self) -> Vec<RecordType>;

    async fn list_zones(&self) -> Result<Vec<Zone>, DnsError>;

    async fn get_zone(&self, zone_id: &str) -> Result<Zone, DnsError>;

    async fn list_records(&self, zone: &Zone) -> Result<Vec<Record>, DnsError>;

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<Record, DnsError>;

    async fn create_zone(&self, domain: &str, zone_type: ZoneType, ttl: Option<u32>, extra: Extra) -> Result<Zone, DnsError>;

    async fn update_zone(&self, _zone: &Zone, _domain: &str, _ttl: Option<u32>, _extra: Extra) -> Result<Zone, DnsError> {
        Err(DnsError::NotSupported {
            operation: "update_zone",
            provider: self.provider().name(),
        })
    }

    /// Creates a record; `None` names the zone apex.
    async fn create_record(
        &self,
        name: Option<&str>,
        zone: &Zone,
        record_type: RecordType,
        data: &str,
        extra: Extra,
    ) -> Result<Record, DnsError>;

    async fn update_record(
        &self,
        _record: &Record,
        _name: Option<&str>,
        _record_type: RecordType,
        _data: &str,
        _extra: Extra,
    ) -> Result<Record, DnsError> {
        Err(DnsError::NotSupported {
            operation: "update_record",
            provider: self.provider().name(),
        })
    }

    async fn delete_zone(&self, zone: &Zone) -> Result<bool, DnsError>;

    async fn delete_record(&self, record: &Record) -> Result<bool, DnsError>;
}

/// A configured driver for one of the supported providers.
pub enum DnsProviderImpl<T: DnsHttpClient = DefaultDnsClient> {
    Vultr(VultrDns<T>),
    HpCloud(HpCloudDns<T>),
}

impl DnsProviderImpl {
    /// Starts configuring a client backed by reqwest.
    pub fn new(provider: DnsProvider) -> Box<dyn DnsProviderBuilder<Output = DnsProviderImpl>> {
        Self::builder(provider)
    }

    /// Builds a client from `VULTR_*` / `HPCLOUD_*` environment variables.
    pub fn from_env(provider: DnsProvider) -> Result<Self, DnsError> {
        Self::from_vars(provider, |var| std::env::var(var).ok())
    }
}

impl<T: DnsHttpClient + Default + 'static> DnsProviderImpl<T> {
    /// Starts configuring a client on a custom transport.
    pub fn builder(provider: DnsProvider) -> Box<dyn DnsProviderBuilder<Output = DnsProviderImpl<T>>> {
        match provider {
            DnsProvider::Vultr => Box::new(VultrDnsBuilder::<T>::default()),
            DnsProvider::HpCloud => Box::new(HpCloudDnsBuilder::<T>::default()),
        }
    }

    /// Applies every key/value pair to a fresh builder and builds the client.
    pub fn from_params<I, K, V>(provider: DnsProvider, params: I) -> Result<Self, DnsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = Self::builder(provider);
        for (key, value) in params {
            debug!(provider = %provider, key = key.as_ref(), "setting parameter");
            builder = builder.set_param(key.as_ref(), value.as_ref());
        }
        builder.build()
    }

    /// Like `from_env`, resolving each `VULTR_*` / `HPCLOUD_*` name through `lookup`.
    pub fn from_vars<F>(provider: DnsProvider, lookup: F) -> Result<Self, DnsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let params = provider
            .env_params()
            .iter()
            .filter_map(|(key, var)| lookup(var).map(|value| (*key, value)));
        Self::from_params(provider, params)
    }

    fn inner(&self) -> &dyn DnsClient {
        match self {
            DnsProviderImpl::Vultr(client) => client,
            DnsProviderImpl::HpCloud(client) => client,
        }
    }
}

#[async_trait]
impl<T: DnsHttpClient + Default + 'static> DnsClient for DnsProviderImpl<T> {
    fn provider(&self) -> DnsProvider {
        self.inner().provider()
    }

    fn list_record_types(&self) -> Vec<RecordType> {
        self.inner().list_record_types()
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, DnsError> {
        self.inner().list_zones().await
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone, DnsError> {
        self.inner().get_zone(zone_id).await
    }

    async fn list_records(&self, zone: &Zone) -> Result<Vec<Record>, DnsError> {
        self.inner().list_records(zone).await
    }

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<Record, DnsError> {
        self.inner().get_record(zone_id, record_id).await
    }

    async fn create_zone(&self, domain: &str, zone_type: ZoneType, ttl: Option<u32>, extra: Extra) -> Result<Zone, DnsError> {
        self.inner().create_zone(domain, zone_type, ttl, extra).await
    }

    async fn update_zone(&self, zone: &Zone, domain: &str, ttl: Option<u32>, extra: Extra) -> Result<Zone, DnsError> {
        self.inner().update_zone(zone, domain, ttl, extra).await
    }

    async fn create_record(
        &self,
        name: Option<&str>,
        zone: &Zone,
        record_type: RecordType,
        data: &str,
        extra: Extra,
    ) -> Result<Record, DnsError> {
        self.inner().create_record(name, zone, record_type, data, extra).await
    }

    async fn update_record(
        &self,
        record: &Record,
        name: Option<&str>,
        record_type: RecordType,
        data: &str,
        extra: Extra,
    ) -> Result<Record, DnsError> {
        self.inner().update_record(record, name, record_type, data, extra).await
    }

    async fn delete_zone(&self, zone: &Zone) -> Result<bool, DnsError> {
        self.inner().delete_zone(zone).await
    }

    async fn delete_record(&self, record: &Record) -> Result<bool, DnsError> {
        self.inner().delete_record(record).await
    }
}
