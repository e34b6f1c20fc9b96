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

use std::collections::HashSet;
use std::marker::PhantomData;

use async_trait::async_trait;
use dns_drivers_macros::extract_extra;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{DnsClient, DnsProvider, DnsProviderBuilder, DnsProviderImpl};
use crate::error::{DnsError, ResourceKind};
use crate::models::{Extra, Record, RecordType, Zone, ZoneType};
use crate::providers::utils::{RequestContext, check_status, to_full_record_name};
use crate::utils::request::{DnsHttpClient, HttpResponse};
use crate::utils::serde_utils::{is_truthy, string_or_number};

pub(crate) const VULTR_API: &str = "https://api.vultr.com";

/// Record types Vultr accepts on creation.
const RECORD_TYPES: &[RecordType] = &[
    RecordType::A,
    RecordType::Aaaa,
    RecordType::Txt,
    RecordType::Cname,
    RecordType::Mx,
    RecordType::Ns,
    RecordType::Srv,
];

/// Builder for creating Vultr DNS client instances.
#[derive(Default)]
pub struct VultrDnsBuilder<T: DnsHttpClient + Default> {
    api_key: Option<String>,
    endpoint: Option<String>,
    invalid_param: Option<String>,
    _marker: PhantomData<T>,
}

impl<T: DnsHttpClient + Default + 'static> DnsProviderBuilder for VultrDnsBuilder<T> {
    type Output = DnsProviderImpl<T>;

    /// Sets configuration parameters for the DNS provider builder.
    ///
    /// Supported keys:
    /// - "api_key"
    /// - "endpoint"
    ///
    /// Unknown keys are reported by `build`.
    fn set_param(self: Box<Self>, key: &str, value: &str) -> Box<dyn DnsProviderBuilder<Output = DnsProviderImpl<T>>> {
        let mut this = *self;
        match key {
            "api_key" => this.api_key = Some(value.into()),
            "endpoint" => this.endpoint = Some(value.into()),
            _ => {
                this.invalid_param.get_or_insert_with(|| key.to_string());
            }
        }
        Box::new(this)
    }

    /// Constructs a new Vultr client instance using configured parameters.
    fn build(self: Box<Self>) -> Result<DnsProviderImpl<T>, DnsError> {
        if let Some(key) = self.invalid_param {
            return Err(DnsError::InvalidParam(key));
        }
        let api_key = self.api_key.ok_or_else(|| DnsError::MissingParam("api_key".into()))?;
        let endpoint = self.endpoint.unwrap_or_else(|| VULTR_API.into());

        Ok(DnsProviderImpl::Vultr(VultrDns::new(T::default(), endpoint, api_key)))
    }
}

/// Implementation of DNS client for the Vultr v1 API.
pub struct VultrDns<T: DnsHttpClient> {
    /// HTTP client for making requests
    http_client: T,
    /// API endpoint
    api: String,
    /// API key, sent as the `api_key` query parameter
    api_key: String,
}

#[derive(Deserialize)]
struct VultrDomain {
    domain: String,
    #[serde(default)]
    date_created: Option<String>,
}

#[derive(Deserialize)]
struct VultrRecord {
    #[serde(rename = "RECORDID", deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    data: String,
    #[serde(default)]
    priority: Option<Value>,
    #[serde(default)]
    ttl: Option<Value>,
}

#[derive(Serialize)]
struct CreateDomainForm<'a> {
    domain: &'a str,
    serverip: &'a str,
}

#[derive(Serialize)]
struct DeleteDomainForm<'a> {
    domain: &'a str,
}

#[derive(Serialize)]
struct CreateRecordForm<'a> {
    domain: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
}

#[derive(Serialize)]
struct DeleteRecordForm<'a> {
    domain: &'a str,
    #[serde(rename = "RECORDID")]
    record_id: &'a str,
}

impl<T: DnsHttpClient> VultrDns<T> {
    pub(crate) fn new(http_client: T, api: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api: String = api.into();
        Self {
            http_client,
            api: api.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn get(&self, action: &str, query: &[(&str, &str)], context: RequestContext) -> Result<Value, DnsError> {
        let response = self.send(Method::GET, action, query, None, context).await?;
        Ok(response.body)
    }

    async fn post(&self, action: &str, form: String, context: RequestContext) -> Result<HttpResponse, DnsError> {
        self.send(Method::POST, action, &[], Some(form), context).await
    }

    async fn send(
        &self,
        method: Method,
        action: &str,
        query: &[(&str, &str)],
        body: Option<String>,
        context: RequestContext,
    ) -> Result<HttpResponse, DnsError> {
        let mut params = vec![("api_key", self.api_key.as_str())];
        params.extend_from_slice(query);
        let url = format!("{}{}?{}", self.api, action, serde_urlencoded::to_string(&params)?);
        let headers = build_headers(body.is_some());

        debug!(provider = "vultr", method = %method, action, "sending request");

        let response = self.http_client.request(method, url, headers, body).await?;
        check_status(&response, &context)?;

        Ok(response)
    }
}

#[async_trait]
impl<T: DnsHttpClient> DnsClient for VultrDns<T> {
    fn provider(&self) -> DnsProvider {
        DnsProvider::Vultr
    }

    fn list_record_types(&self) -> Vec<RecordType> {
        RECORD_TYPES.to_vec()
    }

    /// Lists every domain on the account.
    async fn list_zones(&self) -> Result<Vec<Zone>, DnsError> {
        let body = self.get("/v1/dns/list", &[], RequestContext::zone()).await?;
        let items: Vec<VultrDomain> = parse_list(body)?;

        Ok(items.into_iter().map(to_zone).collect())
    }

    /// Vultr has no single-domain endpoint, so the zone is looked up in the full listing.
    async fn get_zone(&self, zone_id: &str) -> Result<Zone, DnsError> {
        self.list_zones()
            .await?
            .into_iter()
            .find(|zone| zone.domain == zone_id)
            .ok_or_else(|| DnsError::not_found(ResourceKind::Zone, zone_id))
    }

    /// Lists the records of a zone, after checking the zone is still on the account.
    async fn list_records(&self, zone: &Zone) -> Result<Vec<Record>, DnsError> {
        let zones = self.list_zones().await?;
        if !zone_exists(&zone.domain, &zones) {
            return Err(DnsError::not_found(ResourceKind::Zone, zone.domain.as_str()));
        }

        let body = self
            .get(
                "/v1/dns/records",
                &[("domain", zone.domain.as_str())],
                RequestContext::zone().id(zone.domain.as_str()),
            )
            .await?;
        let items: Vec<VultrRecord> = parse_list(body)?;

        items.into_iter().map(|item| to_record(item, zone)).collect()
    }

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<Record, DnsError> {
        let zone = self.get_zone(zone_id).await?;

        self.list_records(&zone)
            .await?
            .into_iter()
            .find(|record| record.id == record_id)
            .ok_or_else(|| DnsError::not_found(ResourceKind::Record, record_id))
    }

    /// Creates a domain. Vultr requires the default A record target in `extra.serverip`.
    async fn create_zone(&self, domain: &str, zone_type: ZoneType, ttl: Option<u32>, extra: Extra) -> Result<Zone, DnsError> {
        let params = extract_extra!(extra, ZoneExtra, {
            required serverip: String => "serverip"
        })
        .map_err(DnsError::InvalidExtra)?;

        let zones = self.list_zones().await?;
        if zone_exists(domain, &zones) {
            return Err(DnsError::already_exists(ResourceKind::Zone, domain));
        }

        let form = serde_urlencoded::to_string(&CreateDomainForm {
            domain,
            serverip: &params.serverip,
        })?;
        self.post("/v1/dns/create_domain", form, RequestContext::zone().value(domain))
            .await?;

        info!(provider = "vultr", zone = domain, "zone created");

        Ok(Zone {
            id: domain.to_string(),
            domain: domain.to_string(),
            zone_type,
            ttl,
            extra,
        })
    }

    async fn delete_zone(&self, zone: &Zone) -> Result<bool, DnsError> {
        let zones = self.list_zones().await?;
        if !zone_exists(&zone.domain, &zones) {
            return Err(DnsError::not_found(ResourceKind::Zone, zone.domain.as_str()));
        }

        let form = serde_urlencoded::to_string(&DeleteDomainForm { domain: &zone.domain })?;
        let response = self
            .post("/v1/dns/delete_domain", form, RequestContext::zone().id(zone.domain.as_str()))
            .await?;

        info!(provider = "vultr", zone = %zone.domain, "zone deleted");

        Ok(response.status == StatusCode::OK)
    }

    /// Creates a record and returns it as listed by Vultr afterwards.
    ///
    /// MX and SRV records need `extra.priority`; `extra.ttl` is optional.
    async fn create_record(
        &self,
        name: Option<&str>,
        zone: &Zone,
        record_type: RecordType,
        data: &str,
        extra: Extra,
    ) -> Result<Record, DnsError> {
        if !RECORD_TYPES.contains(&record_type) {
            return Err(DnsError::UnsupportedRecordType {
                record_type,
                provider: DnsProvider::Vultr.name(),
            });
        }

        let params = extract_extra!(extra, RecordExtra, {
            optional priority: u32 => "priority",
            optional ttl: u32 => "ttl"
        })
        .map_err(DnsError::InvalidExtra)?;

        if record_type.uses_priority() && params.priority.is_none() {
            return Err(DnsError::InvalidExtra(format!(
                "\"priority\" key must be present in extra for {} records",
                record_type
            )));
        }

        let name = name.unwrap_or_default();
        let existing = self.list_records(zone).await?;
        if let Some(record) = existing
            .iter()
            .find(|record| same_record(record, name, record_type, data))
        {
            return Err(DnsError::already_exists(ResourceKind::Record, record.id.as_str()));
        }

        let fqdn = to_full_record_name(&zone.domain, Some(name));
        let form = serde_urlencoded::to_string(&CreateRecordForm {
            domain: &zone.domain,
            name,
            record_type: record_type.as_str(),
            data,
            priority: params.priority.filter(|_| record_type.uses_priority()),
            ttl: params.ttl,
        })?;
        self.post("/v1/dns/create_record", form, RequestContext::record().value(fqdn.as_str()))
            .await?;

        info!(provider = "vultr", record = %fqdn, record_type = %record_type, "record created");

        // Vultr may normalise the data it stores, so fall back to the new id of the same name and type.
        let known: HashSet<&str> = existing.iter().map(|record| record.id.as_str()).collect();
        let mut created = self.list_records(zone).await?;
        let position = created
            .iter()
            .position(|record| same_record(record, name, record_type, data))
            .or_else(|| {
                created.iter().position(|record| {
                    !known.contains(record.id.as_str())
                        && record.name.as_deref().unwrap_or_default() == name
                        && record.record_type == record_type
                })
            })
            .ok_or_else(|| DnsError::InvalidResponse(format!("created record {} is not listed", fqdn)))?;

        Ok(created.swap_remove(position))
    }

    async fn delete_record(&self, record: &Record) -> Result<bool, DnsError> {
        let records = self.list_records(&record.zone).await?;
        if !record_exists(&record.id, &records) {
            return Err(DnsError::not_found(ResourceKind::Record, record.id.as_str()));
        }

        let form = serde_urlencoded::to_string(&DeleteRecordForm {
            domain: &record.zone.domain,
            record_id: &record.id,
        })?;
        let response = self
            .post("/v1/dns/delete_record", form, RequestContext::record().id(record.id.as_str()))
            .await?;

        info!(provider = "vultr", record = %record.id, zone = %record.zone.domain, "record deleted");

        Ok(response.status == StatusCode::OK)
    }
}

fn build_headers(form: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if form {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
    }
    headers
}

/// Vultr answers an empty account with either `[]` or an empty body.
fn parse_list<D: DeserializeOwned>(body: Value) -> Result<Vec<D>, DnsError> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => Ok(serde_json::from_value(body)?),
        other => Err(DnsError::InvalidResponse(format!("expected a JSON array, got {}", other))),
    }
}

fn to_zone(item: VultrDomain) -> Zone {
    let mut extra = Extra::new();
    if let Some(date_created) = item.date_created {
        extra.insert("date_created".into(), Value::String(date_created));
    }

    Zone {
        id: item.domain.clone(),
        domain: item.domain,
        zone_type: ZoneType::Master,
        ttl: None,
        extra,
    }
}

fn to_record(item: VultrRecord, zone: &Zone) -> Result<Record, DnsError> {
    let record_type = item.record_type.parse::<RecordType>()?;

    let mut extra = Extra::new();
    if let Some(priority) = item.priority.filter(is_truthy) {
        extra.insert("priority".into(), priority);
    }
    if let Some(ttl) = item.ttl.filter(|ttl| !ttl.is_null()) {
        extra.insert("ttl".into(), ttl);
    }

    Ok(Record {
        id: item.id,
        name: Some(item.name).filter(|name| !name.is_empty()),
        record_type,
        data: item.data,
        zone: zone.clone(),
        extra,
    })
}

fn zone_exists(domain: &str, zones: &[Zone]) -> bool {
    zones.iter().any(|zone| zone.domain == domain)
}

fn record_exists(record_id: &str, records: &[Record]) -> bool {
    records.iter().any(|record| record.id == record_id)
}

fn same_record(record: &Record, name: &str, record_type: RecordType, data: &str) -> bool {
    record.name.as_deref().unwrap_or_default() == name && record.record_type == record_type && record.data == data
}
