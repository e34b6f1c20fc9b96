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

use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use dns_drivers_macros::extract_extra;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::{DnsClient, DnsProvider, DnsProviderBuilder, DnsProviderImpl};
use crate::error::DnsError;
use crate::models::{Extra, Record, RecordType, Zone, ZoneType};
use crate::providers::utils::{RequestContext, check_status, to_full_record_name, to_partial_record_name};
use crate::utils::request::{DnsHttpClient, HttpResponse};
use crate::utils::serde_utils::string_or_number;

pub(crate) const HPCLOUD_API: &str = "https://region-a.geo-1.dns.hpcloudsvc.com/v1";
pub(crate) const HPCLOUD_AUTH_URL: &str = "https://region-a.geo-1.identity.hpcloudsvc.com:35357/v3/auth/tokens";

const AUTH_TOKEN_HEADER: &str = "x-auth-token";
const SUBJECT_TOKEN_HEADER: &str = "x-subject-token";

const DEFAULT_ZONE_TTL: u32 = 7200;
const DEFAULT_RECORD_TTL: u32 = 3600;

/// Record attributes copied into `Record::extra` when the API returns them.
const VALID_RECORD_EXTRA_PARAMS: &[&str] = &["ttl", "comment", "priority"];

const RECORD_TYPES: &[RecordType] = &[
    RecordType::A,
    RecordType::Aaaa,
    RecordType::Cname,
    RecordType::Mx,
    RecordType::Ns,
    RecordType::Ptr,
    RecordType::Srv,
    RecordType::Txt,
];

/// Builder for creating HP Cloud DNS client instances.
#[derive(Default)]
pub struct HpCloudDnsBuilder<T: DnsHttpClient + Default> {
    username: Option<String>,
    password: Option<String>,
    domain_name: Option<String>,
    tenant_name: Option<String>,
    auth_token: Option<String>,
    auth_url: Option<String>,
    endpoint: Option<String>,
    invalid_param: Option<String>,
    _marker: PhantomData<T>,
}

impl<T: DnsHttpClient + Default + 'static> DnsProviderBuilder for HpCloudDnsBuilder<T> {
    type Output = DnsProviderImpl<T>;

    /// Sets configuration parameters for the DNS provider builder.
    ///
    /// Supported keys:
    /// - "username" (alias "key")
    /// - "password" (alias "secret")
    /// - "domain_name"
    /// - "tenant_name"
    /// - "auth_token": a pre-issued Keystone token, skips password authentication
    /// - "auth_url"
    /// - "endpoint"
    fn set_param(self: Box<Self>, key: &str, value: &str) -> Box<dyn DnsProviderBuilder<Output = DnsProviderImpl<T>>> {
        let mut this = *self;
        match key {
            "username" | "key" => this.username = Some(value.into()),
            "password" | "secret" => this.password = Some(value.into()),
            "domain_name" => this.domain_name = Some(value.into()),
            "tenant_name" => this.tenant_name = Some(value.into()),
            "auth_token" => this.auth_token = Some(value.into()),
            "auth_url" => this.auth_url = Some(value.into()),
            "endpoint" => this.endpoint = Some(value.into()),
            _ => {
                this.invalid_param.get_or_insert_with(|| key.to_string());
            }
        }
        Box::new(this)
    }

    /// Constructs a new HP Cloud client instance using configured parameters.
    ///
    /// Password credentials are only required when no `auth_token` was given.
    fn build(self: Box<Self>) -> Result<DnsProviderImpl<T>, DnsError> {
        let this = *self;
        if let Some(key) = this.invalid_param {
            return Err(DnsError::InvalidParam(key));
        }

        let authorization = match (this.username, this.password, this.domain_name, this.tenant_name) {
            (Some(username), Some(password), Some(domain_name), Some(tenant_name)) => Some(
                Authorization::new(username, password)
                    .domain(domain_name)
                    .tenant(tenant_name),
            ),
            (username, password, domain_name, _) if this.auth_token.is_none() => {
                let missing = if username.is_none() {
                    "username"
                } else if password.is_none() {
                    "password"
                } else if domain_name.is_none() {
                    "domain_name"
                } else {
                    "tenant_name"
                };
                return Err(DnsError::MissingParam(missing.into()));
            }
            _ => None,
        };

        Ok(DnsProviderImpl::HpCloud(HpCloudDns::new(
            T::default(),
            this.endpoint.unwrap_or_else(|| HPCLOUD_API.into()),
            this.auth_url.unwrap_or_else(|| HPCLOUD_AUTH_URL.into()),
            authorization,
            this.auth_token,
        )))
    }
}

/// Keystone v3 password authorization for the HP Cloud identity service.
#[derive(Clone)]
pub(crate) struct Authorization {
    username: String,
    password: String,
    /// Identity domain of both the user and the project
    domain_name: String,
    /// Project the token is scoped to
    tenant_name: String,
}

impl Authorization {
    fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            domain_name: String::new(),
            tenant_name: String::new(),
        }
    }

    /// Sets the identity domain.
    fn domain(mut self, domain_name: impl Into<String>) -> Self {
        self.domain_name = domain_name.into();
        self
    }

    /// Sets the project (tenant) scope.
    fn tenant(mut self, tenant_name: impl Into<String>) -> Self {
        self.tenant_name = tenant_name.into();
        self
    }

    /// Builds the `POST /v3/auth/tokens` request body.
    fn payload(&self) -> Value {
        json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": self.username,
                            "password": self.password,
                            "domain": { "name": self.domain_name }
                        }
                    }
                },
                "scope": {
                    "project": {
                        "name": self.tenant_name,
                        "domain": { "name": self.domain_name }
                    }
                }
            }
        })
    }

    /// Requests a scoped token; Keystone returns it in the `X-Subject-Token` header.
    async fn issue_token<T: DnsHttpClient>(&self, http_client: &T, auth_url: &str) -> Result<String, DnsError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        debug!(provider = "hpcloud", user = %self.username, "requesting keystone token");

        let response = http_client
            .request(Method::POST, auth_url.to_string(), headers, Some(self.payload().to_string()))
            .await?;

        match response.status {
            StatusCode::UNAUTHORIZED => {
                return Err(DnsError::Authentication(format!(
                    "invalid credentials for user '{}'",
                    self.username
                )));
            }
            status if !status.is_success() => {
                return Err(DnsError::Authentication(format!(
                    "identity service returned status {}",
                    status.as_u16()
                )));
            }
            _ => {}
        }

        let token = response
            .headers
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| DnsError::Authentication("missing X-Subject-Token header".into()))?;

        Ok(token.to_string())
    }
}

/// Implementation of DNS client for HP Cloud DNS (OpenStack Designate v1).
pub struct HpCloudDns<T: DnsHttpClient> {
    /// HTTP client for making requests
    http_client: T,
    /// DNS API endpoint
    api: String,
    /// Keystone token endpoint
    auth_url: String,
    authorization: Option<Authorization>,
    /// Token issued on first use, reissued when the API rejects it
    token: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct HpDomain {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
    #[serde(default)]
    ttl: Option<u32>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct HpDomainList {
    #[serde(default)]
    domains: Vec<HpDomain>,
}

#[derive(Deserialize)]
struct HpRecord {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    /// Always a FQDN
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    data: String,
    #[serde(flatten, default)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct HpRecordList {
    #[serde(default)]
    records: Vec<HpRecord>,
}

#[derive(Serialize)]
struct CreateZonePayload<'a> {
    name: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

#[derive(Serialize)]
struct CreateRecordPayload<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    data: &'a str,
    ttl: u32,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u32>,
}

impl<T: DnsHttpClient> HpCloudDns<T> {
    pub(crate) fn new(
        http_client: T,
        api: impl Into<String>,
        auth_url: impl Into<String>,
        authorization: Option<Authorization>,
        auth_token: Option<String>,
    ) -> Self {
        let api: String = api.into();
        Self {
            http_client,
            api: api.trim_end_matches('/').to_string(),
            auth_url: auth_url.into(),
            authorization,
            token: RwLock::new(auth_token),
        }
    }

    async fn auth_token(&self) -> Result<String, DnsError> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut token = self.token.write().await;
        if let Some(token) = token.as_ref() {
            return Ok(token.clone());
        }
        let authorization = self
            .authorization
            .as_ref()
            .ok_or_else(|| DnsError::Authentication("no credentials configured".into()))?;
        let issued = authorization.issue_token(&self.http_client, &self.auth_url).await?;
        *token = Some(issued.clone());

        Ok(issued)
    }

    /// Drops `stale` unless another request already replaced it.
    async fn forget_token(&self, stale: &str) {
        let mut token = self.token.write().await;
        if token.as_deref() == Some(stale) {
            *token = None;
        }
    }

    /// Appends percent-encoded path segments to the API endpoint.
    fn endpoint(&self, path: &[&str]) -> Result<String, DnsError> {
        let mut url =
            Url::parse(&self.api).map_err(|e| DnsError::InvalidParam(format!("endpoint {}: {}", self.api, e)))?;
        url.path_segments_mut()
            .map_err(|_| DnsError::InvalidParam(format!("endpoint {} cannot take a path", self.api)))?
            .pop_if_empty()
            .extend(path);

        Ok(url.to_string())
    }

    async fn request(
        &self,
        method: Method,
        path: &[&str],
        body: Option<String>,
        context: RequestContext,
    ) -> Result<Value, DnsError> {
        let url = self.endpoint(path)?;
        let token = self.auth_token().await?;
        let mut response = self.send(method.clone(), &url, &token, body.clone()).await?;

        // Fixed tokens are never renewed.
        if response.status == StatusCode::UNAUTHORIZED && self.authorization.is_some() {
            info!(provider = "hpcloud", "token rejected, requesting a new one");
            self.forget_token(&token).await;
            let token = self.auth_token().await?;
            response = self.send(method, &url, &token, body).await?;
        }
        check_status(&response, &context)?;

        Ok(response.body)
    }

    async fn send(&self, method: Method, url: &str, token: &str, body: Option<String>) -> Result<HttpResponse, DnsError> {
        let headers = build_headers(token)?;

        debug!(provider = "hpcloud", method = %method, url, "sending request");

        self.http_client.request(method, url.to_string(), headers, body).await
    }
}

#[async_trait]
impl<T: DnsHttpClient> DnsClient for HpCloudDns<T> {
    fn provider(&self) -> DnsProvider {
        DnsProvider::HpCloud
    }

    fn list_record_types(&self) -> Vec<RecordType> {
        RECORD_TYPES.to_vec()
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, DnsError> {
        let body = self.request(Method::GET, &["domains"], None, RequestContext::zone()).await?;
        let list: HpDomainList = serde_json::from_value(body)?;

        Ok(list.domains.into_iter().map(to_zone).collect())
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone, DnsError> {
        let body = self
            .request(
                Method::GET,
                &["domains", zone_id],
                None,
                RequestContext::zone().id(zone_id),
            )
            .await?;

        Ok(to_zone(serde_json::from_value(body)?))
    }

    async fn list_records(&self, zone: &Zone) -> Result<Vec<Record>, DnsError> {
        let body = self
            .request(
                Method::GET,
                &["domains", zone.id.as_str(), "records"],
                None,
                RequestContext::zone().id(zone.id.as_str()),
            )
            .await?;
        let list: HpRecordList = serde_json::from_value(body)?;

        list.records.into_iter().map(|item| to_record(item, zone)).collect()
    }

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<Record, DnsError> {
        let zone = self.get_zone(zone_id).await?;
        let body = self
            .request(
                Method::GET,
                &["domains", zone_id, "records", record_id],
                None,
                RequestContext::record().id(record_id),
            )
            .await?;

        to_record(serde_json::from_value(body)?, &zone)
    }

    /// Creates a zone. `extra.email` is required, `extra.comment` is optional.
    /// The TTL defaults to 7200 seconds and is omitted when zero.
    async fn create_zone(&self, domain: &str, _zone_type: ZoneType, ttl: Option<u32>, extra: Extra) -> Result<Zone, DnsError> {
        let params = extract_extra!(extra, ZoneExtra, {
            required email: String => "email",
            optional comment: String => "comment"
        })
        .map_err(DnsError::InvalidExtra)?;

        let payload = serde_json::to_string(&CreateZonePayload {
            name: domain,
            email: &params.email,
            ttl: Some(ttl.unwrap_or(DEFAULT_ZONE_TTL)).filter(|ttl| *ttl > 0),
            comment: params.comment,
        })?;

        let body = self
            .request(Method::POST, &["domains"], Some(payload), RequestContext::zone().value(domain))
            .await?;
        let zone = to_zone(serde_json::from_value(body)?);

        info!(provider = "hpcloud", zone = %zone.domain, id = %zone.id, "zone created");

        Ok(zone)
    }

    /// Creates a record. The name is sent as a FQDN.
    ///
    /// Reads `extra.ttl` (default 3600), `extra.description` (default: the FQDN)
    /// and `extra.priority`.
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
                provider: DnsProvider::HpCloud.name(),
            });
        }

        let params = extract_extra!(extra, RecordExtra, {
            optional ttl: u32 = DEFAULT_RECORD_TTL => "ttl",
            optional description: String => "description",
            optional priority: u32 => "priority"
        })
        .map_err(DnsError::InvalidExtra)?;

        let fqdn = to_full_record_name(&zone.domain, name);
        let payload = serde_json::to_string(&CreateRecordPayload {
            name: &fqdn,
            record_type: record_type.as_str(),
            data,
            ttl: params.ttl,
            description: params.description.unwrap_or_else(|| fqdn.clone()),
            priority: params.priority,
        })?;

        let body = self
            .request(
                Method::POST,
                &["domains", zone.id.as_str(), "records"],
                Some(payload),
                RequestContext::record().value(fqdn.as_str()),
            )
            .await?;
        let record = to_record(serde_json::from_value(body)?, zone)?;

        info!(provider = "hpcloud", record = %fqdn, id = %record.id, "record created");

        Ok(record)
    }

    async fn delete_zone(&self, zone: &Zone) -> Result<bool, DnsError> {
        self.request(
            Method::DELETE,
            &["domains", zone.id.as_str()],
            None,
            RequestContext::zone().id(zone.id.as_str()),
        )
        .await?;

        info!(provider = "hpcloud", zone = %zone.domain, id = %zone.id, "zone deleted");

        Ok(true)
    }

    async fn delete_record(&self, record: &Record) -> Result<bool, DnsError> {
        self.request(
            Method::DELETE,
            &["domains", record.zone.id.as_str(), "records", record.id.as_str()],
            None,
            RequestContext::record().id(record.id.as_str()),
        )
        .await?;

        info!(provider = "hpcloud", record = %record.fqdn(), id = %record.id, "record deleted");

        Ok(true)
    }
}

fn build_headers(token: &str) -> Result<HeaderMap, DnsError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut auth_value = HeaderValue::from_str(token)?;
    auth_value.set_sensitive(true);
    headers.insert(HeaderName::from_static(AUTH_TOKEN_HEADER), auth_value);

    Ok(headers)
}

fn to_zone(item: HpDomain) -> Zone {
    let mut extra = Extra::new();
    if let Some(email) = item.email {
        extra.insert("email".into(), Value::String(email));
    }
    if let Some(description) = item.description {
        extra.insert("description".into(), Value::String(description));
    }

    Zone {
        id: item.id,
        domain: item.name,
        zone_type: ZoneType::Master,
        ttl: Some(item.ttl.unwrap_or(0)),
        extra,
    }
}

fn to_record(item: HpRecord, zone: &Zone) -> Result<Record, DnsError> {
    let record_type = item.record_type.parse::<RecordType>()?;
    let name = to_partial_record_name(&zone.domain, &item.name);

    let mut extra = Extra::new();
    for key in VALID_RECORD_EXTRA_PARAMS {
        if let Some(value) = item.extra.get(*key).filter(|value| !value.is_null()) {
            extra.insert(key.to_string(), value.clone());
        }
    }
    extra.insert("fqdn".into(), Value::String(item.name));

    Ok(Record {
        id: item.id,
        name,
        record_type,
        data: item.data,
        zone: zone.clone(),
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mock::MockDnsClient;
    use pretty_assertions::assert_eq;

    const API: &str = "https://dns.hpcloud.test/v1";
    const AUTH_URL: &str = "https://identity.hpcloud.test/v3/auth/tokens";

    fn driver(mock: MockDnsClient) -> HpCloudDns<MockDnsClient> {
        HpCloudDns::new(mock, API, AUTH_URL, None, Some("tok-123".into()))
    }

    fn zone() -> Zone {
        Zone {
            id: "89acac79-38e7-497d-807c-a011e1310438".into(),
            domain: "example.com".into(),
            zone_type: ZoneType::Master,
            ttl: Some(3600),
            extra: Extra::new(),
        }
    }

    fn domain_json() -> Value {
        json!({
            "id": "89acac79-38e7-497d-807c-a011e1310438",
            "name": "example.com",
            "ttl": 3600,
            "serial": 1351800668,
            "email": "hostmaster@example.com",
            "created_at": "2012-11-01T20:11:08.000000",
            "updated_at": null,
            "description": null
        })
    }

    fn record_json(id: &str, name: &str, record_type: &str, data: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "type": record_type,
            "data": data,
            "ttl": 3600,
            "priority": null,
            "description": null,
            "created_at": "2012-11-02T19:56:26.366792",
            "updated_at": null
        })
    }

    fn extra(pairs: &[(&str, Value)]) -> Extra {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn body_json(body: &Option<String>) -> Value {
        serde_json::from_str(body.as_deref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn list_zones_sends_token_and_maps_domains() {
        let hp = driver(MockDnsClient::new().respond(200, json!({"domains": [domain_json()]})));

        let zones = hp.list_zones().await.unwrap();

        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, "89acac79-38e7-497d-807c-a011e1310438");
        assert_eq!(zones[0].domain, "example.com");
        assert_eq!(zones[0].ttl, Some(3600));
        assert_eq!(zones[0].extra["email"], json!("hostmaster@example.com"));
        assert!(!zones[0].extra.contains_key("description"));

        let request = &hp.http_client.requests()[0];
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://dns.hpcloud.test/v1/domains");
        assert_eq!(request.headers.get(AUTH_TOKEN_HEADER).unwrap(), "tok-123");
        assert!(request.headers.get(AUTH_TOKEN_HEADER).unwrap().is_sensitive());
    }

    #[tokio::test]
    async fn zone_ids_and_missing_ttl() {
        let hp = driver(MockDnsClient::new().respond(200, json!({"id": 42, "name": "example.org"})));

        let zone = hp.get_zone("42").await.unwrap();

        assert_eq!(zone.id, "42");
        assert_eq!(zone.ttl, Some(0));
        assert_eq!(hp.http_client.requests()[0].url, "https://dns.hpcloud.test/v1/domains/42");
    }

    #[tokio::test]
    async fn get_zone_not_found() {
        let hp = driver(MockDnsClient::new().respond(404, Value::Null));

        let err = hp.get_zone("nope").await.unwrap_err();

        assert!(matches!(err, DnsError::ZoneDoesNotExist { ref zone_id } if zone_id == "nope"));
    }

    #[tokio::test]
    async fn list_records_strips_domain() {
        let records = json!({"records": [
            record_json("r1", "www.example.com", "A", "15.185.172.152"),
            record_json("r2", "example.com", "NS", "ns1.example.com"),
            {
                "id": "r3", "name": "example.com", "type": "MX", "data": "mail.example.com",
                "ttl": 600, "priority": 10, "comment": "primary"
            }
        ]});
        let hp = driver(MockDnsClient::new().respond(200, records));

        let records = hp.list_records(&zone()).await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name.as_deref(), Some("www"));
        assert_eq!(records[0].extra["fqdn"], json!("www.example.com"));
        assert_eq!(records[0].extra["ttl"], json!(3600));
        assert!(!records[0].extra.contains_key("priority"));
        assert_eq!(records[1].name, None);
        assert_eq!(records[1].record_type, RecordType::Ns);
        assert_eq!(records[2].extra["priority"], json!(10));
        assert_eq!(records[2].extra["comment"], json!("primary"));
        assert!(!records[2].extra.contains_key("created_at"));

        assert_eq!(
            hp.http_client.requests()[0].url,
            "https://dns.hpcloud.test/v1/domains/89acac79-38e7-497d-807c-a011e1310438/records"
        );
    }

    #[tokio::test]
    async fn get_record_fetches_zone_then_record() {
        let hp = driver(
            MockDnsClient::new()
                .respond(200, domain_json())
                .respond(200, record_json("r1", "api.example.com", "CNAME", "example.com")),
        );

        let record = hp
            .get_record("89acac79-38e7-497d-807c-a011e1310438", "r1")
            .await
            .unwrap();

        assert_eq!(record.id, "r1");
        assert_eq!(record.name.as_deref(), Some("api"));
        assert_eq!(record.zone.domain, "example.com");
        assert_eq!(
            hp.http_client.requests()[1].url,
            "https://dns.hpcloud.test/v1/domains/89acac79-38e7-497d-807c-a011e1310438/records/r1"
        );
    }

    #[tokio::test]
    async fn get_record_not_found() {
        let hp = driver(MockDnsClient::new().respond(200, domain_json()).respond(404, Value::Null));

        let err = hp
            .get_record("89acac79-38e7-497d-807c-a011e1310438", "r404")
            .await
            .unwrap_err();

        assert!(matches!(err, DnsError::RecordDoesNotExist { ref record_id } if record_id == "r404"));
    }

    #[tokio::test]
    async fn create_zone_requires_email() {
        let hp = driver(MockDnsClient::new());

        let err = hp
            .create_zone("example.com", ZoneType::Master, None, Extra::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DnsError::InvalidExtra(_)));
        assert!(hp.http_client.requests().is_empty());
    }

    #[tokio::test]
    async fn create_zone_payload() {
        let hp = driver(
            MockDnsClient::new()
                .respond(201, domain_json())
                .respond(201, domain_json()),
        );

        let zone = hp
            .create_zone(
                "example.com",
                ZoneType::Master,
                None,
                extra(&[("email", json!("hostmaster@example.com"))]),
            )
            .await
            .unwrap();
        assert_eq!(zone.id, "89acac79-38e7-497d-807c-a011e1310438");

        hp.create_zone(
            "example.com",
            ZoneType::Master,
            Some(0),
            extra(&[("email", json!("hostmaster@example.com")), ("comment", json!("test"))]),
        )
        .await
        .unwrap();

        let requests = hp.http_client.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url, "https://dns.hpcloud.test/v1/domains");
        assert_eq!(
            body_json(&requests[0].body),
            json!({"name": "example.com", "email": "hostmaster@example.com", "ttl": 7200})
        );
        assert_eq!(
            body_json(&requests[1].body),
            json!({"name": "example.com", "email": "hostmaster@example.com", "comment": "test"})
        );
    }

    #[tokio::test]
    async fn create_zone_conflict() {
        let hp = driver(MockDnsClient::new().respond(409, json!({"code": 409, "type": "duplicate_domain"})));

        let err = hp
            .create_zone("example.com", ZoneType::Master, Some(300), extra(&[("email", json!("a@example.com"))]))
            .await
            .unwrap_err();

        assert!(matches!(err, DnsError::ZoneAlreadyExists { ref value } if value == "example.com"));
    }

    #[tokio::test]
    async fn create_zone_provider_error() {
        let body = json!({
            "code": 400,
            "type": "invalid_object",
            "message": "Invalid Object",
            "errors": [{"path": ["email"], "message": "'bad' is not a 'email'"}]
        });
        let hp = driver(MockDnsClient::new().respond(400, body));

        let err = hp
            .create_zone("example.com", ZoneType::Master, None, extra(&[("email", json!("bad"))]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "400 - Invalid Object ('bad' is not a 'email')");
    }

    #[tokio::test]
    async fn create_record_sends_fqdn_and_defaults() {
        let hp = driver(
            MockDnsClient::new().respond(200, record_json("r9", "www.example.com", "A", "10.0.0.1")),
        );

        let record = hp
            .create_record(Some("www"), &zone(), RecordType::A, "10.0.0.1", Extra::new())
            .await
            .unwrap();

        assert_eq!(record.id, "r9");
        assert_eq!(record.name.as_deref(), Some("www"));

        let request = &hp.http_client.requests()[0];
        assert_eq!(
            request.url,
            "https://dns.hpcloud.test/v1/domains/89acac79-38e7-497d-807c-a011e1310438/records"
        );
        assert_eq!(
            body_json(&request.body),
            json!({
                "name": "www.example.com",
                "type": "A",
                "data": "10.0.0.1",
                "ttl": 3600,
                "description": "www.example.com"
            })
        );
    }

    #[tokio::test]
    async fn create_record_forwards_extra() {
        let hp = driver(
            MockDnsClient::new().respond(200, record_json("r10", "example.com", "MX", "mail.example.com")),
        );

        let record = hp
            .create_record(
                None,
                &zone(),
                RecordType::Mx,
                "mail.example.com",
                extra(&[
                    ("ttl", json!("600")),
                    ("priority", json!(10)),
                    ("description", json!("mail")),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(record.name, None);
        assert_eq!(
            body_json(&hp.http_client.requests()[0].body),
            json!({
                "name": "example.com",
                "type": "MX",
                "data": "mail.example.com",
                "ttl": 600,
                "description": "mail",
                "priority": 10
            })
        );
    }

    #[tokio::test]
    async fn create_record_conflict_and_unsupported_type() {
        let hp = driver(MockDnsClient::new().respond(409, Value::Null));

        let err = hp
            .create_record(Some("www"), &zone(), RecordType::A, "10.0.0.1", Extra::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DnsError::RecordAlreadyExists { ref value } if value == "www.example.com"));

        let err = hp
            .create_record(Some("x"), &zone(), RecordType::Sshfp, "1 1 abc", Extra::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DnsError::UnsupportedRecordType { provider, .. } if provider == "HP Public Cloud (Helion)"));
        assert_eq!(hp.http_client.requests().len(), 1);
    }

    #[tokio::test]
    async fn deletes() {
        let hp = driver(MockDnsClient::new().respond(200, Value::Null).respond(200, Value::Null));
        let record = Record {
            id: "r1".into(),
            name: Some("www".into()),
            record_type: RecordType::A,
            data: "10.0.0.1".into(),
            zone: zone(),
            extra: Extra::new(),
        };

        assert!(hp.delete_record(&record).await.unwrap());
        assert!(hp.delete_zone(&zone()).await.unwrap());

        let requests = hp.http_client.requests();
        assert_eq!(requests[0].method, Method::DELETE);
        assert_eq!(
            requests[0].url,
            "https://dns.hpcloud.test/v1/domains/89acac79-38e7-497d-807c-a011e1310438/records/r1"
        );
        assert_eq!(requests[1].method, Method::DELETE);
        assert_eq!(
            requests[1].url,
            "https://dns.hpcloud.test/v1/domains/89acac79-38e7-497d-807c-a011e1310438"
        );
    }

    #[tokio::test]
    async fn delete_missing_record() {
        let hp = driver(MockDnsClient::new().respond(404, Value::Null));
        let record = Record {
            id: "gone".into(),
            name: None,
            record_type: RecordType::A,
            data: "10.0.0.1".into(),
            zone: zone(),
            extra: Extra::new(),
        };

        let err = hp.delete_record(&record).await.unwrap_err();

        assert!(matches!(err, DnsError::RecordDoesNotExist { ref record_id } if record_id == "gone"));
    }

    #[tokio::test]
    async fn password_authentication_happens_once() {
        let mock = MockDnsClient::new()
            .respond_with_header(201, SUBJECT_TOKEN_HEADER, "issued-token", json!({"token": {}}))
            .respond(200, json!({"domains": []}))
            .respond(200, json!({"domains": []}));
        let authorization = Authorization::new("user", "pass").domain("dom").tenant("proj");
        let hp = HpCloudDns::new(mock, API, AUTH_URL, Some(authorization), None);

        hp.list_zones().await.unwrap();
        hp.list_zones().await.unwrap();

        let requests = hp.http_client.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url, AUTH_URL);
        let payload = body_json(&requests[0].body);
        assert_eq!(payload["auth"]["identity"]["methods"], json!(["password"]));
        assert_eq!(
            payload["auth"]["identity"]["password"]["user"],
            json!({"name": "user", "password": "pass", "domain": {"name": "dom"}})
        );
        assert_eq!(
            payload["auth"]["scope"]["project"],
            json!({"name": "proj", "domain": {"name": "dom"}})
        );
        assert_eq!(requests[1].headers.get(AUTH_TOKEN_HEADER).unwrap(), "issued-token");
        assert_eq!(requests[2].headers.get(AUTH_TOKEN_HEADER).unwrap(), "issued-token");
    }

    #[tokio::test]
    async fn authentication_failures() {
        let authorization = Authorization::new("user", "wrong").domain("dom").tenant("proj");
        let hp = HpCloudDns::new(
            MockDnsClient::new().respond(401, Value::Null),
            API,
            AUTH_URL,
            Some(authorization.clone()),
            None,
        );
        assert!(matches!(hp.list_zones().await, Err(DnsError::Authentication(_))));

        let hp = HpCloudDns::new(
            MockDnsClient::new().respond(201, Value::Null),
            API,
            AUTH_URL,
            Some(authorization),
            None,
        );
        assert!(matches!(hp.list_zones().await, Err(DnsError::Authentication(_))));

        let hp = HpCloudDns::new(MockDnsClient::new(), API, AUTH_URL, None, None);
        assert!(matches!(hp.list_zones().await, Err(DnsError::Authentication(_))));
        assert!(hp.http_client.requests().is_empty());
    }

    #[tokio::test]
    async fn rejected_token_is_reissued_once() {
        let mock = MockDnsClient::new()
            .respond_with_header(201, SUBJECT_TOKEN_HEADER, "expired-token", json!({"token": {}}))
            .respond(401, Value::Null)
            .respond_with_header(201, SUBJECT_TOKEN_HEADER, "fresh-token", json!({"token": {}}))
            .respond(200, json!({"domains": [domain_json()]}))
            .respond(200, json!({"domains": []}));
        let authorization = Authorization::new("user", "pass").domain("dom").tenant("proj");
        let hp = HpCloudDns::new(mock, API, AUTH_URL, Some(authorization), None);

        assert_eq!(hp.list_zones().await.unwrap().len(), 1);
        assert!(hp.list_zones().await.unwrap().is_empty());

        let requests = hp.http_client.requests();
        let urls: Vec<&str> = requests.iter().map(|request| request.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                AUTH_URL,
                "https://dns.hpcloud.test/v1/domains",
                AUTH_URL,
                "https://dns.hpcloud.test/v1/domains",
                "https://dns.hpcloud.test/v1/domains",
            ]
        );
        assert_eq!(requests[1].headers.get(AUTH_TOKEN_HEADER).unwrap(), "expired-token");
        assert_eq!(requests[3].headers.get(AUTH_TOKEN_HEADER).unwrap(), "fresh-token");
        assert_eq!(requests[4].headers.get(AUTH_TOKEN_HEADER).unwrap(), "fresh-token");
    }

    #[tokio::test]
    async fn unauthorized_after_reissue_is_returned() {
        let mock = MockDnsClient::new()
            .respond_with_header(201, SUBJECT_TOKEN_HEADER, "t1", json!({"token": {}}))
            .respond(401, Value::Null)
            .respond_with_header(201, SUBJECT_TOKEN_HEADER, "t2", json!({"token": {}}))
            .respond(401, Value::Null);
        let authorization = Authorization::new("user", "pass").domain("dom").tenant("proj");
        let hp = HpCloudDns::new(mock, API, AUTH_URL, Some(authorization), None);

        let err = hp.list_zones().await.unwrap_err();

        assert!(matches!(err, DnsError::UnexpectedStatus { status: 401, .. }));
        assert_eq!(hp.http_client.requests().len(), 4);
    }

    #[tokio::test]
    async fn fixed_token_is_not_reissued() {
        let hp = driver(MockDnsClient::new().respond(401, Value::Null));

        let err = hp.list_zones().await.unwrap_err();

        assert!(matches!(err, DnsError::UnexpectedStatus { status: 401, .. }));
        assert_eq!(hp.http_client.requests().len(), 1);
    }

    #[tokio::test]
    async fn path_segments_are_percent_encoded() {
        let hp = driver(
            MockDnsClient::new()
                .respond(200, json!({"id": "a b/c", "name": "example.org"}))
                .respond(200, Value::Null),
        );

        hp.get_zone("a b/c").await.unwrap();
        let record = Record {
            id: "r?1#x".into(),
            name: None,
            record_type: RecordType::A,
            data: "10.0.0.1".into(),
            zone: zone(),
            extra: Extra::new(),
        };
        hp.delete_record(&record).await.unwrap();

        let requests = hp.http_client.requests();
        assert_eq!(requests[0].url, "https://dns.hpcloud.test/v1/domains/a%20b%2Fc");
        assert_eq!(
            requests[1].url,
            "https://dns.hpcloud.test/v1/domains/89acac79-38e7-497d-807c-a011e1310438/records/r%3F1%23x"
        );
    }
}
