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

use reqwest::StatusCode;
use serde_json::Value;
use tracing::warn;

use crate::error::{DnsError, ResourceKind};
use crate::utils::request::HttpResponse;

/// What a request is about, used to turn 404/409 into the right error.
#[derive(Debug, Clone)]
pub(crate) struct RequestContext {
    kind: ResourceKind,
    id: Option<String>,
    value: Option<String>,
}

impl RequestContext {
    pub(crate) fn zone() -> Self {
        Self {
            kind: ResourceKind::Zone,
            id: None,
            value: None,
        }
    }

    pub(crate) fn record() -> Self {
        Self {
            kind: ResourceKind::Record,
            id: None,
            value: None,
        }
    }

    /// Identifier reported by "does not exist" errors.
    pub(crate) fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Value reported by "already exists" errors.
    pub(crate) fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Maps a provider response status to a domain error.
///
/// # Process Description
///
/// 1. Any 2xx status passes.
/// 2. 404 becomes "does not exist" for the context's resource kind and id.
/// 3. 409 becomes "already exists" for the context's resource kind and value.
/// 4. A body carrying `code` and `message` becomes a provider error.
/// 5. Anything else is an unexpected status.
pub(crate) fn check_status(response: &HttpResponse, context: &RequestContext) -> Result<(), DnsError> {
    let status = response.status;
    if status.is_success() {
        return Ok(());
    }

    warn!(
        status = status.as_u16(),
        resource = %context.kind,
        "provider returned an error status"
    );

    let id = context.id.as_deref().or(context.value.as_deref()).unwrap_or_default();
    let value = context.value.as_deref().or(context.id.as_deref()).unwrap_or_default();

    match status {
        StatusCode::NOT_FOUND => Err(DnsError::not_found(context.kind, id)),
        StatusCode::CONFLICT => Err(DnsError::already_exists(context.kind, value)),
        _ => Err(body_error(status, &response.body)),
    }
}

fn body_error(status: StatusCode, body: &Value) -> DnsError {
    let code = body.get("code").filter(|v| !v.is_null());
    let message = body.get("message").and_then(Value::as_str);

    if let (Some(code), Some(message)) = (code, message) {
        let code = match code {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let detail = body
            .get("errors")
            .and_then(|errors| errors.get(0))
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return DnsError::Provider {
            status: status.as_u16(),
            code,
            message: message.to_string(),
            detail,
        };
    }

    let message = match body {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    DnsError::UnexpectedStatus {
        status: status.as_u16(),
        message,
    }
}

/// Builds a FQDN from a domain and a zone-relative record name.
pub fn to_full_record_name(domain: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("{}.{}", name, domain),
        _ => domain.to_string(),
    }
}

/// Removes the domain portion from a FQDN.
///
/// The zone apex maps to `None`. Only a trailing `.domain` suffix is stripped;
/// names outside the domain are returned as-is.
pub fn to_partial_record_name(domain: &str, fqdn: &str) -> Option<String> {
    let domain = domain.trim_end_matches('.');
    let name = fqdn.trim_end_matches('.');

    if name.eq_ignore_ascii_case(domain) || name.is_empty() {
        return None;
    }

    let suffix_len = domain.len() + 1;
    if name.len() > suffix_len && name.is_char_boundary(name.len() - suffix_len) {
        let (head, tail) = name.split_at(name.len() - suffix_len);
        if tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(domain) {
            return Some(head.to_string());
        }
    }

    Some(fqdn.to_string())
}
