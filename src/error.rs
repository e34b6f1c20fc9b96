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

use std::fmt;

use thiserror::Error;

use crate::models::RecordType;

/// The kind of remote resource a request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Zone,
    Record,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Zone => write!(f, "zone"),
            ResourceKind::Record => write!(f, "record"),
        }
    }
}

/// Errors returned by every DNS driver operation.
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("Zone '{zone_id}' does not exist")]
    ZoneDoesNotExist { zone_id: String },

    #[error("Record '{record_id}' does not exist")]
    RecordDoesNotExist { record_id: String },

    #[error("Zone '{value}' already exists")]
    ZoneAlreadyExists { value: String },

    #[error("Record '{value}' already exists")]
    RecordAlreadyExists { value: String },

    #[error("Unexpected status code: {status}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("{code} - {message} ({detail})")]
    Provider {
        status: u16,
        code: String,
        message: String,
        detail: String,
    },

    #[error("Invalid extra attributes: {0}")]
    InvalidExtra(String),

    #[error("Missing required parameter '{0}'")]
    MissingParam(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Unknown record type '{0}'")]
    UnknownRecordType(String),

    #[error("Record type {record_type} is not supported by {provider}")]
    UnsupportedRecordType {
        record_type: RecordType,
        provider: &'static str,
    },

    #[error("{operation} is not supported by {provider}")]
    NotSupported {
        operation: &'static str,
        provider: &'static str,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Form encoding error: {0}")]
    FormEncode(#[from] serde_urlencoded::ser::Error),
}

impl DnsError {
    /// Builds the "does not exist" error for the given resource kind.
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        match kind {
            ResourceKind::Zone => DnsError::ZoneDoesNotExist { zone_id: id.into() },
            ResourceKind::Record => DnsError::RecordDoesNotExist { record_id: id.into() },
        }
    }

    /// Builds the "already exists" error for the given resource kind.
    pub fn already_exists(kind: ResourceKind, value: impl Into<String>) -> Self {
        match kind {
            ResourceKind::Zone => DnsError::ZoneAlreadyExists { value: value.into() },
            ResourceKind::Record => DnsError::RecordAlreadyExists { value: value.into() },
        }
    }

    /// Returns true for either of the "does not exist" variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DnsError::ZoneDoesNotExist { .. } | DnsError::RecordDoesNotExist { .. }
        )
    }

    /// Returns true for either of the "already exists" variants.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            DnsError::ZoneAlreadyExists { .. } | DnsError::RecordAlreadyExists { .. }
        )
    }
}
