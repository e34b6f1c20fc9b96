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

//! Provider-neutral zone and record snapshots.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DnsError;
use crate::providers::utils::to_full_record_name;

/// Provider-specific attributes attached to zones and records.
pub type Extra = HashMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    #[default]
    Master,
    Slave,
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneType::Master => write!(f, "master"),
            ZoneType::Slave => write!(f, "slave"),
        }
    }
}

/// DNS resource record types known to the drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Afsdb,
    Alias,
    Caa,
    Cert,
    Cname,
    Dname,
    Dnskey,
    Ds,
    Hinfo,
    Loc,
    Mx,
    Naptr,
    Ns,
    Ptr,
    Soa,
    Spf,
    Srv,
    Sshfp,
    Tlsa,
    Txt,
}

impl RecordType {
    /// Wire representation used by both providers.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Afsdb => "AFSDB",
            RecordType::Alias => "ALIAS",
            RecordType::Caa => "CAA",
            RecordType::Cert => "CERT",
            RecordType::Cname => "CNAME",
            RecordType::Dname => "DNAME",
            RecordType::Dnskey => "DNSKEY",
            RecordType::Ds => "DS",
            RecordType::Hinfo => "HINFO",
            RecordType::Loc => "LOC",
            RecordType::Mx => "MX",
            RecordType::Naptr => "NAPTR",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Spf => "SPF",
            RecordType::Srv => "SRV",
            RecordType::Sshfp => "SSHFP",
            RecordType::Tlsa => "TLSA",
            RecordType::Txt => "TXT",
        }
    }

    /// Record types whose payload carries a priority.
    pub fn uses_priority(&self) -> bool {
        matches!(self, RecordType::Mx | RecordType::Srv)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = DnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let record_type = match s.trim().to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "AFSDB" => RecordType::Afsdb,
            "ALIAS" => RecordType::Alias,
            "CAA" => RecordType::Caa,
            "CERT" => RecordType::Cert,
            "CNAME" => RecordType::Cname,
            "DNAME" => RecordType::Dname,
            "DNSKEY" => RecordType::Dnskey,
            "DS" => RecordType::Ds,
            "HINFO" => RecordType::Hinfo,
            "LOC" => RecordType::Loc,
            "MX" => RecordType::Mx,
            "NAPTR" => RecordType::Naptr,
            "NS" => RecordType::Ns,
            "PTR" => RecordType::Ptr,
            "SOA" => RecordType::Soa,
            "SPF" => RecordType::Spf,
            "SRV" => RecordType::Srv,
            "SSHFP" => RecordType::Sshfp,
            "TLSA" => RecordType::Tlsa,
            "TXT" => RecordType::Txt,
            _ => return Err(DnsError::UnknownRecordType(s.to_string())),
        };
        Ok(record_type)
    }
}

/// A DNS domain under management, as last seen on the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider identifier; Vultr uses the domain itself.
    pub id: String,
    pub domain: String,
    pub zone_type: ZoneType,
    pub ttl: Option<u32>,
    #[serde(default)]
    pub extra: Extra,
}

/// A single resource record within a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// Name relative to the zone; `None` is the zone apex.
    pub name: Option<String>,
    pub record_type: RecordType,
    pub data: String,
    pub zone: Zone,
    #[serde(default)]
    pub extra: Extra,
}

impl Record {
    /// Fully-qualified name of the record.
    pub fn fqdn(&self) -> String {
        to_full_record_name(&self.zone.domain, self.name.as_deref())
    }
}
