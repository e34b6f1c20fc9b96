use std::collections::HashMap;

use dns_drivers_macros::extract_extra;
use serde_json::{Value, json};

fn extra(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn required_and_optional_fields_are_extracted() {
    let extra = extra(&[
        ("email", json!("admin@example.com")),
        ("ttl", json!(600)),
        ("priority", json!("10")),
    ]);

    let params = extract_extra!(extra, RecordExtra, {
        required email: String => "email",
        optional ttl: u32 = 3600 => "ttl",
        optional priority: u64 => "priority",
        optional comment: String => "comment"
    })
    .unwrap();

    assert_eq!(params.email, "admin@example.com");
    assert_eq!(params.ttl, 600);
    assert_eq!(params.priority, Some(10));
    assert_eq!(params.comment, None);
}

#[test]
fn missing_required_key_is_reported() {
    let extra = extra(&[("comment", json!("hello"))]);

    let err = extract_extra!(extra, ZoneExtra, {
        required email: String => "email"
    })
    .unwrap_err();

    assert!(err.contains("\"email\""), "unexpected error: {err}");
}

#[test]
fn null_counts_as_absent() {
    let extra = extra(&[("ttl", Value::Null), ("serverip", Value::Null)]);

    let params = extract_extra!(extra, Defaults, {
        optional ttl: u32 = 7200 => "ttl"
    })
    .unwrap();
    assert_eq!(params.ttl, 7200);

    let result = extract_extra!(extra, Required, {
        required serverip: String => "serverip"
    });
    assert!(result.is_err());
}

#[test]
fn type_mismatches_are_rejected() {
    let extra = extra(&[("ttl", json!("soon")), ("proxied", json!(3)), ("big", json!(u64::MAX))]);

    assert!(extract_extra!(extra, A, { optional ttl: u32 => "ttl" }).is_err());
    assert!(extract_extra!(extra, B, { optional proxied: bool => "proxied" }).is_err());
    assert!(extract_extra!(extra, C, { optional big: u32 => "big" }).is_err());
    assert_eq!(extract_extra!(extra, D, { required big: u64 => "big" }).unwrap().big, u64::MAX);
}

#[test]
fn numbers_are_accepted_as_strings_and_strings_as_numbers() {
    let extra = extra(&[("serverip", json!(42)), ("proxied", json!("true"))]);

    let params = extract_extra!(extra, Mixed, {
        required serverip: String => "serverip",
        required proxied: bool => "proxied"
    })
    .unwrap();

    assert_eq!(params.serverip, "42");
    assert!(params.proxied);
}
