#[macro_export]
/// The `extract_extra!` macro pulls typed values out of a provider `extra` map
/// (`HashMap<String, serde_json::Value>`) and generates a struct instance holding them.
///
/// This macro supports:
/// - Extracting required keys, failing when the key is absent or `null`
/// - Extracting optional keys, either as `Option<T>` or with a default value
/// - Accepting numbers given as JSON numbers or as numeric strings
///
/// The expansion evaluates to `Result<StructName, String>`; the error string names
/// the offending key. The calling crate must depend on `serde_json`.
///
/// # Usage
///
/// ```rust
/// # use std::collections::HashMap;
/// # use dns_drivers_macros::extract_extra;
/// # fn main() -> Result<(), String> {
/// let mut extra = HashMap::new();
/// extra.insert("email".to_string(), serde_json::json!("admin@example.com"));
///
/// let params = extract_extra!(extra, ZoneExtra, {
///     required email: String => "email",
///     optional ttl: u32 = 3600 => "ttl",
///     optional comment: String => "comment"
/// })?;
///
/// assert_eq!(params.email, "admin@example.com");
/// assert_eq!(params.ttl, 3600);
/// assert_eq!(params.comment, None);
/// # Ok(())
/// # }
/// ```
///
/// Where:
/// - `extra` is the map to read from (borrowed, never consumed)
/// - `StructName` is the name of the struct to be generated
/// - `Type` can be `String`, `u32`, `u64` or `bool`
/// - `"key"` is the key looked up in the map
/// - `default` turns an optional field from `Option<Type>` into `Type`
///
macro_rules! extract_extra {
    // Field type helpers: optional fields without a default stay wrapped in Option
    (@type $ty:ident) => { $ty };
    (@optional_type $ty:ident) => { ::core::option::Option<$ty> };
    (@optional_type $ty:ident, $default:expr) => { $ty };

    // Resolve an optional value, falling back to the default when one is given
    (@resolve $value:ident) => { $value };
    (@resolve $value:ident, $default:expr) => { $value.unwrap_or_else(|| $default) };

    // Convert a single JSON value into the requested type
    (@convert $value:expr, $key:literal, String) => {
        match $value {
            serde_json::Value::String(s) => Ok(s.clone()),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            other => Err(format!("{} must be a string, got {}", $key, other)),
        }
    };
    (@convert $value:expr, $key:literal, u32) => {
        $crate::extract_extra!(@convert_unsigned $value, $key, u32)
    };
    (@convert $value:expr, $key:literal, u64) => {
        $crate::extract_extra!(@convert_unsigned $value, $key, u64)
    };
    (@convert $value:expr, $key:literal, bool) => {
        match $value {
            serde_json::Value::Bool(b) => Ok(*b),
            serde_json::Value::String(s) => s
                .trim()
                .parse::<bool>()
                .map_err(|e| format!("{} parse failed: {}", $key, e)),
            other => Err(format!("{} must be a boolean, got {}", $key, other)),
        }
    };
    (@convert_unsigned $value:expr, $key:literal, $ty:ty) => {
        match $value {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|n| <$ty>::try_from(n).ok())
                .ok_or_else(|| format!("{} is out of range: {}", $key, n)),
            serde_json::Value::String(s) => s
                .trim()
                .parse::<$ty>()
                .map_err(|e| format!("{} parse failed: {}", $key, e)),
            other => Err(format!("{} must be a number, got {}", $key, other)),
        }
    };

    // Main macro
    (
        $extra:expr,
        $struct_name:ident,
        {
            $( required $req_field:ident : $req_ty:ident => $req_key:literal ),* $(,)*
            $( optional $opt_field:ident : $opt_ty:ident $( = $opt_default:expr )? => $opt_key:literal ),* $(,)*
        }
    ) => {{
        #[derive(Debug, Clone)]
        #[allow(dead_code)]
        struct $struct_name {
            $(
                $req_field: $crate::extract_extra!(@type $req_ty),
            )*
            $(
                $opt_field: $crate::extract_extra!(@optional_type $opt_ty $(, $opt_default)?),
            )*
        }

        let extra: &::std::collections::HashMap<::std::string::String, serde_json::Value> = &$extra;

        (|| -> ::core::result::Result<$struct_name, ::std::string::String> {
            ::core::result::Result::Ok($struct_name {
                $(
                    $req_field: {
                        let value = extra
                            .get($req_key)
                            .filter(|v| !v.is_null())
                            .ok_or_else(|| format!("\"{}\" key must be present in extra", $req_key))?;
                        $crate::extract_extra!(@convert value, $req_key, $req_ty)?
                    },
                )*
                $(
                    $opt_field: {
                        let value = match extra.get($opt_key).filter(|v| !v.is_null()) {
                            Some(value) => Some($crate::extract_extra!(@convert value, $opt_key, $opt_ty)?),
                            None => None,
                        };
                        $crate::extract_extra!(@resolve value $(, $opt_default)?)
                    },
                )*
            })
        })()
    }};
}
