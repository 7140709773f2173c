//! Health Response Body Parsing
//!
//! The body schema is advisory only: the HTTP status decides liveness. The
//! fields read here feed the admin status board and the donation lookup,
//! which additionally requires `status == "healthy"`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Advisory fields reported by a server's health endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthDetails {
    pub status: Option<String>,
    pub uptime_secs: Option<f64>,
    pub database: Option<String>,
    pub admin_keys_count: Option<u64>,
    pub donated_keys_count: Option<u64>,
}

impl HealthDetails {
    /// `status` field equals "healthy" (case-insensitive)
    pub fn reports_healthy(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("healthy"))
            .unwrap_or(false)
    }
}

/// Parse a health body into advisory details
///
/// Returns `None` for empty, non-JSON, or non-object bodies.
pub fn parse_health_body(body: &[u8]) -> Option<HealthDetails> {
    if body.is_empty() || body.iter().all(|b| b.is_ascii_whitespace()) {
        return None;
    }
    let value: Value = serde_json::from_slice(body).ok()?;
    let obj = value.as_object()?;

    Some(HealthDetails {
        status: find_field(obj, &["status"]).and_then(|v| v.as_str().map(str::to_string)),
        uptime_secs: find_field(obj, &["uptime"]).and_then(Value::as_f64),
        database: find_field(obj, &["database", "db"]).and_then(describe_database),
        admin_keys_count: find_field(obj, &["adminKeysCount", "adminKeys"]).and_then(Value::as_u64),
        donated_keys_count: find_field(obj, &["donatedKeysCount", "donatedKeys"])
            .and_then(Value::as_u64),
    })
}

/// First present field among `names`, compared case-insensitively
fn find_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| {
        obj.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

// Servers report the database either as a string or as {"status": "..."}
fn describe_database(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(connected) => Some(if *connected { "connected" } else { "disconnected" }.to_string()),
        Value::Object(obj) => find_field(obj, &["status", "state"])
            .and_then(|v| v.as_str().map(str::to_string)),
        _ => None,
    }
}
