use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-server stats with field-name variants folded together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedStats {
    pub total_api_keys: u64,
    pub active_api_keys: u64,
    pub donated_api_keys: u64,
    pub total_allocations: u64,
    pub total_api_calls: u64,
    pub total_successful_requests: u64,
    pub average_response_time: f64,
    pub admin_keys_count: u64,
    pub donated_keys_count: u64,
}

/// Normalize a raw stats object
///
/// Each field takes the first alternate spelling with a non-zero numeric
/// value. Non-numbers and negatives count as zero.
pub fn normalize_stats(raw: &Value) -> NormalizedStats {
    NormalizedStats {
        total_api_keys: count(raw, &["totalApiKeys", "apiKeysCount", "totalKeys"]),
        active_api_keys: count(raw, &["activeApiKeys", "activeKeys"]),
        donated_api_keys: count(raw, &["donatedApiKeys", "donatedKeys"]),
        total_allocations: count(raw, &["totalAllocations", "allocations", "userAllocations"]),
        total_api_calls: count(raw, &["totalApiCalls", "apiCalls", "requests"]),
        total_successful_requests: count(
            raw,
            &["totalSuccessfulRequests", "successfulRequests", "successfulCalls"],
        ),
        average_response_time: number(raw, &["averageResponseTime", "avgResponseTime", "responseTime"]),
        admin_keys_count: count(raw, &["adminKeysCount", "adminKeys"]),
        donated_keys_count: count(raw, &["donatedKeysCount", "donatedKeys"]),
    }
}

fn number(raw: &Value, names: &[&str]) -> f64 {
    names
        .iter()
        .filter_map(|name| raw.get(*name))
        .filter_map(as_number)
        .find(|v| *v > 0.0)
        .unwrap_or(0.0)
}

fn count(raw: &Value, names: &[&str]) -> u64 {
    number(raw, names).round() as u64
}

// Some servers send counts as strings
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
