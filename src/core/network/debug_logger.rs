use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::Local;
use flate2::{write::GzEncoder, Compression};
use fs2::FileExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::network::types::{get_local_timestamp, parse_env_bool};

const LOG_ROTATION_SIZE_MB: u64 = 8;
const MAX_ARCHIVES: usize = 5;
const ROTATION_CHECK_INTERVAL: u32 = 200;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LogEntry {
    timestamp: String,                  // ISO-8601 with timezone
    level: String,                      // DEBUG, ERROR, PERF, FAILOVER, KEY, ADMIN, VISION
    component: String,
    event: String,
    message: String,                    // redacted
    correlation_id: Option<String>,
    fields: HashMap<String, Value>,
}

struct RotatingLogger {
    log_path: PathBuf,
    write_count: AtomicU32,
}

impl RotatingLogger {
    fn new(log_path: PathBuf) -> Self {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        Self {
            log_path,
            write_count: AtomicU32::new(0),
        }
    }

    fn append(&self, json_line: &str) -> std::io::Result<()> {
        if self.write_count.fetch_add(1, Ordering::Relaxed) % ROTATION_CHECK_INTERVAL == 0 {
            let _ = self.rotate_if_needed();
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", json_line)
    }

    fn oversized(&self) -> bool {
        std::fs::metadata(&self.log_path)
            .map(|m| m.len() >= LOG_ROTATION_SIZE_MB * 1024 * 1024)
            .unwrap_or(false)
    }

    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.oversized() {
            return Ok(());
        }

        // Another process may be rotating the same file
        let lock_path = self.log_path.with_extension("lock");
        let lock_file = OpenOptions::new().create(true).write(true).open(&lock_path)?;
        if lock_file.try_lock_exclusive().is_err() {
            return Ok(());
        }

        let result = if self.oversized() { self.archive() } else { Ok(()) };
        let _ = std::fs::remove_file(&lock_path);
        result
    }

    fn stem_and_dir(&self) -> Option<(String, &Path)> {
        let stem = self.log_path.file_stem()?.to_str()?.to_string();
        let dir = self.log_path.parent()?;
        Some((stem, dir))
    }

    fn archive(&self) -> std::io::Result<()> {
        let Some((stem, dir)) = self.stem_and_dir() else {
            return Ok(());
        };
        let archive_path = dir.join(format!("{}.{}.gz", stem, Local::now().format("%Y%m%d_%H%M%S")));

        let rotating_path = self.log_path.with_extension("rotating");
        std::fs::rename(&self.log_path, &rotating_path)?;

        let mut encoder = GzEncoder::new(File::create(&archive_path)?, Compression::default());
        std::io::copy(&mut BufReader::new(File::open(&rotating_path)?), &mut encoder)?;
        encoder.finish()?;
        std::fs::remove_file(&rotating_path)?;

        let _ = prune_archives(dir, &stem);
        Ok(())
    }
}

fn prune_archives(dir: &Path, stem: &str) -> std::io::Result<()> {
    let prefix = format!("{}.", stem);
    let mut archives = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&prefix) && name.ends_with(".gz") {
            archives.push((entry.path(), entry.metadata()?.modified()?));
        }
    }
    archives.sort_by_key(|(_, modified)| *modified);
    let excess = archives.len().saturating_sub(MAX_ARCHIVES);
    for (path, _) in archives.iter().take(excess) {
        let _ = std::fs::remove_file(path);
    }
    Ok(())
}

/// JSON Lines debug logger for the failover client
///
/// Disabled unless `KIMAAKA_DEBUG` is set. Messages go through redaction
/// before they are written: bearer tokens, passwords and API keys (including
/// the `key=` query parameter of the vision endpoint) never reach the file.
pub struct EnhancedDebugLogger {
    enabled: bool,
    rotating_logger: Option<Arc<Mutex<RotatingLogger>>>,
    session_id: String,
    redaction_patterns: Vec<Regex>,
}

impl Default for EnhancedDebugLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl EnhancedDebugLogger {
    pub fn new() -> Self {
        let enabled = parse_env_bool("KIMAAKA_DEBUG");
        let session_id = Uuid::new_v4().to_string()[..8].to_string();
        let rotating_logger = if enabled {
            Some(Arc::new(Mutex::new(RotatingLogger::new(Self::get_log_path()))))
        } else {
            None
        };

        Self {
            enabled,
            rotating_logger,
            session_id,
            redaction_patterns: Self::compile_redaction_patterns(),
        }
    }

    fn get_log_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".kimaaka")
            .join("kimaaka-debug.log")
    }

    fn compile_redaction_patterns() -> Vec<Regex> {
        [
            r"(?i)authorization[:\s]+(bearer\s+)?[^\s\n]+",
            r"(?i)bearer[:\s]+[^\s\n]+",
            r"(?i)token[:\s]+[^\s\n]+",
            r"(?i)password[:\s]+[^\s\n]+",
            r"(?i)api[_-]?key[:\s]+[^\s\n]+",
            r"(?i)secret[:\s]+[^\s\n]+",
            r"([?&])key=[^&\s]+",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    }

    pub fn redact_sensitive_data(&self, text: &str) -> String {
        let mut redacted = text.to_string();
        for regex in &self.redaction_patterns {
            redacted = regex.replace_all(&redacted, "[REDACTED]").to_string();
        }

        // Bare long tokens
        if redacted.len() > 100
            && !redacted.contains(' ')
            && redacted.chars().all(|c| c.is_ascii_alphanumeric() || "-_".contains(c))
        {
            redacted = format!("[REDACTED_LONG_STRING_{}chars]", redacted.len());
        }
        redacted
    }

    fn log_sync(
        &self,
        level: &str,
        component: &str,
        event: &str,
        message: &str,
        correlation_id: Option<String>,
        fields: HashMap<String, Value>,
    ) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            timestamp: get_local_timestamp(),
            level: level.to_string(),
            component: component.to_string(),
            event: event.to_string(),
            message: self.redact_sensitive_data(message),
            correlation_id: correlation_id.or_else(|| Some(self.session_id.clone())),
            fields,
        };

        if let Some(logger) = &self.rotating_logger {
            if let (Ok(logger), Ok(line)) = (logger.lock(), serde_json::to_string(&entry)) {
                let _ = logger.append(&line);
            }
        }
    }

    pub fn debug_sync(&self, component: &str, event: &str, message: &str) {
        self.log_sync("DEBUG", component, event, message, None, HashMap::new());
    }

    pub fn error_sync(&self, component: &str, event: &str, message: &str) {
        self.log_sync("ERROR", component, event, message, None, HashMap::new());
    }

    pub fn performance_sync(&self, component: &str, operation: &str, duration_ms: u64) {
        let mut fields = HashMap::new();
        fields.insert("duration_ms".to_string(), Value::from(duration_ms));
        self.log_sync("PERF", component, "operation_complete", operation, None, fields);
    }

    // Failover events

    pub fn server_probe_start(&self, base_url: &str, timeout_ms: u32, correlation_id: String) {
        let mut fields = HashMap::new();
        fields.insert("server".to_string(), Value::from(base_url));
        fields.insert("timeout_ms".to_string(), Value::from(timeout_ms));
        self.log_sync(
            "FAILOVER",
            "HealthProbe",
            "probe_start",
            &format!("Probing {} ({}ms)", base_url, timeout_ms),
            Some(correlation_id),
            fields,
        );
    }

    pub fn server_probe_end(
        &self,
        base_url: &str,
        healthy: bool,
        http_status: Option<u16>,
        duration_ms: u64,
        correlation_id: String,
    ) {
        let mut fields = HashMap::new();
        fields.insert("server".to_string(), Value::from(base_url));
        fields.insert("healthy".to_string(), Value::from(healthy));
        fields.insert("duration_ms".to_string(), Value::from(duration_ms));
        if let Some(code) = http_status {
            fields.insert("http_status".to_string(), Value::from(code));
        }
        self.log_sync(
            "FAILOVER",
            "HealthProbe",
            "probe_end",
            &format!(
                "{} is {} ({}ms)",
                base_url,
                if healthy { "healthy" } else { "unhealthy" },
                duration_ms
            ),
            Some(correlation_id),
            fields,
        );
    }

    pub fn server_quarantined(&self, base_url: &str, quarantined: usize, total: usize) {
        let mut fields = HashMap::new();
        fields.insert("server".to_string(), Value::from(base_url));
        fields.insert("quarantined".to_string(), Value::from(quarantined));
        fields.insert("total".to_string(), Value::from(total));
        self.log_sync(
            "FAILOVER",
            "QuarantineSet",
            "server_quarantined",
            &format!("Marked server as failed: {} ({}/{})", base_url, quarantined, total),
            None,
            fields,
        );
    }

    pub fn quarantine_reset(&self, reason: &str, cleared: usize) {
        let mut fields = HashMap::new();
        fields.insert("reason".to_string(), Value::from(reason));
        fields.insert("cleared".to_string(), Value::from(cleared));
        self.log_sync(
            "FAILOVER",
            "QuarantineSet",
            "quarantine_reset",
            &format!("Quarantine cleared ({}): {} server(s) eligible again", reason, cleared),
            None,
            fields,
        );
    }

    pub fn sticky_changed(&self, base_url: Option<&str>) {
        let mut fields = HashMap::new();
        fields.insert(
            "server".to_string(),
            base_url.map(Value::from).unwrap_or(Value::Null),
        );
        let message = match base_url {
            Some(url) => format!("Sticky server set to {}", url),
            None => "Sticky server cleared".to_string(),
        };
        self.log_sync("FAILOVER", "FailoverContext", "sticky_changed", &message, None, fields);
    }

    pub fn operation_attempt(&self, attempt: usize, max_attempts: usize, base_url: &str, outcome: &str) {
        let mut fields = HashMap::new();
        fields.insert("attempt".to_string(), Value::from(attempt));
        fields.insert("max_attempts".to_string(), Value::from(max_attempts));
        fields.insert("server".to_string(), Value::from(base_url));
        fields.insert("outcome".to_string(), Value::from(outcome));
        self.log_sync(
            "FAILOVER",
            "OperationRunner",
            "operation_attempt",
            &format!("Attempt {}/{} on {}: {}", attempt, max_attempts, base_url, outcome),
            None,
            fields,
        );
    }

    // Key cache events

    pub fn key_cache_event(&self, event: &str, age_ms: Option<i64>) {
        let mut fields = HashMap::new();
        if let Some(age) = age_ms {
            fields.insert("age_ms".to_string(), Value::from(age));
        }
        self.log_sync("KEY", "KeyCache", event, &format!("Key cache {}", event), None, fields);
    }

    // Admin events

    pub fn aggregation_summary(&self, responders: usize, unauthorized: usize, failed: usize) {
        let mut fields = HashMap::new();
        fields.insert("responders".to_string(), Value::from(responders));
        fields.insert("unauthorized".to_string(), Value::from(unauthorized));
        fields.insert("failed".to_string(), Value::from(failed));
        self.log_sync(
            "ADMIN",
            "AdminAggregator",
            "aggregation_complete",
            &format!(
                "Stats aggregated from {} server(s); {} unauthorized, {} failed",
                responders, unauthorized, failed
            ),
            None,
            fields,
        );
    }

    pub fn vision_outcome(&self, model: &str, outcome: &str, duration_ms: u64) {
        let mut fields = HashMap::new();
        fields.insert("model".to_string(), Value::from(model));
        fields.insert("outcome".to_string(), Value::from(outcome));
        fields.insert("duration_ms".to_string(), Value::from(duration_ms));
        self.log_sync(
            "VISION",
            "VisionClient",
            "generate_complete",
            &format!("{} responded: {} ({}ms)", model, outcome, duration_ms),
            None,
            fields,
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get_session_id(&self) -> &str {
        &self.session_id
    }
}

static DEBUG_LOGGER: OnceLock<EnhancedDebugLogger> = OnceLock::new();

/// Process-wide logger, configured from the environment on first use
pub fn get_debug_logger() -> &'static EnhancedDebugLogger {
    DEBUG_LOGGER.get_or_init(EnhancedDebugLogger::new)
}
