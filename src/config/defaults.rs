use super::types::{
    Config, DevelopmentConfig, Environment, FailoverConfig, KeyCacheConfig, ProductionConfig,
    TimeoutConfig, VisionConfig,
};

pub const DEFAULT_PROMPT: &str = "Answer the question by selecting the correct option(s) only . Do not include any explanations—just the option letter(s) or number(s), e.g., A, B, C, D , E  or 1, 2, 3, 4 , 5  ";

impl Default for DevelopmentConfig {
    fn default() -> Self {
        Self {
            ports: vec![3000, 3001, 3002, 3003, 3004],
            hostname: "localhost".to_string(),
            protocol: "http".to_string(),
        }
    }
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            urls: vec![
                "https://kimaaka-server-1.onrender.com".to_string(),
                "https://kimaaka-server-2.onrender.com".to_string(),
                "https://kimaaka-server-3.onrender.com".to_string(),
                "https://kimaaka-server-4.onrender.com".to_string(),
                "https://kimaaka-server-5.onrender.com".to_string(),
                "https://kimaaka-server-6.onrender.com".to_string(),
            ],
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            sticky_probe_ms: 2000,
            scan_probe_ms: 5000,
            key_fetch_ms: 10_000,
            admin_stats_ms: 10_000,
            vision_ms: 60_000,
        }
    }
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            quarantine_reset_secs: 5 * 60,
            last_server_retry_delay_ms: 2000,
            health_path: "/api/health".to_string(),
            fallback_health_path: Some("/health".to_string()),
            key_path: "/api/gemini-key".to_string(),
            admin_stats_path: "/api/admin/stats".to_string(),
        }
    }
}

impl Default for KeyCacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 2 * 60 * 60 }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            mime_type: "image/png".to_string(),
            temperature: 0.4,
            top_k: 32,
            top_p: 1.0,
            max_output_tokens: 4096,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            development: DevelopmentConfig::default(),
            production: ProductionConfig::default(),
            timeouts: TimeoutConfig::default(),
            failover: FailoverConfig::default(),
            key_cache: KeyCacheConfig::default(),
            vision: VisionConfig::default(),
            storage_path: None,
        }
    }
}
