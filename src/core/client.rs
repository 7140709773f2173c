//! Client facade wiring the failover core, admin layer and vision pipeline
//!
//! UI triggers (shortcut, popup, admin page) call straight into these async
//! methods; there is no message-passing layer in between.

use crate::config::Config;
use crate::core::admin::{AdminAggregator, AdminSession, AggregatedStats, ServerStatus};
use crate::core::failover::{
    DonationLocator, DonationServer, FailoverContext, FailoverSelector, HealthProbe,
    HealthProbeOptions, KeyCache, KeyLease, KeyService, OperationRunner, ServerRegistry,
};
use crate::core::network::clock::{ClockTrait, SystemClock};
use crate::core::network::http_client::{default_http_client, HttpClientTrait};
use crate::core::network::storage::LocalStore;
use crate::core::network::types::{ClientError, SelectionPolicy};
use crate::core::vision::{AnalysisService, VisionClient};
use std::sync::Arc;

pub struct KimaakaClient {
    config: Config,
    context: Arc<FailoverContext>,
    selector: Arc<FailoverSelector>,
    runner: Arc<OperationRunner>,
    keys: Arc<KeyService>,
    donation: DonationLocator,
    aggregator: AdminAggregator,
    session: AdminSession,
    analysis: AnalysisService,
}

impl KimaakaClient {
    /// Production wiring: isahc client, file store, system clock
    pub async fn new(config: Config) -> Result<Self, ClientError> {
        let client = default_http_client()?;
        let store = Arc::new(LocalStore::new(config.storage_path.clone())?);
        Self::with_dependencies(config, client, store, Arc::new(SystemClock)).await
    }

    pub async fn with_dependencies(
        config: Config,
        client: Arc<dyn HttpClientTrait>,
        store: Arc<LocalStore>,
        clock: Arc<dyn ClockTrait>,
    ) -> Result<Self, ClientError> {
        let registry = ServerRegistry::from_config(&config)?;

        let context = Arc::new(
            FailoverContext::new(
                registry.clone(),
                store.clone(),
                clock.clone(),
                config.failover.quarantine_reset_secs,
            )
            .await,
        );

        let probe_options = HealthProbeOptions {
            health_path: config.failover.health_path.clone(),
            fallback_path: config.failover.fallback_health_path.clone(),
            require_healthy_status: false,
        };
        let strict_options = HealthProbeOptions {
            require_healthy_status: true,
            ..probe_options.clone()
        };
        let probe = Arc::new(HealthProbe::new(client.clone(), probe_options));
        let strict_probe = Arc::new(HealthProbe::new(client.clone(), strict_options));

        let selector = Arc::new(FailoverSelector::new(
            context.clone(),
            probe.clone(),
            config.timeouts.sticky_probe_ms,
            config.timeouts.scan_probe_ms,
        ));
        let runner = Arc::new(OperationRunner::new(
            selector.clone(),
            config.failover.last_server_retry_delay_ms,
        ));

        let cache = KeyCache::new(store.clone(), clock.clone(), config.key_cache.ttl_secs);
        let keys = Arc::new(KeyService::new(
            runner.clone(),
            client.clone(),
            cache,
            config.failover.key_path.clone(),
            config.timeouts.key_fetch_ms,
        ));

        let donation = DonationLocator::new(runner.clone(), strict_probe, config.timeouts.scan_probe_ms);
        let aggregator = AdminAggregator::new(
            registry,
            client.clone(),
            probe,
            config.failover.admin_stats_path.clone(),
            config.timeouts.admin_stats_ms,
            config.timeouts.scan_probe_ms,
        );
        let session = AdminSession::new(store, context.clone());

        let vision = Arc::new(VisionClient::new(
            client,
            config.vision.clone(),
            config.timeouts.vision_ms,
        ));
        let analysis = AnalysisService::new(keys.clone(), vision);

        Ok(Self {
            config,
            context,
            selector,
            runner,
            keys,
            donation,
            aggregator,
            session,
            analysis,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &Arc<FailoverContext> {
        &self.context
    }

    pub fn runner(&self) -> &Arc<OperationRunner> {
        &self.runner
    }

    pub fn session(&self) -> &AdminSession {
        &self.session
    }

    pub fn candidates(&self) -> &[String] {
        self.context.registry().list_candidates()
    }

    pub async fn resolve_server(&self, policy: SelectionPolicy) -> Result<String, ClientError> {
        self.selector.resolve(policy).await
    }

    pub async fn get_cached_api_key(&self) -> Result<KeyLease, ClientError> {
        self.keys.get_cached_api_key().await
    }

    pub async fn refresh_api_key(&self) -> Result<KeyLease, ClientError> {
        self.keys.refresh().await
    }

    /// Analyze PNG bytes; failures read as an empty answer
    pub async fn analyze(&self, png: &[u8]) -> String {
        self.analysis.analyze(png).await
    }

    pub async fn analyze_strict(&self, png: &[u8]) -> Result<String, ClientError> {
        self.analysis.analyze_strict(png).await
    }

    pub async fn donation_server(&self) -> Result<DonationServer, ClientError> {
        self.donation.locate().await
    }

    /// Aggregate stats using `token`, or the saved session token
    pub async fn admin_stats(&self, token: Option<&str>) -> Result<AggregatedStats, ClientError> {
        let token = match token {
            Some(token) => token.to_string(),
            None => self.session.token().await?,
        };
        self.aggregator.collect(&token).await
    }

    pub async fn check_all_servers(&self) -> Vec<ServerStatus> {
        self.aggregator.check_all_servers().await
    }

    pub async fn online_server_count(&self) -> usize {
        self.aggregator.online_server_count().await
    }

    /// Clear sticky server and quarantine
    pub async fn reset(&self) {
        self.context.reset().await;
    }
}
