use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub cache_ttl: CacheTtlConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Thresholds driving pattern analysis and anomaly detection.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Minimum finalized invoices before a pattern is computed at all.
    #[serde(default = "default_min_invoices")]
    pub min_invoices_for_pattern: u32,
    /// Anomaly threshold, in standard deviations from the pattern mean.
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_std_dev_threshold: f64,
    /// Dead zone (percent) around "stable" for trend classification.
    #[serde(default = "default_trend_band")]
    pub trend_band_pct: f64,
    /// Coefficient-of-variation cutoff (percent) for seasonality.
    #[serde(default = "default_seasonality_cv")]
    pub seasonality_cv_threshold: f64,
    /// Trailing window for price observations, in days.
    #[serde(default = "default_price_window")]
    pub price_window_days: i64,
    /// Trailing window scanned for consolidation opportunities, in days.
    #[serde(default = "default_consolidation_window")]
    pub consolidation_window_days: i64,
    /// Days over which the recency confidence factor decays to zero.
    #[serde(default = "default_recency_horizon")]
    pub recency_horizon_days: i64,
    /// Activity window used by the background refresh job, in days.
    #[serde(default = "default_active_window")]
    pub active_window_days: i64,
}

fn default_min_invoices() -> u32 {
    5
}
fn default_anomaly_threshold() -> f64 {
    2.0
}
fn default_trend_band() -> f64 {
    10.0
}
fn default_seasonality_cv() -> f64 {
    20.0
}
fn default_price_window() -> i64 {
    30
}
fn default_consolidation_window() -> i64 {
    90
}
fn default_recency_horizon() -> i64 {
    180
}
fn default_active_window() -> i64 {
    365
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_invoices_for_pattern: default_min_invoices(),
            anomaly_std_dev_threshold: default_anomaly_threshold(),
            trend_band_pct: default_trend_band(),
            seasonality_cv_threshold: default_seasonality_cv(),
            price_window_days: default_price_window(),
            consolidation_window_days: default_consolidation_window(),
            recency_horizon_days: default_recency_horizon(),
            active_window_days: default_active_window(),
        }
    }
}

/// Per-data-category cache TTLs, in seconds.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheTtlConfig {
    #[serde(default = "default_pattern_ttl")]
    pub pattern_secs: u64,
    #[serde(default = "default_anomaly_ttl")]
    pub anomaly_secs: u64,
    #[serde(default = "default_price_ttl")]
    pub price_secs: u64,
    #[serde(default = "default_spend_ttl")]
    pub spend_secs: u64,
    #[serde(default = "default_consolidation_ttl")]
    pub consolidation_secs: u64,
}

fn default_pattern_ttl() -> u64 {
    3600
}
fn default_anomaly_ttl() -> u64 {
    1800
}
fn default_price_ttl() -> u64 {
    900
}
fn default_spend_ttl() -> u64 {
    900
}
fn default_consolidation_ttl() -> u64 {
    3600
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            pattern_secs: default_pattern_ttl(),
            anomaly_secs: default_anomaly_ttl(),
            price_secs: default_price_ttl(),
            spend_secs: default_spend_ttl(),
            consolidation_secs: default_consolidation_ttl(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JobsConfig {
    #[serde(default = "default_pattern_refresh")]
    pub pattern_refresh_interval_secs: u64,
    #[serde(default = "default_consolidation_refresh")]
    pub consolidation_refresh_interval_secs: u64,
}

fn default_pattern_refresh() -> u64 {
    21600
}
fn default_consolidation_refresh() -> u64 {
    86400
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            pattern_refresh_interval_secs: default_pattern_refresh(),
            consolidation_refresh_interval_secs: default_consolidation_refresh(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("PROCSIGHT").separator("__"))
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        Ok(app_config)
    }
}
