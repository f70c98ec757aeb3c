use std::env;

/// S3-compatible object store settings.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub secure: bool,
}

impl ObjectStoreConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: required_env("OBJECT_STORE_ENDPOINT"),
            access_key: required_env("OBJECT_STORE_ACCESS_KEY"),
            secret_key: required_env("OBJECT_STORE_SECRET_KEY"),
            bucket: env::var("OBJECT_STORE_BUCKET").unwrap_or_else(|_| "esg-reports".to_string()),
            secure: env::var("OBJECT_STORE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Message broker (AMQP) settings.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub heartbeat_secs: u16,
}

impl BrokerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("BROKER_HOST").unwrap_or_else(|_| "rabbitmq".to_string()),
            port: parsed_env("BROKER_PORT", 5672),
            user: required_env("BROKER_USER"),
            password: required_env("BROKER_PASSWORD"),
            heartbeat_secs: parsed_env("BROKER_HEARTBEAT", 60),
        }
    }

    /// AMQP connection URI with credentials embedded.
    pub fn amqp_uri(&self) -> String {
        format!(
            "amqp://{}:{}@{}:{}/%2f?heartbeat={}",
            self.user, self.password, self.host, self.port, self.heartbeat_secs
        )
    }
}

/// Relational store settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            host: required_env("DB_HOST"),
            port: parsed_env("DB_PORT", 5432),
            name: required_env("DB_NAME"),
            user: required_env("DB_USER"),
            password: required_env("DB_PASSWORD"),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

/// Remote model settings: embedding + generative capability.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub embed_model: String,
    pub embed_dimensions: usize,
    pub embed_api_key: String,
    pub gen_model: String,
    pub gen_temperature: f32,
    pub gen_api_key: String,
}

impl ModelConfig {
    pub fn from_env() -> Self {
        Self {
            embed_model: env::var("EMBED_MODEL_NAME")
                .unwrap_or_else(|_| "gemini-embedding-001".to_string()),
            embed_dimensions: parsed_env("EMBED_DIMENSIONS", 3072),
            embed_api_key: required_env("EMBED_API_KEY"),
            gen_model: env::var("GEN_MODEL_NAME")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            gen_temperature: parsed_env("GEN_TEMPERATURE", 0.1),
            gen_api_key: required_env("GEN_API_KEY"),
        }
    }
}

/// Tunables for the chunking / embedding / extraction / scoring path.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub extract_top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embed_batch_size: usize,
    pub scoring_min_confidence: f64,
    pub use_ocr: bool,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self {
            extract_top_k: parsed_env("EXTRACT_TOP_K", 10),
            chunk_size: parsed_env("CHUNK_SIZE", 1000),
            chunk_overlap: parsed_env("CHUNK_OVERLAP", 200),
            embed_batch_size: parsed_env("EMBED_BATCH_SIZE", 32),
            scoring_min_confidence: parsed_env("SCORING_MIN_CONFIDENCE", 0.3),
            use_ocr: env::var("USE_OCR").map(|v| v == "true" || v == "1").unwrap_or(false),
        }
    }
}

/// Optional external key-value cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    pub db: u8,
    pub enabled: bool,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("CACHE_HOST").unwrap_or_else(|_| "redis".to_string()),
            port: parsed_env("CACHE_PORT", 6379),
            db: parsed_env("CACHE_DB", 0),
            enabled: env::var("CACHE_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// API auth settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub rate_limit_rps: u32,
    pub rate_limit_burst: u32,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: required_env("AUTH_JWT_SECRET"),
            token_ttl_secs: parsed_env("AUTH_TOKEN_TTL", 24 * 3600),
            rate_limit_rps: parsed_env("AUTH_RATE_LIMIT_RPS", 10),
            rate_limit_burst: parsed_env("AUTH_RATE_LIMIT_BURST", 0),
        }
    }
}

/// Remote headless-browser rendering service.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub endpoint: String,
    pub token: Option<String>,
}

impl BrowserConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: required_env("BROWSER_ENDPOINT"),
            token: env::var("BROWSER_TOKEN").ok(),
        }
    }
}

// --- Per-service aggregates ---

/// Config for the catalog synchronizer job.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub database: DatabaseConfig,
    pub feed_url: String,
}

impl CatalogConfig {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            feed_url: env::var("CATALOG_FEED_URL").unwrap_or_else(|_| {
                "https://www.niftyindices.com/IndexConstituent/ind_nifty50list.csv".to_string()
            }),
        }
    }
}

/// Config for the filings ingestion worker.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub database: DatabaseConfig,
    pub object_store: ObjectStoreConfig,
    pub broker: BrokerConfig,
    pub browser: BrowserConfig,
}

impl IngestConfig {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            object_store: ObjectStoreConfig::from_env(),
            broker: BrokerConfig::from_env(),
            browser: BrowserConfig::from_env(),
        }
    }
}

/// Config for the embeddings worker.
#[derive(Debug, Clone)]
pub struct EmbeddingsConfig {
    pub database: DatabaseConfig,
    pub object_store: ObjectStoreConfig,
    pub broker: BrokerConfig,
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
}

impl EmbeddingsConfig {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            object_store: ObjectStoreConfig::from_env(),
            broker: BrokerConfig::from_env(),
            model: ModelConfig::from_env(),
            pipeline: PipelineConfig::from_env(),
        }
    }
}

/// Config for the extraction worker.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub database: DatabaseConfig,
    pub broker: BrokerConfig,
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
    pub monitor_port: u16,
}

impl ExtractionConfig {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            broker: BrokerConfig::from_env(),
            model: ModelConfig::from_env(),
            pipeline: PipelineConfig::from_env(),
            monitor_port: parsed_env("MONITOR_PORT", 8080),
        }
    }
}

/// Config for the telemetry scheduler / scraper / sink.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub database: DatabaseConfig,
    pub broker: BrokerConfig,
    pub browser: BrowserConfig,
    pub mongo_uri: String,
    pub mongo_db: String,
    pub schedule_interval_secs: u64,
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            broker: BrokerConfig::from_env(),
            browser: BrowserConfig::from_env(),
            mongo_uri: required_env("MONGO_URI"),
            mongo_db: env::var("MONGO_DB").unwrap_or_else(|_| "esg_data".to_string()),
            schedule_interval_secs: parsed_env("SCHEDULE_INTERVAL_SECS", 300),
        }
    }

    /// Sink-only variant: no Postgres or browser needed.
    pub fn sink_from_env() -> Self {
        Self {
            database: DatabaseConfig {
                host: String::new(),
                port: 0,
                name: String::new(),
                user: String::new(),
                password: String::new(),
            },
            broker: BrokerConfig::from_env(),
            browser: BrowserConfig {
                endpoint: String::new(),
                token: None,
            },
            mongo_uri: required_env("MONGO_URI"),
            mongo_db: env::var("MONGO_DB").unwrap_or_else(|_| "esg_data".to_string()),
            schedule_interval_secs: parsed_env("SCHEDULE_INTERVAL_SECS", 300),
        }
    }
}

/// Config for the query API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database: DatabaseConfig,
    pub broker: BrokerConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub mongo_uri: String,
    pub mongo_db: String,
    pub host: String,
    pub port: u16,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            broker: BrokerConfig::from_env(),
            cache: CacheConfig::from_env(),
            auth: AuthConfig::from_env(),
            mongo_uri: env::var("MONGO_URI").unwrap_or_default(),
            mongo_db: env::var("MONGO_DB").unwrap_or_else(|_| "esg_data".to_string()),
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed_env("API_PORT", 8000),
        }
    }
}

impl ModelConfig {
    /// Log key presence without leaking values.
    pub fn log_redacted(&self) {
        for (name, value) in [
            ("EMBED_API_KEY", &self.embed_api_key),
            ("GEN_API_KEY", &self.gen_api_key),
        ] {
            if value.is_empty() {
                tracing::info!("{name} = (empty)");
            } else {
                tracing::info!("{name} = ({} chars)", value.len());
            }
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_renders() {
        let cfg = DatabaseConfig {
            host: "db".into(),
            port: 5432,
            name: "esg".into(),
            user: "app".into(),
            password: "secret".into(),
        };
        assert_eq!(cfg.url(), "postgres://app:secret@db:5432/esg");
    }

    #[test]
    fn amqp_uri_carries_heartbeat() {
        let cfg = BrokerConfig {
            host: "mq".into(),
            port: 5672,
            user: "guest".into(),
            password: "guest".into(),
            heartbeat_secs: 60,
        };
        assert_eq!(cfg.amqp_uri(), "amqp://guest:guest@mq:5672/%2f?heartbeat=60");
    }
}
