use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
    #[serde(default)]
    pub payos: PayosConfig,
    #[serde(default)]
    pub contracts: ContractConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// Platform cut, percent of the pricing subtotal.
    pub platform_fee_pct: f64,
    /// How long a host-accepted booking waits for payment before expiring.
    pub default_expiry_minutes: i64,
    /// Check-in hour anchoring the cancellation-tier day count.
    pub checkin_hour: u32,
    /// Local-time offset from UTC, in hours (VN deployments use +7).
    pub utc_offset_hours: i32,
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PayosConfig {
    pub client_id: Option<String>,
    pub api_key: Option<String>,
    pub checksum_key: Option<String>,
    #[serde(default = "default_payos_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub enabled: bool,
}

fn default_payos_api_base() -> String {
    "https://api-merchant.payos.vn".to_string()
}

/// Object storage location for executed contract PDFs.
#[derive(Debug, Deserialize, Clone)]
pub struct ContractConfig {
    pub bucket: String,
    pub region: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            bucket: "stayhub-contracts".to_string(),
            region: "ap-southeast-1".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.max_connections", 10)?
            .set_default("booking.platform_fee_pct", 5.0)?
            .set_default("booking.default_expiry_minutes", 60)?
            .set_default("booking.checkin_hour", 14)?
            .set_default("booking.utc_offset_hours", 7)?
            .set_default("booking.currency", "VND")?
            .set_default("payos.enabled", false)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (with STAYHUB__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("STAYHUB").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://stayhub.db".to_string(),
                max_connections: 10,
            },
            booking: BookingConfig::default(),
            payos: PayosConfig::default(),
            contracts: ContractConfig::default(),
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            platform_fee_pct: 5.0,
            default_expiry_minutes: 60,
            checkin_hour: 14,
            utc_offset_hours: 7,
            currency: "VND".to_string(),
        }
    }
}
