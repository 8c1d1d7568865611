use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// 报表抬头的兜底值 (公司设置缺失时使用)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub default_company_name: String,
    pub default_currency_symbol: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/seller_billing".to_string(),
                max_connections: 20,
                acquire_timeout_secs: 10,
            },
            report: ReportConfig {
                default_company_name: "My Company".to_string(),
                default_currency_symbol: "₹".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 默认值 + `BILLING__*` 环境变量 (如 `BILLING__SERVER__PORT=9000`)
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("database.url", defaults.database.url)?
            .set_default(
                "database.max_connections",
                i64::from(defaults.database.max_connections),
            )?
            .set_default(
                "database.acquire_timeout_secs",
                defaults.database.acquire_timeout_secs as i64,
            )?
            .set_default("report.default_company_name", defaults.report.default_company_name)?
            .set_default(
                "report.default_currency_symbol",
                defaults.report.default_currency_symbol,
            )?
            .add_source(
                config::Environment::with_prefix("BILLING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 从环境变量加载配置; `SERVER_HOST` / `SERVER_PORT` / `DATABASE_URL` 优先
    pub fn from_env() -> Self {
        let mut cfg = Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load layered config, using defaults: {}", e);
            Self::default()
        });
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse().ok()) {
            cfg.server.port = port;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            cfg.database.url = url;
        }
        cfg
    }
}
