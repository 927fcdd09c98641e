use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub draw: DrawConfig,
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
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 允许的前端来源，为空时放行所有来源
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:5174".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawConfig {
    /// 并发冲突时整笔开奖事务的最大重试次数
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    /// 重试间隔基数（毫秒），第 n 次重试等待 n * backoff
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// 固定随机种子（仅用于预发/测试环境复现开奖结果）
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    25
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: default_max_conflict_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            rng_seed: None,
        }
    }
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)
                .with_context(|| format!("Failed to parse config file {config_path}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 数据库 URL 在无配置文件时必须提供
                let database_url = env::var("DATABASE_URL").map_err(|_| {
                    anyhow!("DATABASE_URL is not set and config file {config_path} was not found")
                })?;

                Config {
                    server: ServerConfig {
                        host: "0.0.0.0".to_string(),
                        port: 8080,
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: 10,
                    },
                    cors: CorsConfig::default(),
                    draw: DrawConfig::default(),
                }
            }
            Err(e) => {
                return Err(anyhow!("Failed to read config file {config_path}: {e}"));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(config_str: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(config_str)?)
    }

    fn apply_env_overrides(&mut self) {
        fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
            env::var(name).ok().and_then(|v| v.parse::<T>().ok())
        }

        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = get_env_parse("SERVER_PORT").or_else(|| get_env_parse("PORT")) {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(mc) = get_env_parse("DB_MAX_CONNECTIONS") {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("CORS_ALLOWED_ORIGINS") {
            self.cors.allowed_origins = parse_origin_list(&v);
        }
        if let Ok(v) = env::var("FRONTEND_URL")
            && !self.cors.allowed_origins.contains(&v)
        {
            self.cors.allowed_origins.push(v);
        }
        if let Some(n) = get_env_parse("DRAW_MAX_CONFLICT_RETRIES") {
            self.draw.max_conflict_retries = n;
        }
        if let Some(n) = get_env_parse("DRAW_RETRY_BACKOFF_MS") {
            self.draw.retry_backoff_ms = n;
        }
        if let Some(seed) = get_env_parse("DRAW_RNG_SEED") {
            self.draw.rng_seed = Some(seed);
        }
    }
}

fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 3001

            [database]
            url = "postgres://localhost/draws"
            max_connections = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3001);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.draw.max_conflict_retries, 3);
        assert_eq!(config.draw.retry_backoff_ms, 25);
        assert!(config.draw.rng_seed.is_none());
        assert_eq!(config.cors.allowed_origins.len(), 3);
    }

    #[test]
    fn test_parse_draw_section() {
        let config = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [cors]
            allowed_origins = []

            [draw]
            max_conflict_retries = 5
            rng_seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.draw.max_conflict_retries, 5);
        assert_eq!(config.draw.retry_backoff_ms, 25);
        assert_eq!(config.draw.rng_seed, Some(42));
        assert!(config.cors.allowed_origins.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_database() {
        let result = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_origin_list() {
        let origins = parse_origin_list(" http://a.test , ,http://b.test");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }
}
