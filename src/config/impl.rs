use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::{AppConfig, EnvironmentEndpoint};

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 加载配置：config.toml -> config.{APP_ENV}.toml -> TUTORHUB_* -> 显式覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            .add_source(
                Environment::with_prefix("TUTORHUB")
                    .separator("__")
                    .try_parsing(true),
            );

        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "remote_admin.environments.production.url",
                std::env::var("PRODUCTION_URL").ok(),
            )?
            .set_override_option(
                "remote_admin.environments.production.token",
                std::env::var("PRODUCTION_ADMIN_TOKEN").ok(),
            )?
            .set_override_option(
                "remote_admin.environments.sandbox.url",
                std::env::var("SANDBOX_URL").ok(),
            )?
            .set_override_option(
                "remote_admin.environments.sandbox.token",
                std::env::var("SANDBOX_ADMIN_TOKEN").ok(),
            )?
            .set_override_option(
                "remote_admin.production_token",
                std::env::var("PRODUCTION_ADMIN_TOKEN").ok(),
            )?
            .set_override_option(
                "remote_admin.sandbox_token",
                std::env::var("SANDBOX_ADMIN_TOKEN").ok(),
            )?
            .set_override_option(
                "remote_admin.admin_token",
                std::env::var("ADMIN_ADMIN_TOKEN").ok(),
            )?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers);
        }

        Ok(app_config)
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }

    /// 远程管理 API 接受的全部令牌（空值忽略）
    ///
    /// 除配置中的 production/sandbox/admin 外，还会收集 `ENV_<NAME>_TOKEN` 环境变量。
    pub fn accepted_admin_tokens(&self) -> Vec<String> {
        let ra = &self.remote_admin;
        collect_admin_tokens(
            [&ra.production_token, &ra.sandbox_token, &ra.admin_token],
            std::env::vars(),
        )
    }

    /// 按名称查找远端环境
    pub fn environment(&self, name: &str) -> Option<&EnvironmentEndpoint> {
        match name {
            "production" => Some(&self.remote_admin.environments.production),
            "sandbox" => Some(&self.remote_admin.environments.sandbox),
            _ => None,
        }
    }
}

/// 令牌两端的空白会被去掉，去掉后为空的忽略
fn collect_admin_tokens<'a>(
    configured: impl IntoIterator<Item = &'a String>,
    env: impl IntoIterator<Item = (String, String)>,
) -> Vec<String> {
    let env_tokens = env.into_iter().filter_map(|(key, value)| {
        (key.starts_with("ENV_") && key.ends_with("_TOKEN")).then_some(value)
    });

    let mut tokens: Vec<String> = configured
        .into_iter()
        .cloned()
        .chain(env_tokens)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    tokens.sort();
    tokens.dedup();
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_tokens_trimmed() {
        let configured = ["prod-token\n".to_string(), "  ".to_string(), " sandbox ".to_string()];
        let env = vec![
            ("ENV_STAGING_TOKEN".to_string(), " staging\t".to_string()),
            ("ENV_EMPTY_TOKEN".to_string(), " ".to_string()),
            ("OTHER_TOKEN".to_string(), "ignored".to_string()),
            ("ENV_DUP_TOKEN".to_string(), "sandbox".to_string()),
        ];

        assert_eq!(
            collect_admin_tokens(&configured, env),
            vec!["prod-token", "sandbox", "staging"]
        );
    }
}
