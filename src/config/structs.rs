use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub argon2: Argon2Config,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub cors: CorsConfig,
    pub schedule: ScheduleConfig,
    pub calendar: CalendarConfig,
    pub remote_admin: RemoteAdminConfig,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub system_name: String,
    pub environment: String,
    pub log_level: String,
    /// 首次启动时创建的管理员账号
    #[serde(default)]
    pub bootstrap_admin: BootstrapAdminConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub unix_socket_path: String,
    pub workers: usize,
    pub max_workers: usize,
    pub timeouts: TimeoutConfig,
    pub limits: LimitConfig,
}

/// 超时配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub client_request: u64,
    pub client_disconnect: u64,
    pub keep_alive: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    pub max_payload_size: usize,
}

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(skip_serializing, default)]
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

/// Argon2 参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,    // 连接 URL（scheme 决定后端）
    pub pool_size: u32, // 连接池大小
    pub timeout: u64,   // 连接超时 (秒)
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    pub cache_type: String,
    pub default_ttl: u64,
    pub redis: RedisConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub key_prefix: String,
    pub pool_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub max_capacity: u64,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub max_age: usize,
}

/// 课表配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 默认展示时区：moscow / tomsk
    pub default_timezone: String,
    /// 循环课程最多生成的周数
    pub max_repeat_count: u32,
}

/// 日历订阅配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub past_days: i64,
    pub future_days: i64,
    pub product_id: String,
}

/// 远程管理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAdminConfig {
    /// 本实例接受的 X-Admin-Token
    #[serde(skip_serializing, default)]
    pub production_token: String,
    #[serde(skip_serializing, default)]
    pub sandbox_token: String,
    #[serde(skip_serializing, default)]
    pub admin_token: String,
    /// 出站请求超时 (秒)
    pub request_timeout: u64,
    pub environments: EnvironmentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentsConfig {
    pub production: EnvironmentEndpoint,
    pub sandbox: EnvironmentEndpoint,
}

/// 远端实例地址与令牌
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentEndpoint {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing, default)]
    pub token: String,
}

impl EnvironmentEndpoint {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.token.trim().is_empty()
    }
}
