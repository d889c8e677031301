use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::services::{audit, maintenance, permissions};
use crate::storage::Storage;
use crate::utils::password::{generate_random_password, hash_password};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

async fn try_cache_backend(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let Some(constructor) = get_object_cache_plugin(name) else {
        warn!("Cache backend '{}' not found in registry", name);
        return None;
    };
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到 moka
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    if let Some(cache) = try_cache_backend(cache_type).await {
        return Ok(cache);
    }
    if cache_type != "moka" {
        warn!("Falling back to in-memory cache");
        if let Some(cache) = try_cache_backend("moka").await {
            return Ok(cache);
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 初始化首个账号
/// 数据库中没有任何用户时，按配置创建一个 creator 账号
async fn seed_creator(storage: &Arc<dyn Storage>) {
    match storage.count_users(None, false).await {
        Ok(count) if count > 0 => {
            debug!(
                "Database already has {} user(s), skipping bootstrap account",
                count
            );
            return;
        }
        Ok(_) => {
            info!("No users found in database, creating bootstrap account...");
        }
        Err(e) => {
            warn!("Failed to count users: {}, skipping bootstrap account", e);
            return;
        }
    }

    let bootstrap = &AppConfig::get().app.bootstrap_admin;
    let username = if bootstrap.username.trim().is_empty() {
        "admin".to_string()
    } else {
        bootstrap.username.trim().to_string()
    };
    let email = if bootstrap.email.trim().is_empty() {
        "admin@localhost".to_string()
    } else {
        bootstrap.email.trim().to_string()
    };

    // 未配置密码时生成一次性随机密码
    let password = if bootstrap.password.is_empty() {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  BOOTSTRAP PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated password for '{}': {}", username, pwd);
        warn!("  Please save this password or set app.bootstrap_admin.password");
        warn!("==========================================================");
        pwd
    } else {
        bootstrap.password.clone()
    };

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash bootstrap password: {}, skipping", e);
            return;
        }
    };

    let request = CreateUserRequest {
        username,
        email,
        password: password_hash,
        role: UserRole::Creator,
        display_name: Some("Administrator".to_string()),
    };

    match storage.create_user(request).await {
        Ok(user) => {
            info!(
                "Bootstrap account created successfully (ID: {}, username: {})",
                user.id, user.username
            );
        }
        Err(e) => {
            warn!("Failed to create bootstrap account: {}", e);
        }
    }
}

/// 准备服务器启动的上下文
/// 顺序：存储与迁移，权限种子，首个账号，审计写入，维护状态，缓存
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    if cfg!(debug_assertions) {
        debug!("Registered object cache plugins: {:?}", crate::cache::register::registered_object_cache_plugins());
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    // 默认角色权限，已有数据只补缺
    if let Err(e) = permissions::seed_defaults(&storage).await {
        warn!("Failed to seed role permissions: {}", e);
    }

    seed_creator(&storage).await;

    audit::start_writer(storage.clone());
    maintenance::init(&storage).await;

    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    StartupContext { storage, cache }
}
