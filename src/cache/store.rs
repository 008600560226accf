use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};

/// 初始连接超时
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(2);

/// 单次命令响应超时，缓存卡死不能拖垮调用方请求
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// 临时键值存储接口
/// 只暴露两个原子原语，原子性由存储本身保证而不是调用方
/// 生产实现为Redis，测试使用内存实现
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    /// 连接是否可用，必须廉价且无副作用
    fn is_available(&self) -> bool;

    /// 原子地"键不存在才写入"并设置过期秒数
    /// 返回键是否为本次新建
    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<bool, redis::RedisError>;

    /// 原子自增计数器；自增后的值为1（即本次创建了键）时设置窗口过期秒数
    /// 返回自增后的值
    async fn increment_with_expiry(
        &self,
        key: &str,
        window_seconds: u64,
    ) -> Result<i64, redis::RedisError>;
}

/// Redis存储适配器
/// 连接在进程启动时建立一次，之后所有调用复用同一个连接管理器
/// REDIS_URL未配置或初始连接失败时进入降级模式，不阻止进程启动
pub struct RedisStore {
    conn: Option<ConnectionManager>,
}

impl RedisStore {
    /// 根据可选的连接地址建立存储适配器
    pub async fn connect(redis_url: Option<&str>) -> Self {
        let Some(url) = redis_url else {
            tracing::warn!("REDIS_URL not configured - engagement dedup and rate limiting disabled");
            return Self { conn: None };
        };

        let client = match redis::Client::open(url) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("Failed to create Redis client: {}", e);
                return Self { conn: None };
            }
        };

        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(CONNECTION_TIMEOUT)
            .set_response_timeout(RESPONSE_TIMEOUT);

        // 连接管理器在断线后自动重连，中途恢复的Redis会在下一次调用时被用上
        match client.get_connection_manager_with_config(config).await {
            Ok(conn) => {
                tracing::info!("Connected to Redis");
                Self { conn: Some(conn) }
            }
            Err(e) => {
                tracing::error!("Failed to connect to Redis: {}", e);
                Self { conn: None }
            }
        }
    }

    fn connection(&self) -> Result<ConnectionManager, redis::RedisError> {
        self.conn
            .clone()
            .ok_or_else(|| redis::RedisError::from((redis::ErrorKind::IoError, "Redis连接不可用")))
    }
}

#[async_trait]
impl EphemeralStore for RedisStore {
    fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<bool, redis::RedisError> {
        let mut conn = self.connection()?;

        // SET key value NX EX ttl 是单条原子命令，不存在读后写竞态
        // 写入成功返回OK，键已存在返回nil
        let created: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;

        Ok(created.is_some())
    }

    async fn increment_with_expiry(
        &self,
        key: &str,
        window_seconds: u64,
    ) -> Result<i64, redis::RedisError> {
        let mut conn = self.connection()?;

        let count: i64 = conn.incr(key, 1).await?;

        if count == 1 {
            // 本次创建了键，设置窗口过期时间
            let _: () = conn.expire(key, window_seconds as i64).await?;
        }

        Ok(count)
    }
}
