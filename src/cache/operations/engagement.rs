use std::sync::Arc;

use crate::cache::keys::engagement_keys::{self, EventKind};
use crate::cache::store::EphemeralStore;

/// 去重键过期时间：24小时
/// 唯一性窗口是UTC自然日（键里带日期串），不是从首次事件起算的滑动24小时
const DEDUP_TTL_SECONDS: u64 = 86400;

/// 互动去重与限流服务
/// 只回答布尔值，不触碰持久化存储；持久化计数自增由调用方完成
/// 所有基础设施故障（未配置、连接断开、超时）都降级为放行
#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn EphemeralStore>,
}

impl EngagementService {
    pub fn new(store: Arc<dyn EphemeralStore>) -> Self {
        Self { store }
    }

    /// 判断该访问者今天是否第一次对该主体触发此类事件
    /// 任意数量的并发调用对同一(主体, 访问者, 日期, 类型)只会得到一次true，
    /// 原子性由存储的条件写入保证
    /// 存储不可用或出错时返回true：宁可多计数，不能让功能不可用
    pub async fn should_count_unique_event(
        &self,
        subject_id: &str,
        actor_ip: &str,
        kind: EventKind,
    ) -> bool {
        if !self.store.is_available() {
            return true;
        }

        match self.try_mark_unique_event(subject_id, actor_ip, kind).await {
            Ok(created) => created,
            Err(e) => {
                tracing::error!("Redis error in should_count_unique_event: {}", e);
                true
            }
        }
    }

    /// 固定窗口限流：窗口内计数超过上限返回false
    /// 窗口边界处可能出现突发，这是已接受的取舍，不要改成滑动窗口
    /// 存储不可用或出错时返回true：可用性优先于限流精度
    pub async fn check_rate_limit(
        &self,
        bucket_key: &str,
        max_attempts: u32,
        window_seconds: u64,
    ) -> bool {
        // 零值是调用方缺陷，直接失败而不是吞掉
        assert!(max_attempts > 0, "max_attempts must be positive");
        assert!(window_seconds > 0, "window_seconds must be positive");

        if !self.store.is_available() {
            return true;
        }

        match self.try_count_attempt(bucket_key, window_seconds).await {
            Ok(count) => count <= max_attempts as i64,
            Err(e) => {
                tracing::error!("Redis rate limit error: {}", e);
                true
            }
        }
    }

    /// 内部实现返回Result，错误在公开方法处统一映射为放行
    async fn try_mark_unique_event(
        &self,
        subject_id: &str,
        actor_ip: &str,
        kind: EventKind,
    ) -> Result<bool, redis::RedisError> {
        let fingerprint = engagement_keys::actor_fingerprint(actor_ip);
        let day = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let key = engagement_keys::event_dedup_key(kind, subject_id, &day, &fingerprint);

        self.store
            .set_if_absent_with_expiry(&key, "1", DEDUP_TTL_SECONDS)
            .await
    }

    async fn try_count_attempt(
        &self,
        bucket_key: &str,
        window_seconds: u64,
    ) -> Result<i64, redis::RedisError> {
        self.store.increment_with_expiry(bucket_key, window_seconds).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// 内存存储：用可手动推进的逻辑时钟模拟过期
    struct MemoryStore {
        // 键 -> (计数值, 过期时刻)
        entries: Mutex<HashMap<String, (i64, u64)>>,
        clock: AtomicU64,
        available: AtomicBool,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                clock: AtomicU64::new(0),
                available: AtomicBool::new(true),
            }
        }

        fn advance(&self, seconds: u64) {
            self.clock.fetch_add(seconds, Ordering::SeqCst);
        }

        fn set_available(&self, available: bool) {
            self.available.store(available, Ordering::SeqCst);
        }

        fn now(&self) -> u64 {
            self.clock.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EphemeralStore for MemoryStore {
        fn is_available(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }

        async fn set_if_absent_with_expiry(
            &self,
            key: &str,
            _value: &str,
            ttl_seconds: u64,
        ) -> Result<bool, redis::RedisError> {
            let now = self.now();
            let mut entries = self.entries.lock().unwrap();

            if let Some(&(_, expires_at)) = entries.get(key) {
                if expires_at > now {
                    return Ok(false);
                }
            }

            entries.insert(key.to_string(), (1, now + ttl_seconds));
            Ok(true)
        }

        async fn increment_with_expiry(
            &self,
            key: &str,
            window_seconds: u64,
        ) -> Result<i64, redis::RedisError> {
            let now = self.now();
            let mut entries = self.entries.lock().unwrap();

            match entries.get_mut(key) {
                Some((count, expires_at)) if *expires_at > now => {
                    *count += 1;
                    Ok(*count)
                }
                _ => {
                    entries.insert(key.to_string(), (1, now + window_seconds));
                    Ok(1)
                }
            }
        }
    }

    /// 自称可用但每次操作都失败的存储，用于验证错误到放行的映射
    struct FailingStore;

    #[async_trait]
    impl EphemeralStore for FailingStore {
        fn is_available(&self) -> bool {
            true
        }

        async fn set_if_absent_with_expiry(
            &self,
            _key: &str,
            _value: &str,
            _ttl_seconds: u64,
        ) -> Result<bool, redis::RedisError> {
            Err(redis::RedisError::from((redis::ErrorKind::IoError, "连接中断")))
        }

        async fn increment_with_expiry(
            &self,
            _key: &str,
            _window_seconds: u64,
        ) -> Result<i64, redis::RedisError> {
            Err(redis::RedisError::from((redis::ErrorKind::IoError, "连接中断")))
        }
    }

    fn service_with(store: Arc<dyn EphemeralStore>) -> EngagementService {
        EngagementService::new(store)
    }

    #[tokio::test]
    async fn first_view_counts_second_does_not() {
        let service = service_with(Arc::new(MemoryStore::new()));

        assert!(service.should_count_unique_event("post-1", "203.0.113.7", EventKind::View).await);
        assert!(!service.should_count_unique_event("post-1", "203.0.113.7", EventKind::View).await);
    }

    #[tokio::test]
    async fn different_subject_counts_again() {
        let service = service_with(Arc::new(MemoryStore::new()));

        assert!(service.should_count_unique_event("post-1", "203.0.113.7", EventKind::View).await);
        assert!(service.should_count_unique_event("post-2", "203.0.113.7", EventKind::View).await);
    }

    #[tokio::test]
    async fn different_actor_counts_again() {
        let service = service_with(Arc::new(MemoryStore::new()));

        assert!(service.should_count_unique_event("post-1", "203.0.113.7", EventKind::View).await);
        assert!(service.should_count_unique_event("post-1", "203.0.113.8", EventKind::View).await);
    }

    #[tokio::test]
    async fn download_dedup_is_independent_of_view_dedup() {
        let service = service_with(Arc::new(MemoryStore::new()));

        // 同一主体、同一访问者、同一天，两类事件互不影响
        assert!(service.should_count_unique_event("ver-9", "203.0.113.7", EventKind::View).await);
        assert!(service.should_count_unique_event("ver-9", "203.0.113.7", EventKind::Download).await);
        assert!(!service.should_count_unique_event("ver-9", "203.0.113.7", EventKind::Download).await);
    }

    #[tokio::test]
    async fn concurrent_calls_count_exactly_once() {
        let service = service_with(Arc::new(MemoryStore::new()));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.should_count_unique_event("post-1", "203.0.113.7", EventKind::View).await
            }));
        }

        let mut counted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                counted += 1;
            }
        }

        assert_eq!(counted, 1);
    }

    #[tokio::test]
    async fn unavailable_store_fails_open_for_dedup() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let service = service_with(store);

        // 不可用时每次调用都放行，与之前的状态无关
        assert!(service.should_count_unique_event("post-1", "203.0.113.7", EventKind::View).await);
        assert!(service.should_count_unique_event("post-1", "203.0.113.7", EventKind::View).await);
        assert!(service.should_count_unique_event("post-1", "203.0.113.7", EventKind::View).await);
    }

    #[tokio::test]
    async fn unavailable_store_fails_open_for_rate_limit() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let service = service_with(store);

        for _ in 0..10 {
            assert!(service.check_rate_limit("login:203.0.113.7", 3, 60).await);
        }
    }

    #[tokio::test]
    async fn store_error_fails_open_for_both_operations() {
        let service = service_with(Arc::new(FailingStore));

        assert!(service.should_count_unique_event("post-1", "203.0.113.7", EventKind::View).await);
        assert!(service.should_count_unique_event("post-1", "203.0.113.7", EventKind::View).await);
        assert!(service.check_rate_limit("login:203.0.113.7", 3, 60).await);
        assert!(service.check_rate_limit("login:203.0.113.7", 3, 60).await);
    }

    #[tokio::test]
    async fn rate_limit_boundary() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store.clone());

        // 窗口内前3次放行，第4次拒绝
        assert!(service.check_rate_limit("login:203.0.113.7", 3, 60).await);
        assert!(service.check_rate_limit("login:203.0.113.7", 3, 60).await);
        assert!(service.check_rate_limit("login:203.0.113.7", 3, 60).await);
        assert!(!service.check_rate_limit("login:203.0.113.7", 3, 60).await);

        // 窗口过后重新开始计数
        store.advance(61);
        assert!(service.check_rate_limit("login:203.0.113.7", 3, 60).await);
    }

    #[tokio::test]
    async fn rate_limit_buckets_are_independent() {
        let service = service_with(Arc::new(MemoryStore::new()));

        assert!(service.check_rate_limit("login:203.0.113.7", 1, 60).await);
        assert!(!service.check_rate_limit("login:203.0.113.7", 1, 60).await);
        // 其他桶不受影响
        assert!(service.check_rate_limit("login:203.0.113.8", 1, 60).await);
    }

    #[tokio::test]
    #[should_panic(expected = "max_attempts must be positive")]
    async fn zero_max_attempts_panics() {
        let service = service_with(Arc::new(MemoryStore::new()));
        service.check_rate_limit("login:203.0.113.7", 0, 60).await;
    }

    #[tokio::test]
    #[should_panic(expected = "window_seconds must be positive")]
    async fn zero_window_panics() {
        let service = service_with(Arc::new(MemoryStore::new()));
        service.check_rate_limit("login:203.0.113.7", 3, 0).await;
    }
}
