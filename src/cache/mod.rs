// 缓存模块
// 临时存储适配器、缓存键构造与互动去重/限流逻辑

pub mod keys;
pub mod operations;
pub mod store;

// 重新导出常用类型，方便其他模块使用
pub use keys::engagement_keys::EventKind;
pub use operations::engagement::EngagementService;
pub use store::{EphemeralStore, RedisStore};
