// 数据库模块
// 持久化实体的行模型与操作逻辑

pub mod models;
pub mod operations;
