/// 用户登录所需的账号记录
#[derive(Debug, sqlx::FromRow)]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    pub password_hash: String,
}
