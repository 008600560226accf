use sha2::{Digest, Sha256};

/// 浏览事件去重键前缀
const VIEW_DEDUP_PREFIX: &str = "showcase:view";

/// 下载事件去重键前缀
const DOWNLOAD_DEDUP_PREFIX: &str = "resource:download";

/// 全局IP限流键前缀
const IP_RATE_LIMIT_PREFIX: &str = "rate_limit:ip";

/// 登录限流键前缀
const LOGIN_RATE_LIMIT_PREFIX: &str = "login";

/// 指纹截断长度（十六进制字符数）
const FINGERPRINT_LEN: usize = 16;

/// 互动事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    View,
    Download,
}

impl EventKind {
    fn prefix(self) -> &'static str {
        match self {
            EventKind::View => VIEW_DEDUP_PREFIX,
            EventKind::Download => DOWNLOAD_DEDUP_PREFIX,
        }
    }
}

/// 计算访问者指纹：对原始IP做SHA-256，取小写十六进制前16位
/// 键中不出现原始IP；同一IP始终得到相同指纹
pub fn actor_fingerprint(ip: &str) -> String {
    let digest = Sha256::digest(ip.as_bytes());
    let mut fingerprint = hex::encode(digest);
    fingerprint.truncate(FINGERPRINT_LEN);
    fingerprint
}

/// 生成事件去重键：<事件前缀>:<主体ID>:<UTC日期>:<指纹>
/// 日期串变化即键变化，唯一性窗口是UTC自然日而不是滑动24小时
pub fn event_dedup_key(kind: EventKind, subject_id: &str, day: &str, fingerprint: &str) -> String {
    format!("{}:{}:{}:{}", kind.prefix(), subject_id, day, fingerprint)
}

/// 生成全局IP限流键
pub fn ip_rate_limit_key(ip: &str) -> String {
    format!("{}:{}", IP_RATE_LIMIT_PREFIX, ip)
}

/// 生成登录限流键
pub fn login_rate_limit_key(ip: &str) -> String {
    format!("{}:{}", LOGIN_RATE_LIMIT_PREFIX, ip)
}
