use serde::{Deserialize, Serialize};

/// 持久化的短链接记录
///
/// 文件后端按此结构序列化：`uid, short, long, user_id, is_deleted`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlPair {
    #[serde(rename = "uid")]
    pub id: String,
    pub short: String,
    pub long: String,
    /// 空字符串表示匿名
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub is_deleted: bool,
}

impl UrlPair {
    /// 创建新记录，id 为随机 UUID，is_deleted 为 false
    pub fn new(short: impl Into<String>, long: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            short: short.into(),
            long: long.into(),
            user_id: user_id.into(),
            is_deleted: false,
        }
    }
}
