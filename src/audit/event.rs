use serde::{Deserialize, Serialize};

/// 审计动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// 新建短链接
    Shorten,
    /// 解析短链接
    Follow,
}

/// 审计事件，序列化为 `{"ts":..,"action":..,"user_id":..,"url":..}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unix 秒
    pub ts: i64,
    pub action: AuditAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub url: String,
}

impl AuditEvent {
    /// 以当前时间创建事件，空 user_id 视为匿名
    pub fn new(action: AuditAction, user_id: &str, url: impl Into<String>) -> Self {
        Self {
            ts: chrono::Utc::now().timestamp(),
            action,
            user_id: (!user_id.is_empty()).then(|| user_id.to_string()),
            url: url.into(),
        }
    }

    pub fn shorten(user_id: &str, url: impl Into<String>) -> Self {
        Self::new(AuditAction::Shorten, user_id, url)
    }

    pub fn follow(user_id: &str, url: impl Into<String>) -> Self {
        Self::new(AuditAction::Follow, user_id, url)
    }
}
