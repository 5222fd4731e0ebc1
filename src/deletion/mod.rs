//! 写后删除
//!
//! 删除请求只入队，由后台任务按用户分组后批量软删除。

mod pipeline;

pub use pipeline::DeletionPipeline;

/// 一条待删除记录，入队后由管道消费一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTask {
    pub user_id: String,
    pub short: String,
}

impl DeleteTask {
    pub fn new(user_id: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            short: short.into(),
        }
    }
}
