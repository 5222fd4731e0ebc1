use async_trait::async_trait;

use super::AuditEvent;

/// 审计事件发布接口
#[async_trait]
pub trait AuditPublisher: Send + Sync {
    /// 投递事件，不阻塞调用方
    fn notify(&self, event: AuditEvent);

    /// 停止接收并等待已入队事件分发完毕，可重复调用
    async fn close(&self);
}

/// 未配置任何观察者时使用
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl NoopPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditPublisher for NoopPublisher {
    fn notify(&self, _event: AuditEvent) {}

    async fn close(&self) {}
}
