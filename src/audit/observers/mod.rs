mod file;
mod http;

pub use file::FileObserver;
pub use http::HttpObserver;

use super::AuditEvent;

/// 审计事件接收方
///
/// `send` 是同步的，由审计服务在阻塞线程池中调用。
pub trait AuditObserver: Send + Sync {
    fn name(&self) -> &str;

    fn send(&self, event: &AuditEvent) -> anyhow::Result<()>;
}
