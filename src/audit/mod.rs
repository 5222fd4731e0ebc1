//! 审计事件总线
//!
//! 生产者调用 `notify` 投递事件后立即返回；后台任务把事件分发给已注册的观察者。
//! 队列满时丢弃并记录日志，投递失败不会回传给生产者。

mod event;
pub mod observers;
mod publisher;
mod service;

pub use event::{AuditAction, AuditEvent};
pub use observers::{AuditObserver, FileObserver, HttpObserver};
pub use publisher::{AuditPublisher, NoopPublisher};
pub use service::{AuditService, AuditServiceBuilder};
