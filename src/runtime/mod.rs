//! 应用生命周期
//!
//! - `lifetime::startup`: 按配置组装存储、审计、删除管道和 UrlService
//! - `lifetime::shutdown`: 等待退出信号，按顺序关闭后台任务

pub mod lifetime;

pub use lifetime::shutdown::listen_for_shutdown;
pub use lifetime::startup::{Runtime, prepare};
