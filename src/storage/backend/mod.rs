//! 存储后端实现
//!
//! - `memory`: 进程内 HashMap
//! - `file`: JSON 数组文件
//! - `database`: SeaORM（SQLite / MySQL / PostgreSQL）

pub mod database;
mod file;
mod memory;

pub use database::{SeaOrmRepository, infer_backend_from_url};
pub use file::FileRepository;
pub use memory::MemoryRepository;
