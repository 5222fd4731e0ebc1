//! Service layer
//!
//! Business logic shared by whatever transport sits in front of the crate.

pub mod code_generator;
mod url_service;

pub use code_generator::{CODE_LENGTH, CodeGenerator, GeneratedCode};
pub use url_service::*;
