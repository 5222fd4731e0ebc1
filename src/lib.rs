//! Tinylink - URL shortener core
//!
//! This library provides the pieces an HTTP front end needs to shorten and
//! resolve URLs: deterministic short-code generation, a write-behind
//! deletion pipeline and an asynchronous audit bus.
//!
//! # Architecture
//! - `storage`: `UrlRepository` trait with memory, JSON file and SeaORM backends
//! - `services`: code generator and the `UrlService` orchestrator
//! - `deletion`: batching soft-delete worker
//! - `audit`: event bus with file and HTTP observers
//! - `config`: configuration loading
//! - `runtime`: startup wiring and graceful shutdown
//! - `system`: logging initialization

pub mod audit;
pub mod config;
pub mod deletion;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
