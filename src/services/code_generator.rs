//! 短码生成
//!
//! 短码 = base64url(SHA-256(input)) 的前 7 个字符。
//! 候选短码已被其他 URL 占用时，给输入追加随机盐后重算。

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::{Result, TinylinkError};
use crate::storage::UrlRepository;

pub const CODE_LENGTH: usize = 7;

/// 加盐重试的上限，正常情况下一两次即可命中空位
const MAX_ATTEMPTS: usize = 64;

/// 生成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedCode {
    /// 短码尚未被使用
    Fresh(String),
    /// 短码已映射到同一个 URL
    Existing(String),
}

impl GeneratedCode {
    pub fn code(&self) -> &str {
        match self {
            GeneratedCode::Fresh(code) | GeneratedCode::Existing(code) => code,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, GeneratedCode::Existing(_))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator;

impl CodeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// 输入的哈希短码（无副作用）
    pub fn hash_url(input: &str) -> String {
        let digest = Sha256::digest(input.as_bytes());
        let mut encoded = URL_SAFE.encode(digest);
        encoded.truncate(CODE_LENGTH);
        encoded
    }

    fn add_salt(input: &str) -> String {
        let salt: [u8; 4] = rand::random();
        format!("{}:{}", input, URL_SAFE_NO_PAD.encode(salt))
    }

    /// 为 `url` 找到可用短码
    ///
    /// `reserved` 是同一批次中已分配的 `短码 -> URL`，与已存储的记录同等对待。
    pub async fn generate(
        &self,
        repo: &dyn UrlRepository,
        url: &str,
        reserved: &HashMap<String, String>,
    ) -> Result<GeneratedCode> {
        let mut input = url.to_string();

        for attempt in 0..MAX_ATTEMPTS {
            let candidate = Self::hash_url(&input);

            let occupant = match reserved.get(&candidate) {
                Some(long) => Some(long.clone()),
                None => repo.get_by_short(&candidate).await?.map(|pair| pair.long),
            };

            match occupant {
                None => return Ok(GeneratedCode::Fresh(candidate)),
                Some(long) if long == url => return Ok(GeneratedCode::Existing(candidate)),
                Some(_) => {
                    debug!(
                        "Short code collision on '{}' (attempt {}), salting input",
                        candidate,
                        attempt + 1
                    );
                    input = Self::add_salt(&input);
                }
            }
        }

        Err(TinylinkError::storage_operation(format!(
            "Failed to find a free short code for {} after {} attempts",
            url, MAX_ATTEMPTS
        )))
    }
}
