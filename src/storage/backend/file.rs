//! JSON 文件存储后端
//!
//! 文件内容是一个 UrlPair 数组：
//! - 打开时整体加载到内存
//! - save 追加写（回退到末尾的 `]` 再写入新记录）
//! - save_many / delete_by_shorts 整体重写（临时文件 + rename）
//!
//! 所有写操作先落盘，成功后才修改内存状态。

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::errors::{Result, TinylinkError};
use crate::storage::{UrlPair, UrlRepository};

#[derive(Default)]
struct FileState {
    /// 按写入顺序保存
    pairs: Vec<UrlPair>,
    /// short -> pairs 下标
    index: HashMap<String, usize>,
}

impl FileState {
    fn from_pairs(pairs: Vec<UrlPair>) -> Self {
        let index = pairs
            .iter()
            .enumerate()
            .map(|(i, p)| (p.short.clone(), i))
            .collect();
        Self { pairs, index }
    }

    fn get(&self, short: &str) -> Option<&UrlPair> {
        self.index.get(short).map(|&i| &self.pairs[i])
    }

    fn push(&mut self, pair: UrlPair) {
        self.index.insert(pair.short.clone(), self.pairs.len());
        self.pairs.push(pair);
    }
}

pub struct FileRepository {
    path: PathBuf,
    state: RwLock<FileState>,
}

impl FileRepository {
    /// 打开（或创建）存储文件并加载全部记录
    ///
    /// 文件不存在或为空视为空存储，内容无法解析时返回 Serialization 错误。
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let pairs = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => {
                let pairs: Vec<UrlPair> = serde_json::from_str(&content).map_err(|e| {
                    TinylinkError::serialization(format!(
                        "Failed to parse storage file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                // 末尾不是 `]` 时无法追加写，按标准格式重写一次
                if !content.ends_with(']') {
                    write_atomically(&path, &pairs)?;
                }
                pairs
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Storage file {} not found, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                return Err(TinylinkError::file_operation(format!(
                    "Failed to read storage file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        info!("Loaded {} url pairs from {}", pairs.len(), path.display());
        Ok(Self {
            path,
            state: RwLock::new(FileState::from_pairs(pairs)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条记录
    ///
    /// 分隔符、记录和结尾的 `]` 拼成一个缓冲区后一次写入。
    fn append_record(&self, pair: &UrlPair, is_first: bool) -> Result<()> {
        let chunk = append_chunk(pair, is_first)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;

        if is_first {
            file.set_len(0)?;
        } else {
            file.seek(SeekFrom::End(-1))?;
        }
        file.write_all(&chunk)?;
        file.flush()?;
        Ok(())
    }
}

/// 追加写的字节：首条为 `[\n{item}\n]`，之后覆盖末尾 `]` 写 `,\n{item}\n]`
fn append_chunk(pair: &UrlPair, is_first: bool) -> Result<Vec<u8>> {
    let mut chunk = Vec::with_capacity(128);
    chunk.extend_from_slice(if is_first { b"[\n" } else { b",\n" });
    serde_json::to_writer(&mut chunk, pair)?;
    chunk.extend_from_slice(b"\n]");
    Ok(chunk)
}

/// 渲染为与追加写一致的格式
fn render(pairs: &[UrlPair]) -> Result<Vec<u8>> {
    if pairs.is_empty() {
        return Ok(b"[]".to_vec());
    }

    let mut buf = Vec::with_capacity(pairs.len() * 128);
    buf.extend_from_slice(b"[\n");
    for (i, pair) in pairs.iter().enumerate() {
        if i > 0 {
            buf.extend_from_slice(b",\n");
        }
        serde_json::to_writer(&mut buf, pair)?;
    }
    buf.extend_from_slice(b"\n]");
    Ok(buf)
}

/// 写临时文件后 rename，保证读者看到的要么是旧内容要么是新内容
fn write_atomically(path: &Path, pairs: &[UrlPair]) -> Result<()> {
    let content = render(pairs)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        warn!("Failed to replace storage file {}: {}", path.display(), e);
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl UrlRepository for FileRepository {
    async fn save(&self, pair: UrlPair) -> Result<()> {
        let mut state = self.state.write();
        if state.get(&pair.short).is_some() {
            return Err(TinylinkError::conflict(format!(
                "Short code '{}' already exists",
                pair.short
            )));
        }

        self.append_record(&pair, state.pairs.is_empty())?;
        state.push(pair);
        Ok(())
    }

    async fn get_by_short(&self, short: &str) -> Result<Option<UrlPair>> {
        Ok(self.state.read().get(short).cloned())
    }

    async fn save_many(&self, pairs: Vec<UrlPair>) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write();

        let mut next = FileState::from_pairs(state.pairs.clone());
        for pair in pairs {
            if next.get(&pair.short).is_some() {
                return Err(TinylinkError::conflict(format!(
                    "Short code '{}' already exists",
                    pair.short
                )));
            }
            next.push(pair);
        }

        write_atomically(&self.path, &next.pairs)?;
        debug!(
            "FileRepository: batch saved, {} -> {} pairs",
            state.pairs.len(),
            next.pairs.len()
        );
        *state = next;
        Ok(())
    }

    async fn get_all_by_owner(&self, user_id: &str) -> Result<Vec<UrlPair>> {
        Ok(self
            .state
            .read()
            .pairs
            .iter()
            .filter(|p| p.user_id == user_id && !p.is_deleted)
            .cloned()
            .collect())
    }

    async fn delete_by_shorts(&self, user_id: &str, shorts: &[String]) -> Result<u64> {
        let mut state = self.state.write();

        let targets: Vec<usize> = shorts
            .iter()
            .filter_map(|s| state.index.get(s).copied())
            .filter(|&i| {
                let pair = &state.pairs[i];
                pair.user_id == user_id && !pair.is_deleted
            })
            .collect();

        if targets.is_empty() {
            return Ok(0);
        }

        let mut updated = state.pairs.clone();
        let mut affected = 0;
        for i in targets {
            // 同一 short 可能在请求里出现多次
            if !updated[i].is_deleted {
                updated[i].is_deleted = true;
                affected += 1;
            }
        }

        write_atomically(&self.path, &updated)?;
        state.pairs = updated;
        Ok(affected)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
