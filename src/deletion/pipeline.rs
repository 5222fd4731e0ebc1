//! 删除管道
//!
//! 单个后台任务消费有界队列，满足以下任一条件时刷盘：
//! - 缓冲区达到 `max_batch_size`
//! - 定时器触发且缓冲区非空
//! - 收到 `flush()` 请求
//! - 收到关闭信号（关闭队列、取完剩余任务后刷盘退出）
//!
//! 刷盘失败只记日志，该批次丢弃。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace};

use super::DeleteTask;
use crate::config::DeletionConfig;
use crate::errors::{Result, TinylinkError};
use crate::storage::UrlRepository;

enum PipelineMessage {
    Task(DeleteTask),
    /// 刷掉此前入队的所有任务后回执
    Flush(oneshot::Sender<()>),
}

pub struct DeletionPipeline {
    tx: mpsc::Sender<PipelineMessage>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DeletionPipeline {
    /// 启动后台任务，必须在 tokio 运行时内调用
    pub fn start(repository: Arc<dyn UrlRepository>, config: &DeletionConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = DeletionWorker {
            repository,
            rx,
            shutdown_rx,
            buffer: Vec::with_capacity(config.max_batch_size),
            max_batch_size: config.max_batch_size.max(1),
            flush_interval: config.flush_interval(),
        };

        info!(
            "DeletionPipeline started (queue: {}, batch: {}, interval: {:?})",
            config.queue_capacity, config.max_batch_size, worker.flush_interval
        );

        Self {
            tx,
            shutdown_tx,
            worker: Mutex::new(Some(tokio::spawn(worker.run()))),
        }
    }

    /// 入队一条删除任务，队列满时等待
    pub async fn enqueue(&self, task: DeleteTask) -> Result<()> {
        if self.is_closed() {
            return Err(TinylinkError::queue_closed("Deletion pipeline is shut down"));
        }

        self.tx
            .send(PipelineMessage::Task(task))
            .await
            .map_err(|_| TinylinkError::queue_closed("Deletion pipeline is shut down"))
    }

    /// 强制刷盘，返回时此前入队的任务都已处理
    pub async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(PipelineMessage::Flush(ack_tx))
            .await
            .map_err(|_| TinylinkError::queue_closed("Deletion pipeline is shut down"))?;

        ack_rx
            .await
            .map_err(|_| TinylinkError::queue_closed("Deletion pipeline stopped before flushing"))
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// 通知后台任务退出并等待其完成最后一次刷盘，可重复调用
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("DeletionPipeline worker terminated abnormally: {}", e);
            } else {
                info!("DeletionPipeline stopped");
            }
        }
    }
}

struct DeletionWorker {
    repository: Arc<dyn UrlRepository>,
    rx: mpsc::Receiver<PipelineMessage>,
    shutdown_rx: watch::Receiver<bool>,
    buffer: Vec<DeleteTask>,
    max_batch_size: usize,
    flush_interval: Duration,
}

impl DeletionWorker {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval 的第一次 tick 立即完成
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        debug!("DeletionPipeline: shutdown signal received");
                        break;
                    }
                }
                message = self.rx.recv() => match message {
                    Some(message) => self.handle(message).await,
                    None => break,
                },
                _ = ticker.tick() => {
                    if !self.buffer.is_empty() {
                        trace!("DeletionPipeline: scheduled flush");
                        self.flush().await;
                    }
                }
            }
        }

        // 不再接收新任务，处理已入队的部分
        self.rx.close();
        while let Some(message) = self.rx.recv().await {
            self.handle(message).await;
        }
        self.flush().await;
    }

    async fn handle(&mut self, message: PipelineMessage) {
        match message {
            PipelineMessage::Task(task) => {
                self.buffer.push(task);
                if self.buffer.len() >= self.max_batch_size {
                    trace!("DeletionPipeline: batch size reached");
                    self.flush().await;
                }
            }
            PipelineMessage::Flush(ack) => {
                self.flush().await;
                let _ = ack.send(());
            }
        }
    }

    async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let tasks = std::mem::take(&mut self.buffer);
        let count = tasks.len();

        let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
        for task in tasks {
            grouped.entry(task.user_id).or_default().push(task.short);
        }

        for (user_id, shorts) in grouped {
            match self.repository.delete_by_shorts(&user_id, &shorts).await {
                Ok(affected) => debug!(
                    "DeletionPipeline: user '{}' deleted {}/{} codes",
                    user_id,
                    affected,
                    shorts.len()
                ),
                Err(e) => error!(
                    "DeletionPipeline: failed to delete {} codes for user '{}': {}",
                    shorts.len(),
                    user_id,
                    e
                ),
            }
        }

        debug!("DeletionPipeline: flushed {} tasks", count);
    }
}
