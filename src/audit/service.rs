//! 异步审计服务
//!
//! 观察者只能通过 `AuditServiceBuilder` 注册，`start()` 之后列表即固定。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::{AuditEvent, AuditObserver, AuditPublisher};

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

pub struct AuditServiceBuilder {
    observers: Vec<Arc<dyn AuditObserver>>,
    queue_capacity: usize,
}

impl Default for AuditServiceBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl AuditServiceBuilder {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            observers: Vec::new(),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn register(mut self, observer: Arc<dyn AuditObserver>) -> Self {
        debug!("Audit observer registered: {}", observer.name());
        self.observers.push(observer);
        self
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// 固定观察者列表并启动分发任务，必须在 tokio 运行时内调用
    pub fn start(self) -> AuditService {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let observers: Arc<[Arc<dyn AuditObserver>]> = self.observers.into();

        info!(
            "AuditService started with {} observer(s), queue capacity {}",
            observers.len(),
            self.queue_capacity
        );

        let worker = tokio::spawn(dispatch_loop(rx, shutdown_rx, observers));

        AuditService {
            tx: Mutex::new(Some(tx)),
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
            dropped: AtomicU64::new(0),
        }
    }
}

pub struct AuditService {
    /// close() 后置为 None
    tx: Mutex<Option<mpsc::Sender<AuditEvent>>>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    dropped: AtomicU64,
}

impl AuditService {
    pub fn builder() -> AuditServiceBuilder {
        AuditServiceBuilder::default()
    }

    /// 因队列满或已关闭而丢弃的事件数
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AuditPublisher for AuditService {
    fn notify(&self, event: AuditEvent) {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("Audit service closed, dropping {:?} event", event.action);
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Audit buffer full, dropping {:?} event", event.action);
            }
            Err(TrySendError::Closed(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Audit worker gone, dropping {:?} event", event.action);
            }
        }
    }

    async fn close(&self) {
        // 先丢弃发送端，使分发任务在取完队列后退出
        drop(self.tx.lock().take());
        self.shutdown_tx.send_replace(true);

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            match handle.await {
                Ok(()) => info!("AuditService stopped"),
                Err(e) => error!("Audit worker terminated abnormally: {}", e),
            }
        }
    }
}

async fn dispatch_loop(
    mut rx: mpsc::Receiver<AuditEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
    observers: Arc<[Arc<dyn AuditObserver>]>,
) {
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            event = rx.recv() => match event {
                Some(event) => dispatch(&observers, event).await,
                None => break,
            },
        }
    }

    rx.close();
    let mut drained = 0usize;
    while let Some(event) = rx.recv().await {
        dispatch(&observers, event).await;
        drained += 1;
    }
    debug!("Audit worker drained {} pending event(s)", drained);
}

/// 观察者是同步实现（文件 / 阻塞 HTTP），在阻塞线程池中执行
async fn dispatch(observers: &Arc<[Arc<dyn AuditObserver>]>, event: AuditEvent) {
    if observers.is_empty() {
        return;
    }

    let observers = Arc::clone(observers);
    let result = tokio::task::spawn_blocking(move || {
        for observer in observers.iter() {
            match observer.send(&event) {
                Ok(()) => trace!("Audit event delivered to {}", observer.name()),
                Err(e) => warn!("Audit observer {} failed: {:#}", observer.name(), e),
            }
        }
    })
    .await;

    if let Err(e) = result {
        error!("Audit dispatch task failed: {}", e);
    }
}
