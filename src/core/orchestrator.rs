//! 按顺序运行所有同步目标，并处理取消

use crate::core::engine::SyncEngine;
use crate::core::events::SyncEvent;
use crate::core::target::{PairReport, TargetPair, TargetSession};
use crate::error::{Result, SyncError};
use serde::Serialize;
use std::fs::File;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// 取消标志，只会从 false 变为 true
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub pairs: Vec<PairReport>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn merge(&mut self, other: RunReport) {
        self.pairs.extend(other.pairs);
        self.cancelled |= other.cancelled;
    }

    /// 写入 JSON 格式的运行报告
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| SyncError::io(path, e))?;
        serde_json::to_writer_pretty(file, self).map_err(|e| SyncError::io(path, e.into()))
    }
}

/// 同步调度器
///
/// 同步目标严格按给定顺序逐个运行：每个目标在独立的阻塞线程中执行，
/// 完成后才开始下一个。
pub struct SyncOrchestrator {
    engine: Arc<SyncEngine>,
}

impl SyncOrchestrator {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    pub async fn run(&self, pairs: Vec<TargetPair>) -> RunReport {
        let mut report = RunReport::default();

        for pair in pairs {
            if self.engine.cancel_flag().is_cancelled() {
                report.cancelled = true;
                break;
            }

            let engine = self.engine.clone();
            let target = pair.target().to_path_buf();
            let handle = tokio::task::spawn_blocking(move || {
                TargetSession::new(&pair, &engine).execute()
            });

            match handle.await {
                Ok(pair_report) => report.pairs.push(pair_report),
                Err(e) => self.engine.sink().emit(SyncEvent::EntryFailed {
                    path: target,
                    message: format!("同步线程异常退出: {}", e),
                }),
            }
        }

        if self.engine.cancel_flag().is_cancelled() {
            report.cancelled = true;
        }
        report
    }
}

/// 运行 `work`，`shutdown` 先完成时设置取消标志并等待 `work` 结束
///
/// 当前同步目标会在下一个条目前停止，之后的目标不再开始。
pub async fn run_with_shutdown<W, S>(work: W, shutdown: S, cancel: &CancelFlag) -> W::Output
where
    W: Future,
    S: Future<Output = ()>,
{
    tokio::pin!(work);
    tokio::pin!(shutdown);

    tokio::select! {
        biased;
        _ = &mut shutdown => {}
        output = &mut work => return output,
    }

    cancel.cancel();
    info!("收到退出信号，等待当前同步停止...");
    work.await
}
