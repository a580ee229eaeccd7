//! 同步目标：一个源目录和一个目标目录的组合

use crate::config::SyncConfig;
use crate::core::engine::SyncEngine;
use crate::core::events::{EventSink, SyncEvent};
use crate::core::scanner;
use crate::error::{Result, SyncError};
use crate::storage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::atomic::{AtomicU64, Ordering};

/// 同步计数，只由当前目标的工作线程递增
#[derive(Debug, Default)]
pub struct Counters {
    added: AtomicU64,
    deleted: AtomicU64,
    updated: AtomicU64,
    unchanged: AtomicU64,
}

impl Counters {
    pub fn added(&self) -> u64 {
        self.added.load(Ordering::Relaxed)
    }

    pub fn deleted(&self) -> u64 {
        self.deleted.load(Ordering::Relaxed)
    }

    pub fn updated(&self) -> u64 {
        self.updated.load(Ordering::Relaxed)
    }

    pub fn unchanged(&self) -> u64 {
        self.unchanged.load(Ordering::Relaxed)
    }

    /// 已处理（新增、更新、未变化）的文件数
    pub fn processed(&self) -> u64 {
        self.added() + self.updated() + self.unchanged()
    }
}

/// 同步目标
#[derive(Debug)]
pub struct TargetPair {
    source: PathBuf,
    target: PathBuf,
    files_total: AtomicU64,
    size_total: AtomicU64,
    counters: Counters,
}

impl TargetPair {
    /// 创建并校验同步目标
    ///
    /// 多源模式下实际目标为 `target/源目录名`，避免多个源写入同一目录。
    pub fn new(source: &str, target: &str, multi_source: bool) -> Result<Self> {
        if !source.contains('/') && !source.contains(MAIN_SEPARATOR) {
            return Err(SyncError::SourceWithoutSeparator(source.to_string()));
        }

        let source_path = PathBuf::from(source);
        let target_path = if multi_source {
            let name = source_path
                .file_name()
                .ok_or_else(|| SyncError::SourceWithoutName(source.to_string()))?;
            Path::new(target).join(name)
        } else {
            PathBuf::from(target)
        };

        // 排除规则按绝对路径匹配
        let source_path = std::path::absolute(&source_path)
            .map_err(|_| SyncError::SourceMissing(source_path.clone()))?;
        let target_path = std::path::absolute(&target_path)
            .map_err(|_| SyncError::TargetParentMissing(target_path.clone()))?;

        let pair = Self {
            source: source_path,
            target: target_path,
            files_total: AtomicU64::new(0),
            size_total: AtomicU64::new(0),
            counters: Counters::default(),
        };
        pair.verify()?;
        Ok(pair)
    }

    /// 根据配置创建所有同步目标，校验失败的目标被丢弃
    pub fn from_config(config: &SyncConfig, sink: &dyn EventSink) -> Vec<TargetPair> {
        config
            .pair_specs()
            .into_iter()
            .filter_map(|spec| {
                match spec.and_then(|s| TargetPair::new(&s.source, &s.target, s.multi_source)) {
                    Ok(pair) => Some(pair),
                    Err(e) => {
                        sink.emit(SyncEvent::PairRejected {
                            message: e.to_string(),
                        });
                        None
                    }
                }
            })
            .collect()
    }

    fn verify(&self) -> Result<()> {
        let parent = match self.target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let metadata = fs::metadata(parent)
            .map_err(|_| SyncError::TargetParentMissing(self.target.clone()))?;
        if !metadata.is_dir() {
            return Err(SyncError::TargetParentNotDir(self.target.clone()));
        }
        // 权限位不能反映当前用户能否写入，直接尝试创建临时文件
        if tempfile::tempfile_in(parent).is_err() {
            return Err(SyncError::TargetParentReadOnly(self.target.clone()));
        }
        if !self.source.exists() {
            return Err(SyncError::SourceMissing(self.source.clone()));
        }
        if !storage::is_readable(&self.source) {
            return Err(SyncError::SourceUnreadable(self.source.clone()));
        }
        Ok(())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn files_total(&self) -> u64 {
        self.files_total.load(Ordering::Relaxed)
    }

    pub fn size_total(&self) -> u64 {
        self.size_total.load(Ordering::Relaxed)
    }

    /// 相对路径在源目录下的完整路径，空路径表示源目录本身
    pub fn source_path(&self, relative: &Path) -> PathBuf {
        resolve(&self.source, relative)
    }

    pub fn target_path(&self, relative: &Path) -> PathBuf {
        resolve(&self.target, relative)
    }
}

fn resolve(root: &Path, relative: &Path) -> PathBuf {
    if relative.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

/// 同步目标的最终状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    Completed,
    Cancelled,
    /// 根目录无法处理
    Failed,
}

/// 单个同步目标的运行报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairReport {
    pub source: PathBuf,
    pub target: PathBuf,
    pub status: PairStatus,
    pub files_total: u64,
    pub size_total: u64,
    pub added: u64,
    pub deleted: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub start_time: i64,
    pub end_time: i64,
}

/// 一次同步目标的完整运行过程
pub struct TargetSession<'a> {
    pair: &'a TargetPair,
    engine: &'a SyncEngine,
}

impl<'a> TargetSession<'a> {
    pub fn new(pair: &'a TargetPair, engine: &'a SyncEngine) -> Self {
        Self { pair, engine }
    }

    pub fn pair(&self) -> &TargetPair {
        self.pair
    }

    fn emit(&self, event: SyncEvent) {
        self.engine.sink().emit(event);
    }

    /// 依次执行 log_pre_start → prepare → log_start → run → log_end
    pub fn execute(&self) -> PairReport {
        let start_time = chrono::Utc::now().timestamp();

        self.log_pre_start();
        self.prepare();
        self.log_start();

        let status = match self.run() {
            Ok(()) => PairStatus::Completed,
            Err(SyncError::Cancelled) => {
                self.emit(SyncEvent::PairCancelled {
                    target: self.pair.target.clone(),
                });
                PairStatus::Cancelled
            }
            Err(e) => {
                self.emit(SyncEvent::EntryFailed {
                    path: self.pair.source.clone(),
                    message: e.to_string(),
                });
                PairStatus::Failed
            }
        };

        self.log_end();
        self.report(status, start_time)
    }

    pub fn log_pre_start(&self) {
        self.emit(SyncEvent::Separator);
        self.emit(SyncEvent::PairStart {
            source: self.pair.source.clone(),
            target: self.pair.target.clone(),
        });
        if self.engine.interactive() {
            self.emit(SyncEvent::CountingNotice);
        }
    }

    /// 统计源目录的文件数和大小，仅用于显示进度
    pub fn prepare(&self) {
        self.pair
            .files_total
            .store(scanner::count_files(&self.pair.source), Ordering::Relaxed);
        self.pair
            .size_total
            .store(scanner::size_of(&self.pair.source), Ordering::Relaxed);
    }

    pub fn log_start(&self) {
        self.emit(SyncEvent::PairTotals {
            files_total: self.pair.files_total(),
            size_total: self.pair.size_total(),
        });
    }

    /// 从根目录开始同步
    pub fn run(&self) -> Result<()> {
        self.engine.reconcile(self, Path::new(""))
    }

    pub fn log_end(&self) {
        let counters = &self.pair.counters;
        self.emit(SyncEvent::PairSummary {
            added: counters.added(),
            deleted: counters.deleted(),
            updated: counters.updated(),
        });
    }

    /// 交互模式下输出进度
    pub fn tick(&self) {
        if self.engine.interactive() {
            self.emit(SyncEvent::ProgressTick {
                processed: self.pair.counters.processed(),
                total: self.pair.files_total(),
            });
        }
    }

    pub(crate) fn file_added(&self, relative: &Path) {
        self.pair.counters.added.fetch_add(1, Ordering::Relaxed);
        self.emit(SyncEvent::EntryAdded {
            path: relative.to_path_buf(),
        });
        self.tick();
    }

    pub(crate) fn file_updated(&self, relative: &Path) {
        self.pair.counters.updated.fetch_add(1, Ordering::Relaxed);
        self.emit(SyncEvent::EntryUpdated {
            path: relative.to_path_buf(),
        });
        self.tick();
    }

    pub(crate) fn file_unchanged(&self, relative: &Path) {
        self.pair.counters.unchanged.fetch_add(1, Ordering::Relaxed);
        self.emit(SyncEvent::EntryUnchanged {
            path: relative.to_path_buf(),
        });
        self.tick();
    }

    pub(crate) fn files_deleted(&self, relative: &Path, count: u64) {
        self.pair.counters.deleted.fetch_add(count, Ordering::Relaxed);
        self.emit(SyncEvent::EntryDeleted {
            path: relative.to_path_buf(),
            count,
        });
    }

    pub(crate) fn skipped_locked(&self, source: &Path) {
        self.emit(SyncEvent::EntrySkippedLocked {
            path: source.to_path_buf(),
        });
    }

    pub(crate) fn skipped_special(&self, relative: &Path) {
        self.emit(SyncEvent::EntrySkippedSpecial {
            path: relative.to_path_buf(),
        });
    }

    pub(crate) fn entry_failed(&self, relative: &Path, error: &SyncError) {
        self.emit(SyncEvent::EntryFailed {
            path: relative.to_path_buf(),
            message: error.to_string(),
        });
    }

    fn report(&self, status: PairStatus, start_time: i64) -> PairReport {
        let counters = &self.pair.counters;
        PairReport {
            source: self.pair.source.clone(),
            target: self.pair.target.clone(),
            status,
            files_total: self.pair.files_total(),
            size_total: self.pair.size_total(),
            added: counters.added(),
            deleted: counters.deleted(),
            updated: counters.updated(),
            unchanged: counters.unchanged(),
            start_time,
            end_time: chrono::Utc::now().timestamp(),
        }
    }
}
