//! 同步事件
//!
//! 引擎不直接写日志，所有进度和诊断信息都以 [`SyncEvent`] 发送到注入的 [`EventSink`]，
//! 由接收方决定如何呈现。

use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info, trace, warn};

/// 同步过程中产生的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// 分隔线
    Separator,
    PairStart {
        source: PathBuf,
        target: PathBuf,
    },
    /// 交互模式下统计文件前的提示
    CountingNotice,
    PairTotals {
        files_total: u64,
        size_total: u64,
    },
    EntryAdded {
        path: PathBuf,
    },
    EntryUpdated {
        path: PathBuf,
    },
    EntryUnchanged {
        path: PathBuf,
    },
    /// 删除目标中多余的条目，`count` 为删除的文件数（目录为递归文件数）
    EntryDeleted {
        path: PathBuf,
        count: u64,
    },
    /// 源文件被锁定或不可读，跳过
    EntrySkippedLocked {
        path: PathBuf,
    },
    /// 源条目既不是文件也不是目录（符号链接等），跳过
    EntrySkippedSpecial {
        path: PathBuf,
    },
    /// 单个条目处理失败，遍历继续
    EntryFailed {
        path: PathBuf,
        message: String,
    },
    /// 同步目标配置校验失败，已被丢弃
    PairRejected {
        message: String,
    },
    PairCancelled {
        target: PathBuf,
    },
    PairSummary {
        added: u64,
        deleted: u64,
        updated: u64,
    },
    /// 交互模式的单行进度
    ProgressTick {
        processed: u64,
        total: u64,
    },
}

/// 事件接收方
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SyncEvent);
}

/// 通过 tracing 输出事件，进度输出到标准输出的同一行
#[derive(Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn emit(&self, event: SyncEvent) {
        match event {
            SyncEvent::Separator => info!("########################################"),
            SyncEvent::PairStart { source, target } => {
                info!("正在处理 {} > {}", source.display(), target.display())
            }
            SyncEvent::CountingNotice => info!("正在统计..."),
            SyncEvent::PairTotals {
                files_total,
                size_total,
            } => {
                info!("文件数: {}", files_total);
                info!("大小: {}", format_size(size_total));
            }
            SyncEvent::EntryAdded { path } => debug!("复制新文件 {}", path.display()),
            SyncEvent::EntryUpdated { path } => debug!("替换较新的文件 {}", path.display()),
            SyncEvent::EntryUnchanged { path } => trace!("跳过文件 {}", path.display()),
            SyncEvent::EntryDeleted { path, count } => {
                debug!("删除多余条目 {} ({} 个文件)", path.display(), count)
            }
            SyncEvent::EntrySkippedLocked { path } => {
                info!("跳过被锁定的文件 {}", path.display())
            }
            SyncEvent::EntrySkippedSpecial { path } => {
                debug!("跳过特殊文件 {}", path.display())
            }
            SyncEvent::EntryFailed { path, message } => {
                error!("处理 {} 失败: {}", path.display(), message)
            }
            SyncEvent::PairRejected { message } => error!("{}", message),
            SyncEvent::PairCancelled { target } => {
                warn!("同步已取消: {}", target.display())
            }
            SyncEvent::PairSummary {
                added,
                deleted,
                updated,
            } => {
                info!("新增文件: {}", added);
                info!("删除文件: {}", deleted);
                info!("更新文件: {}", updated);
                info!("########################################");
            }
            SyncEvent::ProgressTick { processed, total } => {
                let mut stdout = std::io::stdout().lock();
                let _ = write!(stdout, "  > {}/{}\r", processed, total);
                let _ = stdout.flush();
            }
        }
    }
}

/// 格式化字节数，例如 `120 KB`、`7 MB`（向下取整）
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }

    let mut value = bytes / 1024;
    let mut unit = 0;
    while value >= 1024 && unit < UNITS.len() - 1 {
        value /= 1024;
        unit += 1;
    }
    format!("{} {}", value, UNITS[unit])
}

/// 记录所有事件，测试用
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemorySink {
    events: std::sync::Mutex<Vec<SyncEvent>>,
}

#[cfg(test)]
impl MemorySink {
    pub(crate) fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&SyncEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

#[cfg(test)]
impl EventSink for MemorySink {
    fn emit(&self, event: SyncEvent) {
        self.events.lock().unwrap().push(event);
    }
}
