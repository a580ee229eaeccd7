use crate::config::SyncConfig;
use crate::core::comparator::FileComparator;
use crate::core::events::EventSink;
use crate::core::filter::FilterSpec;
use crate::core::orchestrator::CancelFlag;
use crate::core::scanner;
use crate::core::target::TargetSession;
use crate::error::{Result, SyncError};
use crate::storage::{self, CopyOutcome, EntryKind};
use rand::seq::SliceRandom;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

/// 同步引擎
///
/// 对单个条目（相对路径）做出复制、替换、删除或跳过的决定，
/// 遇到目录时递归处理。引擎本身不保存任何同步目标的状态，
/// 计数和事件都记录在 [`TargetSession`] 上。
pub struct SyncEngine {
    filter: FilterSpec,
    comparator: FileComparator,
    randomize_order: bool,
    interactive: bool,
    sink: Arc<dyn EventSink>,
    cancel: CancelFlag,
}

impl SyncEngine {
    pub fn new(config: &SyncConfig, sink: Arc<dyn EventSink>, cancel: CancelFlag) -> Self {
        Self {
            filter: FilterSpec::from_config(config),
            comparator: FileComparator::from_config(config),
            randomize_order: config.randomize_order,
            interactive: config.interactive,
            sink,
            cancel,
        }
    }

    pub fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// 同步一个条目，空相对路径表示同步目标的根目录
    pub fn reconcile(&self, session: &TargetSession<'_>, relative: &Path) -> Result<()> {
        self.check_cancelled()?;

        let pair = session.pair();
        let source = pair.source_path(relative);
        let target = pair.target_path(relative);

        match probe(relative, &source)? {
            EntryKind::Dir => self.reconcile_dir(session, relative, &source, &target),
            EntryKind::File => self.reconcile_file(session, relative, &source, &target),
            // 列出目录后源条目又被删除，下次同步时处理
            EntryKind::Missing => Ok(()),
            EntryKind::Other => {
                session.skipped_special(relative);
                Ok(())
            }
        }
    }

    fn reconcile_dir(
        &self,
        session: &TargetSession<'_>,
        relative: &Path,
        source: &Path,
        target: &Path,
    ) -> Result<()> {
        match probe(relative, target)? {
            EntryKind::Dir => return self.sync_existing_dir(session, relative, source, target),
            EntryKind::Missing => {}
            EntryKind::File | EntryKind::Other => self.delete_entry(session, relative, target)?,
        }
        self.copy_new_dir(session, relative, source, target)
    }

    fn sync_existing_dir(
        &self,
        session: &TargetSession<'_>,
        relative: &Path,
        source: &Path,
        target: &Path,
    ) -> Result<()> {
        // 源目录无法列出时放弃整个目录，不删除目标中的任何内容
        let mut names = self
            .filter
            .list_included(source)
            .map_err(|e| SyncError::io(source, e))?;
        self.shuffle(&mut names);

        for name in &names {
            let child = relative.join(name);
            let result = self.reconcile(session, &child);
            self.isolate(session, &child, result)?;
        }

        self.delete_obsolete(session, relative, source, target)
    }

    /// 删除目标目录中源目录没有的条目，以及被排除的条目
    fn delete_obsolete(
        &self,
        session: &TargetSession<'_>,
        relative: &Path,
        source: &Path,
        target: &Path,
    ) -> Result<()> {
        let mut names = storage::list_names(target).map_err(|e| SyncError::io(target, e))?;
        self.shuffle(&mut names);

        for name in &names {
            self.check_cancelled()?;

            let excluded = self.filter.should_exclude(target, &name.to_string_lossy());
            // 无法探测的源条目按存在处理
            let in_source = EntryKind::of(&source.join(name))
                .map(EntryKind::exists)
                .unwrap_or(true);
            if in_source && !excluded {
                continue;
            }

            let child = relative.join(name);
            let result = self.delete_entry(session, &child, &target.join(name));
            self.isolate(session, &child, result)?;
        }
        Ok(())
    }

    /// 复制整个新目录，完成后设置目录的修改时间
    fn copy_new_dir(
        &self,
        session: &TargetSession<'_>,
        relative: &Path,
        source: &Path,
        target: &Path,
    ) -> Result<()> {
        storage::create_dir(target).map_err(|e| SyncError::io(target, e))?;

        let mut names = self
            .filter
            .list_included(source)
            .map_err(|e| SyncError::io(source, e))?;
        self.shuffle(&mut names);

        for name in &names {
            self.check_cancelled()?;
            let child = relative.join(name);
            let result = self.copy_new_entry(session, &child, &source.join(name), &target.join(name));
            self.isolate(session, &child, result)?;
        }

        storage::copy_dir_mtime(source, target).map_err(|e| SyncError::io(target, e))
    }

    fn copy_new_entry(
        &self,
        session: &TargetSession<'_>,
        relative: &Path,
        source: &Path,
        target: &Path,
    ) -> Result<()> {
        match EntryKind::of(source).map_err(|e| SyncError::io(source, e))? {
            EntryKind::Dir => self.copy_new_dir(session, relative, source, target),
            EntryKind::File => self.copy_new_file(session, relative, source, target),
            EntryKind::Missing => Ok(()),
            EntryKind::Other => {
                session.skipped_special(relative);
                Ok(())
            }
        }
    }

    fn reconcile_file(
        &self,
        session: &TargetSession<'_>,
        relative: &Path,
        source: &Path,
        target: &Path,
    ) -> Result<()> {
        match probe(relative, target)? {
            EntryKind::File => {
                let stale = self
                    .comparator
                    .needs_update(source, target)
                    .map_err(|e| SyncError::io(source, e))?;
                if stale {
                    self.update_file(session, relative, source, target)
                } else {
                    session.file_unchanged(relative);
                    Ok(())
                }
            }
            EntryKind::Missing => self.copy_new_file(session, relative, source, target),
            EntryKind::Dir | EntryKind::Other => {
                self.delete_entry(session, relative, target)?;
                self.copy_new_file(session, relative, source, target)
            }
        }
    }

    /// 用源文件替换过期的目标文件，源文件被锁定时保留旧文件
    fn update_file(
        &self,
        session: &TargetSession<'_>,
        relative: &Path,
        source: &Path,
        target: &Path,
    ) -> Result<()> {
        match storage::copy_file(source, target).map_err(|e| SyncError::io(target, e))? {
            CopyOutcome::Copied(_) => session.file_updated(relative),
            CopyOutcome::SourceLocked => session.skipped_locked(source),
        }
        Ok(())
    }

    fn copy_new_file(
        &self,
        session: &TargetSession<'_>,
        relative: &Path,
        source: &Path,
        target: &Path,
    ) -> Result<()> {
        match storage::copy_file(source, target).map_err(|e| SyncError::io(target, e))? {
            CopyOutcome::Copied(_) => session.file_added(relative),
            CopyOutcome::SourceLocked => session.skipped_locked(source),
        }
        Ok(())
    }

    /// 删除目标条目，目录按递归文件数计入删除数
    fn delete_entry(&self, session: &TargetSession<'_>, relative: &Path, target: &Path) -> Result<()> {
        let count = match EntryKind::of(target).map_err(|e| SyncError::io(target, e))? {
            EntryKind::Dir => scanner::count_files(target),
            EntryKind::Missing => return Ok(()),
            EntryKind::File | EntryKind::Other => 1,
        };
        storage::remove_entry(target).map_err(|e| SyncError::io(target, e))?;
        session.files_deleted(relative, count);
        Ok(())
    }

    /// 单个条目失败只记录事件，取消继续向上传递
    fn isolate(&self, session: &TargetSession<'_>, relative: &Path, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                session.entry_failed(relative, &e);
                Ok(())
            }
        }
    }

    fn shuffle(&self, names: &mut [OsString]) {
        if self.randomize_order {
            names.shuffle(&mut rand::thread_rng());
        }
    }
}

/// 探测条目类型：配置的根目录跟随符号链接，其下的条目不跟随
fn probe(relative: &Path, path: &Path) -> Result<EntryKind> {
    let kind = if relative.as_os_str().is_empty() {
        EntryKind::resolve(path)
    } else {
        EntryKind::of(path)
    };
    kind.map_err(|e| SyncError::io(path, e))
}
