//! 同步命令：加载配置文件并运行其中的所有同步目标

use crate::config::SyncConfig;
use crate::core::{CancelFlag, EventSink, RunReport, SyncEngine, SyncOrchestrator, TargetPair};
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 运行一个配置
pub async fn run_config(config: &SyncConfig, sink: Arc<dyn EventSink>, cancel: CancelFlag) -> RunReport {
    if config.keep_history > 0 {
        warn!("keepHistory 暂不支持，已忽略 (keepHistory = {})", config.keep_history);
    }

    let pairs = TargetPair::from_config(config, sink.as_ref());
    let engine = Arc::new(SyncEngine::new(config, sink, cancel));
    SyncOrchestrator::new(engine).run(pairs).await
}

/// 加载并运行一个配置文件
pub async fn run_config_file(path: &Path, sink: Arc<dyn EventSink>, cancel: CancelFlag) -> Result<RunReport> {
    let config = SyncConfig::load(path)?;
    info!("加载配置文件: {}", path.display());
    Ok(run_config(&config, sink, cancel).await)
}

/// 依次运行多个配置文件
///
/// 单个配置文件加载失败时记录错误并继续下一个；取消后不再开始新的配置文件。
pub async fn run_config_files(paths: &[PathBuf], sink: Arc<dyn EventSink>, cancel: CancelFlag) -> RunReport {
    let mut report = RunReport::default();

    for path in paths {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        match run_config_file(path, sink.clone(), cancel.clone()).await {
            Ok(run) => report.merge(run),
            Err(e) => error!("{}", e),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{MemorySink, SyncEvent};
    use crate::core::PairStatus;
    use std::fs;

    fn write_config(path: &Path, json: serde_json::Value) {
        fs::write(path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    }

    fn s(path: &Path) -> String {
        path.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_missing_config_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.txt"), b"a").unwrap();
        let good = dir.path().join("good.json");
        write_config(
            &good,
            serde_json::json!({
                "interactive": false,
                "targets": [{ "source": s(&source), "target": s(&dir.path().join("dst")) }]
            }),
        );
        let paths = vec![dir.path().join("missing.json"), good];
        let sink = Arc::new(MemorySink::default());

        let report = run_config_files(&paths, sink, CancelFlag::new()).await;

        assert!(!report.cancelled);
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.pairs[0].added, 1);
        assert!(dir.path().join("dst").join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_invalid_pair_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.txt"), b"a").unwrap();
        let config: SyncConfig = serde_json::from_value(serde_json::json!({
            "interactive": false,
            "keepHistory": 2,
            "targets": [
                { "source": "nodir", "target": s(&dir.path().join("x")) },
                { "source": s(&source), "target": s(&dir.path().join("no").join("parent")) },
                { "target": s(&dir.path().join("y")) },
                { "source": s(&source), "target": s(&dir.path().join("ok")) }
            ]
        }))
        .unwrap();
        let sink = Arc::new(MemorySink::default());

        let report = run_config(&config, sink.clone(), CancelFlag::new()).await;

        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.pairs[0].status, PairStatus::Completed);
        assert!(dir.path().join("ok").join("a.txt").exists());
        assert_eq!(
            sink.count(|e| matches!(e, SyncEvent::PairRejected { .. })),
            3
        );
    }

    #[tokio::test]
    async fn test_multi_source_targets() {
        let dir = tempfile::tempdir().unwrap();
        let foo = dir.path().join("a").join("foo");
        let bar = dir.path().join("b").join("bar");
        fs::create_dir_all(&foo).unwrap();
        fs::create_dir_all(&bar).unwrap();
        fs::write(foo.join("1"), b"foo").unwrap();
        fs::write(bar.join("2"), b"bar").unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let config: SyncConfig = serde_json::from_value(serde_json::json!({
            "interactive": false,
            "targets": [{ "sources": [s(&foo), s(&bar)], "target": s(&out) }]
        }))
        .unwrap();

        let report = run_config(&config, Arc::new(MemorySink::default()), CancelFlag::new()).await;

        assert_eq!(report.pairs.len(), 2);
        assert_eq!(fs::read(out.join("foo").join("1")).unwrap(), b"foo");
        assert_eq!(fs::read(out.join("bar").join("2")).unwrap(), b"bar");
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("c.json");
        write_config(&config, serde_json::json!({ "targets": [] }));
        let cancel = CancelFlag::new();
        cancel.cancel();

        let report =
            run_config_files(&[config], Arc::new(MemorySink::default()), cancel).await;

        assert!(report.cancelled);
        assert!(report.pairs.is_empty());
    }
}
