use anyhow::Context;
use clap::Parser;
use foldersync_lib::commands::run_config_files;
use foldersync_lib::logging::{LogConfig, SizeRotatingWriter, LEVELS};
use foldersync_lib::{run_with_shutdown, CancelFlag, TracingSink, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

/// 单向文件夹镜像：让目标目录与源目录保持一致
#[derive(Debug, Parser)]
#[command(name = "folder-sync", version, about)]
struct Cli {
    /// 配置文件，按顺序运行（默认为当前目录下的 folder-sync.json）
    configs: Vec<PathBuf>,

    /// 日志级别
    #[arg(long, default_value = "info", value_parser = clap::builder::PossibleValuesParser::new(LEVELS))]
    log_level: String,

    /// 日志文件目录，不指定时只输出到控制台
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// 单个日志文件的最大大小（MB）
    #[arg(long, default_value_t = 5)]
    log_max_size_mb: u32,

    /// 运行结束后将 JSON 格式的报告写入该文件
    #[arg(long)]
    report: Option<PathBuf>,
}

/// 初始化日志系统
fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(config.tracing_level().into())
        .from_env_lossy();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let file_layer = match &config.dir {
        Some(dir) => {
            let writer = SizeRotatingWriter::new(dir, config.max_size_bytes())
                .with_context(|| format!("无法创建日志文件目录 {}", dir.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("初始化日志失败")
}

/// 等待 Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = match LogConfig::new(&cli.log_level, cli.log_max_size_mb, cli.log_dir.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    let configs = if cli.configs.is_empty() {
        vec![PathBuf::from(DEFAULT_CONFIG_FILE)]
    } else {
        cli.configs
    };

    let cancel = CancelFlag::new();
    let sink = Arc::new(TracingSink::new());
    let report = run_with_shutdown(
        run_config_files(&configs, sink, cancel.clone()),
        shutdown_signal(),
        &cancel,
    )
    .await;

    if let Some(path) = &cli.report {
        match report.save(path) {
            Ok(()) => info!("运行报告已写入 {}", path.display()),
            Err(e) => error!("写入运行报告失败: {}", e),
        }
    }

    if report.cancelled {
        ExitCode::from(130)
    } else {
        ExitCode::SUCCESS
    }
}
