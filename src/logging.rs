//! 日志模块 - 控制台输出和可选的按大小轮转的日志文件

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing_subscriber::fmt::MakeWriter;

/// 日志文件名
pub const LOG_FILE_NAME: &str = "folder-sync.log";

/// 可用的日志级别
pub const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// 日志级别: "error", "warn", "info", "debug", "trace"
    pub level: String,
    /// 单个日志文件的最大大小（MB），限制在 1-100
    pub max_size_mb: u32,
    /// 日志文件目录，为空时只输出到控制台
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            max_size_mb: 5,
            dir: None,
        }
    }
}

impl LogConfig {
    pub fn new(level: &str, max_size_mb: u32, dir: Option<PathBuf>) -> Result<Self, String> {
        let level = level.to_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(format!("无效的日志级别: {}", level));
        }
        Ok(Self {
            level,
            max_size_mb: max_size_mb.clamp(1, 100),
            dir,
        })
    }

    /// 将配置的日志级别转换为 tracing Level
    pub fn tracing_level(&self) -> tracing::Level {
        match self.level.as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb as u64 * 1024 * 1024
    }
}

type SharedWriter = Arc<Mutex<Option<BufWriter<File>>>>;

fn lock(writer: &SharedWriter) -> MutexGuard<'_, Option<BufWriter<File>>> {
    writer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 带大小限制的日志写入器，超过大小时当前文件改名为 `.log.old`
#[derive(Clone)]
pub struct SizeRotatingWriter {
    file_path: PathBuf,
    max_size: u64,
    writer: SharedWriter,
}

impl SizeRotatingWriter {
    pub fn new(log_dir: &Path, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;

        let file_path = log_dir.join(LOG_FILE_NAME);
        let writer = open_file(&file_path, max_size)?;

        Ok(Self {
            file_path,
            max_size,
            writer: Arc::new(Mutex::new(Some(writer))),
        })
    }
}

fn open_file(file_path: &Path, max_size: u64) -> io::Result<BufWriter<File>> {
    if is_oversized(file_path, max_size) {
        rotate_log(file_path)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)?;
    Ok(BufWriter::new(file))
}

fn is_oversized(file_path: &Path, max_size: u64) -> bool {
    fs::metadata(file_path)
        .map(|m| m.len() > max_size)
        .unwrap_or(false)
}

/// 轮转日志文件，旧备份被覆盖
fn rotate_log(file_path: &Path) -> io::Result<()> {
    let backup_path = file_path.with_extension("log.old");
    if backup_path.exists() {
        fs::remove_file(&backup_path)?;
    }
    fs::rename(file_path, &backup_path)
}

/// 单次日志输出使用的写入器
pub struct LogWriter {
    inner: SharedWriter,
    file_path: PathBuf,
    max_size: u64,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = lock(&self.inner);
        let writer = guard
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "日志文件不可用"))?;
        let written = writer.write(buf)?;
        writer.flush()?;

        if is_oversized(&self.file_path, self.max_size) {
            guard.take();
            rotate_log(&self.file_path)?;
            *guard = Some(open_file(&self.file_path, self.max_size)?);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match lock(&self.inner).as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for SizeRotatingWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            inner: self.writer.clone(),
            file_path: self.file_path.clone(),
            max_size: self.max_size,
        }
    }
}
