//! 错误类型

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 同步过程中的错误
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("配置错误: 源路径 '{0}' 不包含分隔符 '/'")]
    SourceWithoutSeparator(String),

    #[error("配置错误: 无法从源路径 '{0}' 得到目录名")]
    SourceWithoutName(String),

    #[error("目标文件夹 '{}' 不存在", .0.display())]
    TargetParentMissing(PathBuf),

    #[error("目标 '{}' 不是文件夹", .0.display())]
    TargetParentNotDir(PathBuf),

    #[error("目标文件夹 '{}' 不可写", .0.display())]
    TargetParentReadOnly(PathBuf),

    #[error("源 '{}' 不存在", .0.display())]
    SourceMissing(PathBuf),

    #[error("源 '{}' 不可读", .0.display())]
    SourceUnreadable(PathBuf),

    #[error("配置文件 '{}' 不存在或不可读: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("配置文件 '{}' 格式错误: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("同步目标 '{0}' 未设置 source 或 sources")]
    TargetWithoutSource(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("同步已取消")]
    Cancelled,
}

impl SyncError {
    /// 包装 I/O 错误并附带路径
    pub fn io(path: &Path, source: io::Error) -> Self {
        SyncError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
