//! 同步配置文件
//!
//! 一个配置文件对应一次同步运行，包含比较选项、排除规则和若干同步目标。

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 未指定配置文件时读取的文件名
pub const DEFAULT_CONFIG_FILE: &str = "folder-sync.json";

/// 同步配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// 大小不同时更新文件
    #[serde(default)]
    pub compare_size: bool,
    /// CRC32 不同时更新文件
    #[serde(default)]
    pub compare_checksum: bool,
    /// 随机处理每个目录下的条目顺序
    #[serde(default, rename = "random")]
    pub randomize_order: bool,
    /// 保留历史版本数（暂不支持，仅读取）
    #[serde(default)]
    pub keep_history: u32,
    /// 交互模式：输出单行进度
    #[serde(default = "default_interactive")]
    pub interactive: bool,
    #[serde(default)]
    pub filename_filter: Vec<String>,
    #[serde(default)]
    pub path_filter: Vec<String>,
    #[serde(default)]
    pub extension_filter: Vec<String>,
    #[serde(default)]
    pub targets: Vec<TargetEntry>,
}

fn default_interactive() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            compare_size: false,
            compare_checksum: false,
            randomize_order: false,
            keep_history: 0,
            interactive: default_interactive(),
            filename_filter: Vec::new(),
            path_filter: Vec::new(),
            extension_filter: Vec::new(),
            targets: Vec::new(),
        }
    }
}

/// 配置文件中的一个同步目标
///
/// `source` 为单个源目录；`sources` 为多个源目录，
/// 每个源同步到 `target/源目录名`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEntry {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

/// 展开后的 (源, 目标, 是否多源) 三元组
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSpec {
    pub source: String,
    pub target: String,
    pub multi_source: bool,
}

impl SyncConfig {
    /// 从文件加载配置
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| SyncError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SyncError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 按配置顺序展开所有同步目标
    pub fn pair_specs(&self) -> Vec<Result<PairSpec>> {
        let mut specs = Vec::new();
        for entry in &self.targets {
            if entry.source.is_none() && entry.sources.is_empty() {
                specs.push(Err(SyncError::TargetWithoutSource(entry.target.clone())));
                continue;
            }
            if let Some(source) = &entry.source {
                specs.push(Ok(PairSpec {
                    source: source.clone(),
                    target: entry.target.clone(),
                    multi_source: false,
                }));
            }
            for source in &entry.sources {
                specs.push(Ok(PairSpec {
                    source: source.clone(),
                    target: entry.target.clone(),
                    multi_source: true,
                }));
            }
        }
        specs
    }
}
