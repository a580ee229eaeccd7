use crate::config::SyncConfig;
use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::Path;
use std::time::UNIX_EPOCH;

/// 比较配置
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareConfig {
    /// 大小不同时视为需要更新
    pub compare_size: bool,
    /// CRC32 不同时视为需要更新
    pub compare_checksum: bool,
}

/// 文件比较器
#[derive(Debug, Clone, Default)]
pub struct FileComparator {
    config: CompareConfig,
}

impl FileComparator {
    pub fn with_config(config: CompareConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::with_config(CompareConfig {
            compare_size: config.compare_size,
            compare_checksum: config.compare_checksum,
        })
    }

    /// 目标文件是否需要被源文件替换
    ///
    /// 源文件修改时间更新、（启用时）大小不同或（启用时）CRC32 不同，
    /// 任一条件成立即需要更新。checksum 最耗时，放在最后计算。
    pub fn needs_update(&self, source: &Path, target: &Path) -> io::Result<bool> {
        let source_meta = fs::metadata(source)?;
        let target_meta = fs::metadata(target)?;

        if is_newer(&source_meta, &target_meta) {
            return Ok(true);
        }

        if self.config.compare_size && source_meta.len() != target_meta.len() {
            return Ok(true);
        }

        if self.config.compare_checksum && checksum_crc32(source)? != checksum_crc32(target)? {
            return Ok(true);
        }

        Ok(false)
    }
}

/// 源文件修改时间是否严格晚于目标（毫秒精度）
fn is_newer(source: &Metadata, target: &Metadata) -> bool {
    match (modified_millis(source), modified_millis(target)) {
        (Some(s), Some(t)) => s > t,
        // 无法读取修改时间时保守处理为需要更新
        _ => true,
    }
}

fn modified_millis(metadata: &Metadata) -> Option<i128> {
    let modified = metadata.modified().ok()?;
    match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => Some(d.as_millis() as i128),
        Err(e) => Some(-(e.duration().as_millis() as i128)),
    }
}

/// 计算文件内容的 CRC32
pub fn checksum_crc32(path: &Path) -> io::Result<u32> {
    let mut file = File::open(path)?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.finalize())
}
