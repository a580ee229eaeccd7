use std::path::Path;
use walkdir::WalkDir;

/// 统计路径下的文件数（目录本身不计数，不跟随符号链接）
///
/// 对单个文件返回 1，不可读的子目录被忽略。
pub fn count_files(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .count() as u64
}

/// 统计路径下所有文件的字节数
pub fn size_of(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}
