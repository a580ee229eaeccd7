pub mod local;

use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

pub use local::{
    copy_dir_mtime, copy_file, create_dir, is_readable, list_names, remove_entry, CopyOutcome,
};

/// 条目类型（不跟随符号链接）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// 不存在
    Missing,
    File,
    Dir,
    /// 符号链接、设备文件等
    Other,
}

impl EntryKind {
    /// 探测路径的条目类型
    pub fn of(path: &Path) -> io::Result<Self> {
        match fs::symlink_metadata(path) {
            Ok(metadata) => Ok(Self::from_metadata(&metadata)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Missing),
            Err(e) => Err(e),
        }
    }

    /// 探测路径的条目类型，跟随符号链接
    ///
    /// 用于同步目标配置的根目录：根目录可以是指向目录的链接。
    pub fn resolve(path: &Path) -> io::Result<Self> {
        match fs::metadata(path) {
            Ok(metadata) => Ok(Self::from_metadata(&metadata)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Missing),
            Err(e) => Err(e),
        }
    }

    fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }

    pub fn exists(self) -> bool {
        self != EntryKind::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"a").unwrap();

        assert_eq!(EntryKind::of(dir.path()).unwrap(), EntryKind::Dir);
        assert_eq!(EntryKind::of(&file).unwrap(), EntryKind::File);
        assert_eq!(EntryKind::of(&dir.path().join("nope")).unwrap(), EntryKind::Missing);
        assert!(!EntryKind::Missing.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_other() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(dir.path(), &link).unwrap();

        assert_eq!(EntryKind::of(&link).unwrap(), EntryKind::Other);
        assert_eq!(EntryKind::resolve(&link).unwrap(), EntryKind::Dir);

        let dangling = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("nope"), &dangling).unwrap();
        assert_eq!(EntryKind::resolve(&dangling).unwrap(), EntryKind::Missing);
    }
}
