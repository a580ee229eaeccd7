//! 本地文件系统操作

use filetime::FileTime;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::Path;

/// 临时文件前缀，复制完成前数据写在这里；文件名其余部分随机，长度固定
const TEMP_PREFIX: &str = ".fs-";

/// 复制结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// 复制完成，返回字节数
    Copied(u64),
    /// 源文件被锁定或不可读，目标未被改动
    SourceLocked,
}

/// 列出目录下的所有条目名
pub fn list_names(dir: &Path) -> io::Result<Vec<OsString>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        names.push(entry?.file_name());
    }
    Ok(names)
}

/// 路径当前是否可读（目录可列出，文件可打开）
pub fn is_readable(path: &Path) -> bool {
    if path.is_dir() {
        fs::read_dir(path).is_ok()
    } else {
        File::open(path).is_ok()
    }
}

/// 复制文件并保留修改时间
///
/// 先写入同目录下随机命名的临时文件，写完后再重命名为目标文件，
/// 中途中断时目标文件要么是旧内容，要么是完整的新内容。
/// 临时文件名长度与目标文件名无关，也不会覆盖已存在的文件。
pub fn copy_file(source: &Path, target: &Path) -> io::Result<CopyOutcome> {
    let mut reader = match File::open(source) {
        Ok(f) => f,
        Err(e) if is_locked_error(&e) => return Ok(CopyOutcome::SourceLocked),
        Err(e) => return Err(e),
    };
    let metadata = reader.metadata()?;

    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    // 出错时临时文件随 NamedTempFile 一起删除
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(parent)?;
    let bytes = io::copy(&mut reader, &mut temp)?;

    filetime::set_file_handle_times(
        temp.as_file(),
        None,
        Some(FileTime::from_last_modification_time(&metadata)),
    )?;
    temp.as_file().set_permissions(metadata.permissions())?;
    temp.persist(target).map_err(|e| e.error)?;

    Ok(CopyOutcome::Copied(bytes))
}

/// 打开失败是否属于"文件被锁定/不可读"
fn is_locked_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound
    )
}

/// 删除文件或目录（目录递归删除，符号链接只删除链接本身）
pub fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

pub fn create_dir(path: &Path) -> io::Result<()> {
    fs::create_dir(path)
}

/// 将源目录的修改时间设置到目标目录
pub fn copy_dir_mtime(source: &Path, target: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    filetime::set_file_mtime(target, FileTime::from_last_modification_time(&metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_preserves_content_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        fs::write(&source, b"hello").unwrap();
        let mtime = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&source, mtime).unwrap();

        let outcome = copy_file(&source, &target).unwrap();

        assert_eq!(outcome, CopyOutcome::Copied(5));
        assert_eq!(fs::read(&target).unwrap(), b"hello");
        let copied = FileTime::from_last_modification_time(&fs::metadata(&target).unwrap());
        assert_eq!(copied, mtime);
        assert_eq!(list_names(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_copy_long_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let source_dir = dir.path().join("s");
        let target_dir = dir.path().join("t");
        create_dir(&source_dir).unwrap();
        create_dir(&target_dir).unwrap();
        let name = "a".repeat(250);
        fs::write(source_dir.join(&name), b"long").unwrap();

        let outcome = copy_file(&source_dir.join(&name), &target_dir.join(&name)).unwrap();

        assert_eq!(outcome, CopyOutcome::Copied(4));
        assert_eq!(fs::read(target_dir.join(&name)).unwrap(), b"long");
        assert_eq!(list_names(&target_dir).unwrap().len(), 1);
    }

    #[test]
    fn test_copy_leaves_similar_names_alone() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a");
        let target = dir.path().join("b");
        let neighbour = dir.path().join(".folder-sync-b.tmp");
        let prefixed = dir.path().join(".fs-b.tmp");
        fs::write(&source, b"new").unwrap();
        fs::write(&neighbour, b"mirrored").unwrap();
        fs::write(&prefixed, b"also mirrored").unwrap();

        copy_file(&source, &target).unwrap();

        assert_eq!(fs::read(&neighbour).unwrap(), b"mirrored");
        assert_eq!(fs::read(&prefixed).unwrap(), b"also mirrored");
        assert_eq!(list_names(dir.path()).unwrap().len(), 4);
    }

    #[test]
    fn test_copy_replaces_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a");
        let target = dir.path().join("b");
        fs::write(&source, b"new content").unwrap();
        fs::write(&target, b"old").unwrap();

        copy_file(&source, &target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new content");
    }

    #[test]
    fn test_copy_missing_source_is_locked() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("b");
        fs::write(&target, b"keep").unwrap();

        let outcome = copy_file(&dir.path().join("missing"), &target).unwrap();

        assert_eq!(outcome, CopyOutcome::SourceLocked);
        assert_eq!(fs::read(&target).unwrap(), b"keep");
    }

    #[test]
    fn test_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, b"x").unwrap();

        assert!(is_readable(dir.path()));
        assert!(is_readable(&file));
        assert!(!is_readable(&dir.path().join("missing")));
    }

    #[test]
    fn test_remove_entry() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(sub.join("nested")).unwrap();
        fs::write(sub.join("nested").join("f"), b"x").unwrap();
        let file = dir.path().join("f");
        fs::write(&file, b"x").unwrap();

        remove_entry(&sub).unwrap();
        remove_entry(&file).unwrap();

        assert!(list_names(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_copy_dir_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("s");
        let target = dir.path().join("t");
        create_dir(&source).unwrap();
        create_dir(&target).unwrap();
        let mtime = FileTime::from_unix_time(1_400_000_000, 0);
        filetime::set_file_mtime(&source, mtime).unwrap();

        copy_dir_mtime(&source, &target).unwrap();

        let copied = FileTime::from_last_modification_time(&fs::metadata(&target).unwrap());
        assert_eq!(copied, mtime);
    }
}
