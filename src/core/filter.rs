//! 排除规则：文件名、路径片段、扩展名

use crate::config::SyncConfig;
use std::ffi::OsString;
use std::io;
use std::path::Path;

/// 排除规则
///
/// 条目命中任意一条规则即被排除。空字符串不作为规则。
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// 精确匹配的文件名
    filenames: Vec<String>,
    /// 匹配 `父目录/文件名` 完整路径的子串
    path_substrings: Vec<String>,
    /// 扩展名（最后一个 `.` 之后的部分，不区分大小写）
    extensions: Vec<String>,
}

impl FilterSpec {
    pub fn new(filenames: Vec<String>, path_substrings: Vec<String>, extensions: Vec<String>) -> Self {
        fn non_empty(list: Vec<String>) -> Vec<String> {
            list.into_iter().filter(|s| !s.is_empty()).collect()
        }

        Self {
            filenames: non_empty(filenames),
            path_substrings: non_empty(path_substrings),
            extensions: non_empty(extensions)
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.filename_filter.clone(),
            config.path_filter.clone(),
            config.extension_filter.clone(),
        )
    }

    /// 检查 `parent` 目录下名为 `name` 的条目是否应该被排除
    pub fn should_exclude(&self, parent: &Path, name: &str) -> bool {
        if self.filenames.iter().any(|f| f == name) {
            return true;
        }

        if !self.path_substrings.is_empty() {
            let full_path = format!("{}/{}", parent.display(), name);
            if self.path_substrings.iter().any(|p| full_path.contains(p.as_str())) {
                return true;
            }
        }

        if let Some((_, ext)) = name.rsplit_once('.') {
            let ext = ext.to_lowercase();
            if self.extensions.iter().any(|e| *e == ext) {
                return true;
            }
        }

        false
    }

    /// 列出目录下未被排除的条目名
    pub fn list_included(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        let names = crate::storage::list_names(dir)?;
        Ok(names
            .into_iter()
            .filter(|name| !self.should_exclude(dir, &name.to_string_lossy()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filename_exact_match() {
        let filter = FilterSpec::new(strings(&["Thumbs.db"]), vec![], vec![]);
        let parent = Path::new("/data");

        assert!(filter.should_exclude(parent, "Thumbs.db"));
        assert!(!filter.should_exclude(parent, "thumbs.db"));
        assert!(!filter.should_exclude(parent, "Thumbs.db.bak"));
    }

    #[test]
    fn test_path_substring() {
        let filter = FilterSpec::new(vec![], strings(&["/cache/"]), vec![]);

        assert!(filter.should_exclude(Path::new("/home/me/cache"), "x.bin"));
        assert!(!filter.should_exclude(Path::new("/home/me"), "cache"));
        assert!(filter.should_exclude(Path::new("/home/me/cache/deep"), "y"));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let filter = FilterSpec::new(vec![], vec![], strings(&["pdf"]));
        let parent = Path::new("/docs");

        assert!(filter.should_exclude(parent, "Report.PDF"));
        assert!(filter.should_exclude(parent, "a.b.pdf"));
        assert!(!filter.should_exclude(parent, "pdf"));
        assert!(!filter.should_exclude(parent, "report.pdfx"));

        let upper = FilterSpec::new(vec![], vec![], strings(&["TMP"]));
        assert!(upper.should_exclude(parent, "scratch.tmp"));
    }

    #[test]
    fn test_empty_entries_never_match() {
        let filter = FilterSpec::new(strings(&[""]), strings(&[""]), strings(&[""]));

        assert!(filter.filenames.is_empty());
        assert!(filter.path_substrings.is_empty());
        assert!(filter.extensions.is_empty());
        assert!(!filter.should_exclude(Path::new("/x"), "file."));
        assert!(!filter.should_exclude(Path::new("/x"), ""));
    }

    #[test]
    fn test_list_included() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), b"1").unwrap();
        fs::write(dir.path().join("skip.tmp"), b"2").unwrap();
        fs::write(dir.path().join(".DS_Store"), b"3").unwrap();
        let filter = FilterSpec::new(strings(&[".DS_Store"]), vec![], strings(&["tmp"]));

        let names = filter.list_included(dir.path()).unwrap();

        assert_eq!(names, vec![OsString::from("keep.txt")]);
    }
}
