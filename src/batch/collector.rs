//! # 文件收集器
//!
//! 根据输入路径和模式收集待处理的帧文件列表。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - glob 模式匹配（不区分大小写，逗号分隔多模式）
//! - 递归目录搜索
//! - 结果按路径排序，保证发次顺序稳定
//!
//! ## 依赖关系
//! - 被 `commands/deconvolve.rs`, `commands/serve.rs` 调用
//! - 使用 `walkdir` 遍历目录, `glob` 匹配文件名

use crate::error::{EspecError, Result};

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// 文件收集器
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: Vec::new(),
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s)
                    .map_err(|e| EspecError::InvalidConfig(format!("bad glob pattern '{s}': {e}")))
            })
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件
    pub fn collect(&self) -> Vec<PathBuf> {
        if self.input.is_file() {
            return vec![self.input.clone()];
        }

        if !self.input.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|entry| self.matches_patterns(entry.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();
        files
    }

    /// 检查文件是否匹配任一模式（无模式时全部匹配）
    fn matches_patterns(&self, path: &Path) -> bool {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };

        self.patterns.is_empty()
            || self
                .patterns
                .iter()
                .any(|p| p.matches_with(filename, MATCH_OPTIONS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_pattern_matching() {
        let collector = FileCollector::new(PathBuf::from("."))
            .with_pattern("*.tif, *.tiff,*.png")
            .unwrap();
        assert!(collector.matches_patterns(Path::new("shot_0001.TIFF")));
        assert!(collector.matches_patterns(Path::new("a/b/frame.png")));
        assert!(!collector.matches_patterns(Path::new("dsdE_Small_LHC.txt")));

        let single = FileCollector::new(PathBuf::from("."))
            .with_pattern("shot_00?.tif")
            .unwrap();
        assert!(single.matches_patterns(Path::new("shot_001.tif")));
        assert!(!single.matches_patterns(Path::new("shot_0001.tif")));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(FileCollector::new(PathBuf::from("."))
            .with_pattern("[unclosed")
            .is_err());
    }

    #[test]
    fn test_collect_sorted_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shot_0002.png"), b"").unwrap();
        fs::write(dir.path().join("shot_0001.png"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("run2")).unwrap();
        fs::write(dir.path().join("run2").join("shot_0003.png"), b"").unwrap();

        let flat = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.png")
            .unwrap()
            .collect();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["shot_0001.png", "shot_0002.png"]);

        let deep = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.png")
            .unwrap()
            .recursive(true)
            .collect();
        assert_eq!(deep.len(), 3);
    }
}
