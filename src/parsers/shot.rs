//! # 发次编号提取
//!
//! 从图像文件名末尾的整数提取发次编号，例如
//! `magnet0.4T_Spectrum_HeAr_0002.TIFF` → 2。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `regex`

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn trailing_number() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(\d+)\D*$").ok())
        .as_ref()
}

/// 从文件名提取发次编号，没有数字时返回 `None`
pub fn shot_number_from_path(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let captures = trailing_number()?.captures(stem)?;
    captures.get(1)?.as_str().parse().ok()
}
