//! # 输出文件文档对象
//!
//! 将 DFTB+ 输出文件一次性读入为不可变的行序列，
//! 各个提取函数显式接收该对象并按标记子串定位段落。
//!
//! ## 依赖关系
//! - 被 `parsers/results_tag.rs`, `parsers/detailed_out.rs`, `parsers/md_out.rs` 使用

use crate::error::{DftbKitError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// 只读的输出文件内容
#[derive(Debug, Clone)]
pub struct OutputDocument {
    path: String,
    lines: Vec<String>,
}

impl OutputDocument {
    /// 读取文件；文件不存在时返回 `FileNotFound`
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                DftbKitError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                DftbKitError::FileReadError {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })?;

        Ok(Self::from_text(&content, path.display().to_string()))
    }

    /// 从内存中的文本构造
    pub fn from_text(content: &str, path: impl Into<String>) -> Self {
        OutputDocument {
            path: path.into(),
            lines: content.lines().map(|l| l.to_string()).collect(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|l| l.as_str())
    }

    /// 第一个包含 `marker` 的行号
    pub fn find(&self, marker: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.contains(marker))
    }

    /// 第一个满足条件的行号
    pub fn find_by<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.lines.iter().position(|l| predicate(l))
    }

    /// 最后一个满足条件的行号
    pub fn rfind_by<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.lines.iter().rposition(|l| predicate(l))
    }
}

/// 将一行按空白切分并全部解析为浮点数
pub fn parse_floats(line: &str) -> std::result::Result<Vec<f64>, String> {
    line.split_whitespace()
        .map(|w| {
            w.parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", w))
        })
        .collect()
}
