//! # 统一错误处理模块
//!
//! 定义 dftbkit 的所有错误类型，使用 `thiserror` 派生。
//! 解析类错误统一携带出错的段落名与文件路径。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// dftbkit 统一错误类型
#[derive(Error, Debug)]
pub enum DftbKitError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {section} in {path}\nReason: {reason}")]
    ParseError {
        section: String,
        path: String,
        reason: String,
    },

    #[error("No usable angular momentum data for species '{species}' in {path}")]
    MissingAngularMomentumData { species: String, path: String },

    #[error("Problem in reading forces from {path}\nReason: {reason}")]
    ForceParseError { path: String, reason: String },

    #[error("Problem in reading eigenvalues from {path}\nReason: {reason}")]
    EigenvalueParseError { path: String, reason: String },

    #[error("Problem in reading Fermi levels from {path}\nReason: {reason}")]
    FermiLevelParseError { path: String, reason: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid parameter line {line}: {reason}")]
    InvalidParameter { line: usize, reason: String },

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },
}

impl DftbKitError {
    /// 构造解析错误的便捷函数
    pub fn parse(section: &str, path: &str, reason: impl Into<String>) -> Self {
        DftbKitError::ParseError {
            section: section.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, DftbKitError>;
