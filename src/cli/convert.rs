//! # convert 子命令 CLI 定义
//!
//! 批量转换结构文件格式 (.gen/.hsd/.xyz -> .gen/.xyz)
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 支持的输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// DFTB+ GEN format
    Gen,
    /// XYZ format (extended comment line for periodic cells)
    Xyz,
}

impl OutputFormat {
    /// 输出文件扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Gen => "gen",
            OutputFormat::Xyz => "xyz",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// convert 子命令参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input file or directory containing structure files
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory for converted files
    #[arg(short, long)]
    pub output: PathBuf,

    /// Target output format
    #[arg(short, long, value_enum)]
    pub target: OutputFormat,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Glob patterns for input files (comma separated)
    #[arg(short, long, default_value = "*.gen,*.xyz,*.hsd")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
