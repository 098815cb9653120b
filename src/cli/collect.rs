//! # collect 子命令 CLI 定义
//!
//! 收集多个 DFTB+ 计算目录的结果并按能量排序
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/collect.rs`

use clap::Args;
use std::path::PathBuf;

/// collect 子命令参数
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Root directory containing one DFTB+ calculation per subdirectory
    pub root: PathBuf,

    /// CSV file for the full ranking
    #[arg(long, default_value = "dftb_ranking.csv")]
    pub output_csv: PathBuf,

    /// Number of top structures to print
    #[arg(long, default_value_t = 10)]
    pub top_n: usize,

    /// Do not read forces from results.tag
    #[arg(long, default_value_t = false)]
    pub no_forces: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,
}
