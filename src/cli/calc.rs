//! # input / run 子命令 CLI 定义
//!
//! 两个子命令共享同一组计算设置 [`CalcArgs`]。
//! 参数来源按优先级从低到高：内置默认值 < `--params-file` < `--param`。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/input.rs`, `commands/run.rs`

use clap::Args;
use std::path::PathBuf;

/// 计算设置
#[derive(Args, Debug, Clone)]
pub struct CalcArgs {
    /// Structure file (.gen, .hsd or .xyz)
    #[arg(short, long)]
    pub structure: PathBuf,

    /// Calculation directory
    #[arg(short, long, default_value = ".")]
    pub directory: PathBuf,

    /// Label of the run; DFTB+ stdout goes to <label>.out
    #[arg(long, default_value = "dftb")]
    pub label: String,

    /// DFTB+ parameter as flat KEY=VALUE, e.g. Hamiltonian_SCC=Yes (repeatable)
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// File with one KEY = VALUE per line ('#' starts a comment line)
    #[arg(long)]
    pub params_file: Option<PathBuf>,

    /// Monkhorst-Pack k-point grid, e.g. '4,4,4'
    #[arg(long, conflicts_with = "kpath")]
    pub kpts: Option<String>,

    /// Band path through fractional k-points, e.g. '0,0,0;0.5,0,0.5;0.5,0.25,0.75'
    #[arg(long)]
    pub kpath: Option<String>,

    /// Approximate number of k-points along the band path
    #[arg(long, default_value_t = 100)]
    pub npoints: usize,

    /// Directory holding the Slater-Koster files
    #[arg(long, env = "DFTB_PREFIX", default_value = "./")]
    pub slako_dir: String,

    /// DFTB+ executable (split on whitespace, no shell)
    #[arg(long = "command", env = "DFTB_COMMAND", default_value = "dftb+")]
    pub dftb_command: String,

    /// Do not add the single-point Driver defaults (MD / relaxation runs)
    #[arg(long, default_value_t = false)]
    pub many_steps: bool,

    /// External point charges as 'x y z q' rows
    #[arg(long)]
    pub point_charges: Option<PathBuf>,

    /// Add 'Analysis { CalculateForces = Yes }'
    #[arg(long, default_value_t = false)]
    pub forces: bool,
}

/// run 子命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub calc: CalcArgs,

    /// Save per-atom charges and forces to a CSV file
    #[arg(long)]
    pub output_csv: Option<PathBuf>,
}
