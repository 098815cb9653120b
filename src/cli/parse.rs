//! # parse 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/parse.rs`

use clap::Args;
use std::path::PathBuf;

/// parse 子命令参数
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Directory of a finished DFTB+ calculation
    pub dir: PathBuf,

    /// Keep results.tag (by default it is deleted after a successful read)
    #[arg(long, default_value_t = false)]
    pub keep: bool,

    /// Do not read forces from results.tag
    #[arg(long, default_value_t = false)]
    pub no_forces: bool,

    /// Structure file giving the atom count (default: dftb_pin.hsd, then geo_end.gen)
    #[arg(long)]
    pub structure: Option<PathBuf>,

    /// Save per-atom charges and forces to a CSV file
    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    /// Print eigenvalues of the given k-point (0-based)
    #[arg(long)]
    pub eigenvalues: Option<usize>,
}
