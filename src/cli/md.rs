//! # md 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/md.rs`

use clap::Args;
use std::path::PathBuf;

/// md 子命令参数
#[derive(Args, Debug)]
pub struct MdArgs {
    /// Directory of a DFTB+ molecular dynamics run
    pub dir: PathBuf,

    /// MD log holding 'Lattice vectors' blocks (relative to DIR)
    #[arg(long, default_value = "md.out")]
    pub md_out: PathBuf,

    /// Trajectory written by DFTB+ (relative to DIR)
    #[arg(long, default_value = "geo_end.xyz")]
    pub trajectory: PathBuf,

    /// Write the trajectory with per-frame lattices to this XYZ file
    #[arg(long)]
    pub export_xyz: Option<PathBuf>,

    /// Write the final velocities in atomic units to this file
    #[arg(long)]
    pub velocities_out: Option<PathBuf>,
}
