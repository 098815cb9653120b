//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `calculator/`, `input/`, `parsers/`, `models/`, `utils/`
//! - 子模块: input, run, parse, collect, convert, md；`report` 为共用的表格输出

pub mod collect;
pub mod convert;
pub mod input;
pub mod md;
pub mod parse;
pub mod report;
pub mod run;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Input(args) => input::execute(args),
        Commands::Run(args) => run::execute(args),
        Commands::Parse(args) => parse::execute(args),
        Commands::Collect(args) => collect::execute(args),
        Commands::Convert(args) => convert::execute(args),
        Commands::Md(args) => md::execute(args),
    }
}
