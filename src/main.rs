//! # dftbkit - DFTB+ 计算驱动与结果工具箱
//!
//! 生成 DFTB+ 输入、执行单点计算、解析结果，单一可执行文件。
//!
//! ## 子命令
//! - `input`   - 写出 `dftb_in.hsd` 与 `geo_end.gen`
//! - `run`     - 写输入、运行 DFTB+ 并读取结果
//! - `parse`   - 解析已完成计算目录中的结果
//! - `collect` - 并行收集多个计算并按能量排序
//! - `convert` - 结构格式转换 (.gen, .hsd, .xyz)
//! - `md`      - 分子动力学晶格历史与速度导出
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── calculator/ (DFTB+ 计算器与外部点电荷)
//!   │     ├── input/      (参数集、k 点、dftb_in.hsd 渲染)
//!   │     ├── parsers/    (结果与结构格式解析)
//!   │     ├── batch/      (批量文件处理)
//!   │     └── models/     (数据模型)
//!   ├── utils/      (输出与进度条)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod calculator;
mod cli;
mod commands;
mod error;
mod input;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
