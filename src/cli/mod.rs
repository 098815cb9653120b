//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `input`: 生成 DFTB+ 输入文件
//! - `run`: 生成输入、执行 DFTB+ 并读取结果
//! - `parse`: 读取已完成计算的结果
//! - `collect`: 汇总多个计算并按能量排序
//! - `convert`: 结构格式转换
//! - `md`: 分子动力学输出处理
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: calc, parse, collect, convert, md

pub mod calc;
pub mod collect;
pub mod convert;
pub mod md;
pub mod parse;

use clap::{Parser, Subcommand};

/// dftbkit - DFTB+ 输入生成与结果解析工具
#[derive(Parser)]
#[command(name = "dftbkit")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Input generation, execution and result parsing for DFTB+", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Write dftb_in.hsd, geo_end.gen and external charges for a structure
    Input(calc::CalcArgs),

    /// Write the input, run DFTB+ once and read the results
    Run(calc::RunArgs),

    /// Read results.tag and detailed.out of a finished calculation
    Parse(parse::ParseArgs),

    /// Collect finished calculations below a root directory and rank by energy
    Collect(collect::CollectArgs),

    /// Convert structure files between formats (.gen, .hsd, .xyz)
    Convert(convert::ConvertArgs),

    /// Extract lattices and velocities from a molecular dynamics run
    Md(md::MdArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_repeated_params() {
        let cli = Cli::try_parse_from([
            "dftbkit",
            "input",
            "-s",
            "geo.gen",
            "-p",
            "Hamiltonian_SCC=Yes",
            "--param",
            "Hamiltonian_MaxSCCIterations=100",
            "--kpts",
            "2,2,2",
        ])
        .unwrap();

        match cli.command {
            Commands::Input(args) => {
                assert_eq!(args.params.len(), 2);
                assert_eq!(args.kpts.as_deref(), Some("2,2,2"));
            }
            _ => panic!("expected input subcommand"),
        }
    }

    #[test]
    fn test_kpts_conflicts_with_kpath() {
        let result = Cli::try_parse_from([
            "dftbkit", "input", "-s", "geo.gen", "--kpts", "2,2,2", "--kpath", "0,0,0;0.5,0,0",
        ]);
        assert!(result.is_err());
    }
}
