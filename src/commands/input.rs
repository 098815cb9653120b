//! # input 命令实现
//!
//! 根据结构文件与参数生成 DFTB+ 输入文件。
//!
//! ## 功能
//! - 合并参数文件与 `--param` 参数
//! - 设置 k 点与外部点电荷
//! - 写出 `dftb_in.hsd`、`geo_end.gen`、`dftb_external_charges.dat`
//!
//! ## 依赖关系
//! - 使用 `cli/calc.rs` 定义的参数
//! - 使用 `calculator/`, `input/`, `parsers/`
//! - 被 `commands/run.rs` 复用

use crate::calculator::dftb::{GEOMETRY_FILE, INPUT_FILE};
use crate::calculator::{Dftb, PointChargePotential};
use crate::cli::calc::CalcArgs;
use crate::error::{DftbKitError, Result};
use crate::input::params::parse_assignment;
use crate::input::renderer::EXTERNAL_CHARGES_FILE;
use crate::input::{KPoints, ParameterSet};
use crate::models::Structure;
use crate::parsers;
use crate::utils::output;

use std::fs;

/// 执行 input 命令
pub fn execute(args: CalcArgs) -> Result<()> {
    output::print_header("Writing DFTB+ Input");

    let (calc, structure) = build_calculator(&args)?;
    write_input(&calc, &structure)?;

    output::print_done(&format!(
        "Input for {} ({} atoms) written to '{}'",
        structure.formula(),
        structure.len(),
        calc.directory().display()
    ));
    Ok(())
}

/// 合并参数来源：参数文件在前，命令行参数覆盖
pub fn collect_parameters(args: &CalcArgs) -> Result<ParameterSet> {
    let mut params = match &args.params_file {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| DftbKitError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
            ParameterSet::from_kv_text(&text)?
        }
        None => ParameterSet::new(),
    };

    for entry in &args.params {
        let (key, value) = parse_assignment(entry).map_err(DftbKitError::InvalidArgument)?;
        params.set(key, value);
    }
    Ok(params)
}

/// k 点设置：`--kpts` 或 `--kpath`
pub fn kpoints_from_args(args: &CalcArgs) -> Result<Option<KPoints>> {
    if let Some(grid) = &args.kpts {
        return Ok(Some(KPoints::MonkhorstPack(KPoints::parse_grid(grid)?)));
    }
    if let Some(path) = &args.kpath {
        return Ok(Some(KPoints::BandPath {
            points: KPoints::parse_path(path)?,
            npoints: args.npoints,
        }));
    }
    Ok(None)
}

/// 由命令行参数构造计算器并读取结构
pub fn build_calculator(args: &CalcArgs) -> Result<(Dftb, Structure)> {
    let structure = parsers::parse_structure_file(&args.structure)?;
    output::print_info(&format!(
        "Structure: {} ({} atoms{})",
        structure.formula(),
        structure.len(),
        if structure.is_periodic() { ", periodic" } else { "" }
    ));

    let mut calc = Dftb::new(&args.directory, args.many_steps)
        .with_label(&args.label)
        .with_slako_dir(&args.slako_dir)
        .with_command(&args.dftb_command)
        .with_forces(args.forces);
    calc.set_parameters(&collect_parameters(args)?);

    if let Some(kpoints) = kpoints_from_args(args)? {
        calc = calc.with_kpoints(kpoints);
    }

    if let Some(path) = &args.point_charges {
        let pcpot = PointChargePotential::from_file(path)?;
        output::print_info(&format!("Embedding {} external point charges", pcpot.len()));
        calc = calc.embed(pcpot);
    }

    Ok((calc, structure))
}

/// 写出输入文件并打印警告
pub fn write_input(calc: &Dftb, structure: &Structure) -> Result<()> {
    for warning in calc.write_input(structure)? {
        output::print_warning(&warning);
    }

    let dir = calc.directory();
    output::print_written(&dir.join(INPUT_FILE));
    output::print_written(&dir.join(GEOMETRY_FILE));
    if calc.pcpot().is_some_and(|p| !p.is_empty()) {
        output::print_written(&dir.join(EXTERNAL_CHARGES_FILE));
    }
    output::print_info(&format!(
        "Slater-Koster files from '{}', {} spin channel(s)",
        calc.slako_dir(),
        calc.nspin()
    ));
    Ok(())
}
