//! # 结果展示
//!
//! `run` 与 `parse` 共用的结果表格与 CSV 导出。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs`, `commands/parse.rs` 使用
//! - 使用 `tabled` 绘制表格，`csv` 导出

use crate::error::{DftbKitError, Result};
use crate::models::{DftbResults, Structure};
use crate::utils::output;

use serde::Serialize;
use std::path::Path;
use tabled::{Table, Tabled};

/// 汇总表的一行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// 逐原子结果
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct AtomRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Element")]
    pub element: String,
    #[tabled(rename = "Charge (e)")]
    #[serde(rename = "charge_e")]
    pub charge: String,
    #[tabled(rename = "Fx (eV/Å)")]
    #[serde(rename = "fx_eV_A")]
    pub fx: String,
    #[tabled(rename = "Fy (eV/Å)")]
    #[serde(rename = "fy_eV_A")]
    pub fy: String,
    #[tabled(rename = "Fz (eV/Å)")]
    #[serde(rename = "fz_eV_A")]
    pub fz: String,
}

fn summary_rows(results: &DftbResults, natoms: usize) -> Vec<SummaryRow> {
    let row = |quantity: &str, value: String| SummaryRow {
        quantity: quantity.to_string(),
        value,
    };

    let mut rows = vec![row("Total energy (eV)", format!("{:.6}", results.energy))];
    if let Some(per_atom) = results.energy_per_atom(natoms) {
        rows.push(row("Energy per atom (eV)", format!("{:.6}", per_atom)));
    }
    if let Some(fermi) = &results.fermi_levels {
        let levels: Vec<String> = fermi.iter().map(|e| format!("{:.6}", e)).collect();
        rows.push(row("Fermi level(s) (eV)", levels.join(", ")));
    }
    if let Some(max_force) = results.max_force() {
        rows.push(row("Max force (eV/Å)", format!("{:.6}", max_force)));
    }
    if let Some([dx, dy, dz]) = results.dipole {
        rows.push(row(
            "Dipole (e·Å)",
            format!("{:.6} {:.6} {:.6}", dx, dy, dz),
        ));
    }
    if let Some(stress) = results.stress {
        let voigt: Vec<String> = stress.iter().map(|s| format!("{:.6}", s)).collect();
        rows.push(row("Stress (eV/Å³, Voigt)", voigt.join(" ")));
    }
    if let Some(eigenvalues) = &results.eigenvalues {
        let nband = eigenvalues
            .first()
            .and_then(|k| k.first())
            .map(Vec::len)
            .unwrap_or(0);
        rows.push(row(
            "Eigenvalues (k × spin × band)",
            format!(
                "{} × {} × {}",
                eigenvalues.len(),
                results.nspin().unwrap_or(0),
                nband
            ),
        ));
    }
    rows
}

/// 组装逐原子行；缺失的量显示为 `-`
pub fn atom_rows(results: &DftbResults, structure: &Structure) -> Vec<AtomRow> {
    let fmt = |v: Option<f64>| v.map(|x| format!("{:.6}", x)).unwrap_or_else(|| "-".to_string());

    structure
        .atoms
        .iter()
        .enumerate()
        .map(|(i, atom)| {
            let charge = results.charges.as_ref().and_then(|c| c.get(i)).copied();
            let force = results.forces.as_ref().and_then(|f| f.get(i)).copied();
            AtomRow {
                index: i + 1,
                element: atom.element.clone(),
                charge: fmt(charge),
                fx: fmt(force.map(|f| f[0])),
                fy: fmt(force.map(|f| f[1])),
                fz: fmt(force.map(|f| f[2])),
            }
        })
        .collect()
}

/// 打印汇总表与逐原子表
pub fn print_results(results: &DftbResults, structure: &Structure) {
    output::print_header(&format!(
        "DFTB+ Results: {} ({} atoms)",
        structure.formula(),
        structure.len()
    ));
    println!("{}", Table::new(summary_rows(results, structure.len())));

    if results.charges.is_some() || results.forces.is_some() {
        println!();
        println!("{}", Table::new(atom_rows(results, structure)));
    } else {
        output::print_skip("No charges or forces to show");
    }
}

/// 打印某个 k 点所有自旋通道的本征值
pub fn print_eigenvalues(results: &DftbResults, kpt: usize) -> Result<()> {
    let nspin = results.nspin().ok_or_else(|| {
        DftbKitError::InvalidArgument("no eigenvalues in results.tag".to_string())
    })?;

    for spin in 0..nspin {
        let values = results.eigenvalues_at(kpt, spin).ok_or_else(|| {
            DftbKitError::InvalidArgument(format!("k-point index {} out of range", kpt))
        })?;
        output::print_info(&format!("k-point {}, spin {} (eV):", kpt, spin));
        for chunk in values.chunks(6) {
            let line: Vec<String> = chunk.iter().map(|e| format!("{:12.6}", e)).collect();
            println!("  {}", line.join(""));
        }
    }
    Ok(())
}

/// 保存逐原子 CSV
pub fn save_atoms_csv(results: &DftbResults, structure: &Structure, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in atom_rows(results, structure) {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| DftbKitError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}
