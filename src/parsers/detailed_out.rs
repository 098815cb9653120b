//! # DFTB+ detailed.out 解析器
//!
//! 从人类可读的详细输出中提取总能量、原子净电荷、偶极矩
//! 以及外部点电荷受力。
//!
//! ## 依赖关系
//! - 被 `parsers/outputs.rs`, `calculator/pcpot.rs` 使用
//! - 使用 `parsers/document.rs`, `models/units.rs`

use super::document::{parse_floats, OutputDocument};
use crate::error::{DftbKitError, Result};
use crate::models::units::{BOHR, FORCE_UNIT, HARTREE};

/// 解析总能量 (eV)
///
/// "Total energy:                      -4.0779379326 H         -110.9665 eV"
pub fn parse_energy(doc: &OutputDocument) -> Result<f64> {
    let line = doc
        .find_by(|l| l.trim().starts_with("Total energy:"))
        .and_then(|i| doc.line(i))
        .ok_or_else(|| DftbKitError::parse("Total energy", doc.path(), "line not found"))?;

    line.split_whitespace()
        .nth(2)
        .and_then(|w| w.parse::<f64>().ok())
        .map(|e| e * HARTREE)
        .ok_or_else(|| {
            DftbKitError::parse("Total energy", doc.path(), format!("bad value in '{}'", line))
        })
}

/// 电荷段落的表头：新旧版本分别为 "Net charge" 与 "Charge"
fn is_charge_header(line: &str) -> bool {
    line.contains("Atom") && (line.contains("Net charge") || line.contains("Charge"))
}

/// 解析原子净电荷；找不到电荷段（SCC 关闭）时返回 `None`
pub fn parse_charges(doc: &OutputDocument, natoms: usize) -> Result<Option<Vec<f64>>> {
    let Some(header) = doc.find_by(is_charge_header) else {
        return Ok(None);
    };

    let mut charges = Vec::with_capacity(natoms);
    for row in header + 1..header + 1 + natoms {
        let value = doc
            .line(row)
            .and_then(|l| l.split_whitespace().last())
            .and_then(|w| w.parse::<f64>().ok())
            .ok_or_else(|| {
                DftbKitError::parse(
                    "charges",
                    doc.path(),
                    format!("expected {} charge rows after line {}", natoms, header + 1),
                )
            })?;
        charges.push(value);
    }

    Ok(Some(charges))
}

/// 解析偶极矩 (e·Å)，取原子单位那一行
///
/// "Dipole moment:    0.00000000    0.00000000   -0.49720613 au"
pub fn parse_dipole(doc: &OutputDocument) -> Result<Option<[f64; 3]>> {
    let Some(index) = doc.rfind_by(|l| l.contains("Dipole moment:") && l.contains("au")) else {
        return Ok(None);
    };

    let words: Vec<&str> = doc.lines()[index].split_whitespace().collect();
    if words.len() < 4 {
        return Err(DftbKitError::parse("dipole", doc.path(), "too few columns"));
    }

    let mut dipole = [0.0; 3];
    for (d, w) in dipole.iter_mut().zip(&words[words.len() - 4..words.len() - 1]) {
        *d = w
            .parse::<f64>()
            .map_err(|_| DftbKitError::parse("dipole", doc.path(), format!("'{}' is not a number", w)))?
            * BOHR;
    }

    Ok(Some(dipole))
}

/// 解析外部点电荷受力 (eV/Å)
pub fn parse_external_forces(doc: &OutputDocument, ncharges: usize) -> Result<Vec<[f64; 3]>> {
    let section = "forces on external charges";
    let header = doc
        .find("Forces on external charges")
        .ok_or_else(|| DftbKitError::parse(section, doc.path(), "section not found"))?;

    let mut forces = Vec::with_capacity(ncharges);
    for row in header + 1..header + 1 + ncharges {
        let line = doc
            .line(row)
            .ok_or_else(|| DftbKitError::parse(section, doc.path(), "file ended inside section"))?;
        let values = parse_floats(line).map_err(|e| DftbKitError::parse(section, doc.path(), e))?;
        if values.len() != 3 {
            return Err(DftbKitError::parse(
                section,
                doc.path(),
                format!("row {} has {} columns, expected 3", row + 1, values.len()),
            ));
        }
        forces.push([
            values[0] * FORCE_UNIT,
            values[1] * FORCE_UNIT,
            values[2] * FORCE_UNIT,
        ]);
    }

    Ok(forces)
}
