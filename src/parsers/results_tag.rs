//! # DFTB+ results.tag 解析器
//!
//! 解析 `WriteResultsTag = Yes` 产生的机器可读结果文件，
//! 提取受力、应力、本征值与费米能级。
//!
//! ## results.tag 格式说明
//! ```text
//! forces              :real:2:3,2
//!   0.123E-01  0.000E+00 -0.456E-02
//!  -0.123E-01  0.000E+00  0.456E-02
//! stress              :real:2:3,3
//!   ...three rows...
//! eigenvalues         :real:3:4,1,1
//!  -0.9 -0.5 -0.3
//!  -0.1
//! fermi_level         :real:1:2
//!   0.000000000000000E+000 -0.1234
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/outputs.rs` 使用
//! - 使用 `parsers/document.rs`, `models/units.rs`

use super::document::{parse_floats, OutputDocument};
use crate::error::{DftbKitError, Result};
use crate::models::units::{FORCE_UNIT, HARTREE, STRESS_UNIT};

/// 3x3 矩阵展平后映射到 Voigt 顺序 (xx, yy, zz, yz, xz, xy) 的下标
pub const VOIGT_INDICES: [usize; 6] = [0, 4, 8, 5, 2, 1];

/// 费米能级占位零值的判定阈值
const FERMI_EPSILON: f64 = 1e-8;

/// 头部行的 `:` 统一替换为 `,` 后按 `,` 切分
fn header_fields(line: &str) -> Vec<String> {
    line.replace(':', ",")
        .split(',')
        .map(|s| s.trim().to_string())
        .collect()
}

/// 解析原子受力 (eV/Å)
pub fn parse_forces(doc: &OutputDocument) -> Result<Vec<[f64; 3]>> {
    let force_error = |reason: String| DftbKitError::ForceParseError {
        path: doc.path().to_string(),
        reason,
    };

    let header = doc
        .find("forces   ")
        .ok_or_else(|| force_error("no 'forces' block found".to_string()))?;

    let fields = header_fields(&doc.lines()[header]);
    let count: usize = fields
        .last()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| force_error(format!("bad block header '{}'", doc.lines()[header])))?;

    let mut forces = Vec::with_capacity(count);
    for row in header + 1..header + 1 + count {
        let line = doc
            .line(row)
            .ok_or_else(|| force_error(format!("expected {} rows, file ended", count)))?;
        let values = parse_floats(line).map_err(force_error)?;
        if values.len() < 3 {
            return Err(force_error(format!("row {} has fewer than 3 columns", row + 1)));
        }
        forces.push([
            values[0] * FORCE_UNIT,
            values[1] * FORCE_UNIT,
            values[2] * FORCE_UNIT,
        ]);
    }

    Ok(forces)
}

/// 3x3 矩阵转 Voigt 6 分量
pub fn voigt_from_matrix(matrix: [[f64; 3]; 3]) -> [f64; 6] {
    let flat: Vec<f64> = matrix.iter().flatten().copied().collect();
    VOIGT_INDICES.map(|i| flat[i])
}

/// 解析应力 (eV/Å³)，取负号后按 Voigt 顺序返回；无应力段时为 `None`
pub fn parse_stress(doc: &OutputDocument) -> Result<Option<[f64; 6]>> {
    let Some(header) = doc.find("stress") else {
        return Ok(None);
    };

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let line = doc
            .line(header + 1 + i)
            .ok_or_else(|| DftbKitError::parse("stress", doc.path(), "expected 3 rows"))?;
        let values = parse_floats(line).map_err(|e| DftbKitError::parse("stress", doc.path(), e))?;
        if values.len() != 3 {
            return Err(DftbKitError::parse(
                "stress",
                doc.path(),
                format!("row {} has {} columns, expected 3", i + 1, values.len()),
            ));
        }
        for (j, v) in values.into_iter().enumerate() {
            row[j] = -v * STRESS_UNIT;
        }
    }

    Ok(Some(voigt_from_matrix(matrix)))
}

/// 本征值块的维度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EigenvalueLayout {
    ncol: usize,
    nband: usize,
    nkpt: usize,
    nspin: usize,
}

impl EigenvalueLayout {
    fn rows_per_kpt(&self) -> usize {
        self.nband.div_ceil(self.ncol)
    }
}

/// 解析本征值 (eV)，形状 [nkpt][nspin][nband]；无本征值段时为 `None`
pub fn parse_eigenvalues(doc: &OutputDocument) -> Result<Option<Vec<Vec<Vec<f64>>>>> {
    let Some(header) = doc.find("eigenvalues   ") else {
        return Ok(None);
    };

    let eig_error = |reason: String| DftbKitError::EigenvalueParseError {
        path: doc.path().to_string(),
        reason,
    };

    let fields = header_fields(&doc.lines()[header]);
    if fields.len() < 4 {
        return Err(eig_error(format!("bad block header '{}'", doc.lines()[header])));
    }
    let dims: Vec<usize> = fields[fields.len() - 4..]
        .iter()
        .map(|s| s.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| eig_error(format!("bad block header '{}'", doc.lines()[header])))?;
    let layout = EigenvalueLayout {
        ncol: dims[0],
        nband: dims[1],
        nkpt: dims[2],
        nspin: dims[3],
    };
    if layout.ncol == 0 {
        return Err(eig_error("zero columns per row".to_string()));
    }

    let mut eigenvalues = vec![vec![Vec::new(); layout.nspin]; layout.nkpt];
    let mut row = header + 1;
    for spin in 0..layout.nspin {
        for kpt in eigenvalues.iter_mut() {
            let mut bands = Vec::with_capacity(layout.nband);
            for _ in 0..layout.rows_per_kpt() {
                let line = doc
                    .line(row)
                    .ok_or_else(|| eig_error("file ended inside eigenvalue block".to_string()))?;
                bands.extend(parse_floats(line).map_err(eig_error)?);
                row += 1;
            }
            if bands.len() != layout.nband {
                return Err(eig_error(format!(
                    "expected {} bands, found {}",
                    layout.nband,
                    bands.len()
                )));
            }
            kpt[spin] = bands.into_iter().map(|e| e * HARTREE).collect();
        }
    }

    Ok(Some(eigenvalues))
}

/// 解析费米能级 (eV)，过滤自旋非极化时的占位零值；无该段时为 `None`
pub fn parse_fermi_levels(doc: &OutputDocument) -> Result<Option<Vec<f64>>> {
    let Some(header) = doc.find("fermi_level   ") else {
        return Ok(None);
    };

    let fermi_error = |reason: String| DftbKitError::FermiLevelParseError {
        path: doc.path().to_string(),
        reason,
    };

    let line = doc
        .line(header + 1)
        .ok_or_else(|| fermi_error("missing value line".to_string()))?;
    let values = parse_floats(line).map_err(fermi_error)?;
    if values.is_empty() || values.len() > 2 {
        return Err(fermi_error(format!(
            "expected 1 or 2 values, found {}",
            values.len()
        )));
    }

    Ok(Some(
        values
            .into_iter()
            .filter(|e| e.abs() > FERMI_EPSILON)
            .map(|e| e * HARTREE)
            .collect(),
    ))
}
