//! # 外部点电荷势
//!
//! 将 QM 区域嵌入一组经典点电荷中（QM/MM）。点电荷以
//! `x y z q` 四列写入 `dftb_external_charges.dat`，由输入文件中的
//! `ElectricField { PointCharges { ... } }` 引用。
//!
//! ## 依赖关系
//! - 被 `calculator/dftb.rs`, `commands/run.rs` 使用
//! - 使用 `parsers/detailed_out.rs` 读取作用在点电荷上的力

use crate::error::{DftbKitError, Result};
use crate::input::renderer::EXTERNAL_CHARGES_FILE;
use crate::parsers::detailed_out;
use crate::parsers::document::OutputDocument;
use crate::parsers::outputs::DETAILED_OUT;
use std::fs;
use std::path::Path;

/// 点电荷集合
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointChargePotential {
    charges: Vec<f64>,
    positions: Option<Vec<[f64; 3]>>,
}

impl PointChargePotential {
    pub fn new(charges: Vec<f64>) -> Self {
        PointChargePotential {
            charges,
            positions: None,
        }
    }

    pub fn with_positions(mut self, positions: Vec<[f64; 3]>) -> Self {
        self.positions = Some(positions);
        self
    }

    pub fn charges(&self) -> &[f64] {
        &self.charges
    }

    pub fn positions(&self) -> Option<&[[f64; 3]]> {
        self.positions.as_deref()
    }

    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    /// 读取四列 `x y z q` 文件（与写出格式相同）
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| DftbKitError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut charges = Vec::new();
        let mut positions = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let values: Vec<f64> = trimmed
                .split_whitespace()
                .map(|w| w.parse::<f64>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| {
                    DftbKitError::parse(
                        "point charges",
                        &path.display().to_string(),
                        format!("non-numeric value on line {}", i + 1),
                    )
                })?;
            if values.len() != 4 {
                return Err(DftbKitError::parse(
                    "point charges",
                    &path.display().to_string(),
                    format!("line {} has {} columns, expected 4", i + 1, values.len()),
                ));
            }
            positions.push([values[0], values[1], values[2]]);
            charges.push(values[3]);
        }

        Ok(PointChargePotential::new(charges).with_positions(positions))
    }

    /// 生成点电荷文件内容；没有电荷时返回 `None`
    pub fn to_mmcharges_string(&self) -> Result<Option<String>> {
        if self.charges.is_empty() {
            return Ok(None);
        }

        let positions = self.positions.as_ref().ok_or_else(|| {
            DftbKitError::InvalidArgument("point charges have no positions".to_string())
        })?;
        if positions.len() != self.charges.len() {
            return Err(DftbKitError::InvalidArgument(format!(
                "{} point charges but {} positions",
                self.charges.len(),
                positions.len()
            )));
        }

        let text = positions
            .iter()
            .zip(&self.charges)
            .map(|([x, y, z], q)| format!("{:12.6} {:12.6} {:12.6} {:12.6} \n", x, y, z, q))
            .collect();
        Ok(Some(text))
    }

    /// 写出 `dftb_external_charges.dat`；没有电荷时跳过并返回 `false`
    pub fn write_mmcharges(&self, directory: &Path) -> Result<bool> {
        let Some(text) = self.to_mmcharges_string()? else {
            return Ok(false);
        };

        let path = directory.join(EXTERNAL_CHARGES_FILE);
        fs::write(&path, text).map_err(|e| DftbKitError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(true)
    }

    /// 从 detailed.out 读取作用在点电荷上的力 (eV/Å)
    pub fn read_forces(&self, directory: &Path) -> Result<Vec<[f64; 3]>> {
        let doc = OutputDocument::read(&directory.join(DETAILED_OUT))?;
        detailed_out::parse_external_forces(&doc, self.charges.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::units::{BOHR, HARTREE};

    #[test]
    fn test_mmcharges_format() {
        let pcpot = PointChargePotential::new(vec![-0.834, 0.417])
            .with_positions(vec![[0.0, 0.0, 0.0], [0.9572, -1.5, 10.25]]);

        let text = pcpot.to_mmcharges_string().unwrap().unwrap();
        assert_eq!(
            text,
            "    0.000000     0.000000     0.000000    -0.834000 \n\
             \x20   0.957200    -1.500000    10.250000     0.417000 \n"
        );
    }

    #[test]
    fn test_empty_potential_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let pcpot = PointChargePotential::new(Vec::new());
        assert!(!pcpot.write_mmcharges(dir.path()).unwrap());
        assert!(!dir.path().join(EXTERNAL_CHARGES_FILE).exists());
    }

    #[test]
    fn test_missing_or_mismatched_positions() {
        let pcpot = PointChargePotential::new(vec![1.0]);
        assert!(pcpot.to_mmcharges_string().is_err());

        let pcpot = pcpot.with_positions(vec![[0.0; 3], [1.0; 3]]);
        assert!(pcpot.to_mmcharges_string().is_err());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let pcpot = PointChargePotential::new(vec![0.5, -0.5])
            .with_positions(vec![[1.0, 2.0, 3.0], [-1.0, -2.0, -3.0]]);
        assert!(pcpot.write_mmcharges(dir.path()).unwrap());

        let loaded = PointChargePotential::from_file(&dir.path().join(EXTERNAL_CHARGES_FILE)).unwrap();
        assert_eq!(loaded, pcpot);
    }

    #[test]
    fn test_read_forces_on_charges() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DETAILED_OUT),
            "Total energy: -1.0 H\nForces on external charges\n 0.1 0.0 0.0\n 0.0 -0.2 0.0\n",
        )
        .unwrap();

        let pcpot = PointChargePotential::new(vec![1.0, -1.0]);
        let forces = pcpot.read_forces(dir.path()).unwrap();
        assert_eq!(forces.len(), 2);
        assert!((forces[1][1] + 0.2 * HARTREE / BOHR).abs() < 1e-9);
    }
}
