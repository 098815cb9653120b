//! # DFTB+ 计算结果数据模型
//!
//! 存储从 `results.tag` / `detailed.out` 中提取的结果。
//! 所有数值已换算为 eV / Å 单位。
//!
//! ## 依赖关系
//! - 被 `parsers/results_tag.rs`, `parsers/detailed_out.rs` 填充
//! - 被 `calculator/` 和 `commands/` 使用

use serde::{Deserialize, Serialize};

/// DFTB+ 计算结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DftbResults {
    /// 总能量 (eV)
    pub energy: f64,

    /// 原子受力 (eV/Å)，未请求力时为 `None`
    pub forces: Option<Vec<[f64; 3]>>,

    /// 原子净电荷 (e)，SCC 关闭时为 `None`
    pub charges: Option<Vec<f64>>,

    /// 应力 (eV/Å³)，Voigt 顺序 xx, yy, zz, yz, xz, xy
    pub stress: Option<[f64; 6]>,

    /// 偶极矩 (e·Å)
    pub dipole: Option<[f64; 3]>,

    /// 本征值 (eV)，形状 [nkpt][nspin][nband]
    pub eigenvalues: Option<Vec<Vec<Vec<f64>>>>,

    /// 费米能级 (eV)
    pub fermi_levels: Option<Vec<f64>>,
}

impl DftbResults {
    pub fn new(energy: f64) -> Self {
        DftbResults {
            energy,
            ..Default::default()
        }
    }

    /// 最高的费米能级
    pub fn fermi_level(&self) -> Option<f64> {
        self.fermi_levels
            .as_ref()?
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |m| m.max(e))))
    }

    /// 自旋通道数（由本征值形状推断）
    pub fn nspin(&self) -> Option<usize> {
        self.eigenvalues
            .as_ref()
            .and_then(|ev| ev.first())
            .map(|spins| spins.len())
    }

    /// 指定 k 点和自旋通道的本征值
    pub fn eigenvalues_at(&self, kpt: usize, spin: usize) -> Option<&[f64]> {
        self.eigenvalues
            .as_ref()?
            .get(kpt)?
            .get(spin)
            .map(|bands| bands.as_slice())
    }

    /// 最大原子受力的模 (eV/Å)
    pub fn max_force(&self) -> Option<f64> {
        self.forces.as_ref().map(|forces| {
            forces
                .iter()
                .map(|f| (f[0] * f[0] + f[1] * f[1] + f[2] * f[2]).sqrt())
                .fold(0.0, f64::max)
        })
    }

    /// 每原子能量
    pub fn energy_per_atom(&self, natoms: usize) -> Option<f64> {
        if natoms > 0 {
            Some(self.energy / natoms as f64)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fermi_level_is_maximum() {
        let mut results = DftbResults::new(-10.0);
        assert!(results.fermi_level().is_none());

        results.fermi_levels = Some(vec![-4.2, -3.9]);
        assert_eq!(results.fermi_level(), Some(-3.9));
    }

    #[test]
    fn test_eigenvalue_accessors() {
        let mut results = DftbResults::new(0.0);
        results.eigenvalues = Some(vec![
            vec![vec![-1.0, 0.5], vec![-0.9, 0.6]],
            vec![vec![-1.1, 0.4], vec![-1.0, 0.7]],
        ]);

        assert_eq!(results.nspin(), Some(2));
        assert_eq!(results.eigenvalues_at(1, 0), Some(&[-1.1, 0.4][..]));
        assert!(results.eigenvalues_at(2, 0).is_none());
    }

    #[test]
    fn test_max_force_and_energy_per_atom() {
        let mut results = DftbResults::new(-12.0);
        results.forces = Some(vec![[3.0, 4.0, 0.0], [0.0, 0.0, 1.0]]);

        assert_eq!(results.max_force(), Some(5.0));
        assert_eq!(results.energy_per_atom(3), Some(-4.0));
        assert!(results.energy_per_atom(0).is_none());
    }
}
