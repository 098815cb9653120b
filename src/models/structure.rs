//! # 原子结构数据模型
//!
//! 定义统一的分子/晶体结构表示。坐标一律为笛卡尔坐标 (Å)，
//! 晶格可选（非周期体系为 `None`）。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`input/`、`calculator/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 晶格表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let cos_alpha = alpha.to_radians().cos();
        let cos_beta = beta.to_radians().cos();
        let cos_gamma = gamma.to_radians().cos();
        let sin_gamma = gamma.to_radians().sin();

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();

        Lattice {
            matrix: [
                [a, 0.0, 0.0],
                [b * cos_gamma, b * sin_gamma, 0.0],
                [c1, c2, c3],
            ],
        }
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a_vec, b_vec, c_vec] = self.matrix;

        let a = norm(a_vec);
        let b = norm(b_vec);
        let c = norm(c_vec);

        let alpha = (dot(b_vec, c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(a_vec, c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(a_vec, b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积（带符号的行列式）
    pub fn volume(&self) -> f64 {
        determinant(&self.matrix)
    }

    /// 晶格矩阵的逆；奇异矩阵返回 `None`
    fn inverse(&self) -> Option<[[f64; 3]; 3]> {
        let m = self.matrix;
        let det = determinant(&m);
        if det.abs() < 1e-10 {
            return None;
        }

        Some([
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
            ],
        ])
    }

    /// 分数坐标转笛卡尔坐标
    pub fn to_cartesian(&self, frac: [f64; 3]) -> [f64; 3] {
        let m = self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }

    /// 笛卡尔坐标转分数坐标（奇异晶格时原样返回）
    pub fn to_fractional(&self, cart: [f64; 3]) -> [f64; 3] {
        match self.inverse() {
            Some(inv) => [
                cart[0] * inv[0][0] + cart[1] * inv[1][0] + cart[2] * inv[2][0],
                cart[0] * inv[0][1] + cart[1] * inv[1][1] + cart[2] * inv[2][1],
                cart[0] * inv[0][2] + cart[1] * inv[1][2] + cart[2] * inv[2][2],
            ],
            None => cart,
        }
    }

    /// 倒格子矩阵（不含 2π 因子），行向量满足 a_i · b_j = δ_ij
    pub fn reciprocal(&self) -> Option<[[f64; 3]; 3]> {
        let inv = self.inverse()?;
        Some([
            [inv[0][0], inv[1][0], inv[2][0]],
            [inv[0][1], inv[1][1], inv[2][1]],
            [inv[0][2], inv[1][2], inv[2][2]],
        ])
    }
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn determinant(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// 原子信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 笛卡尔坐标 [x, y, z] (Å)
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 原子结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    /// 结构名称
    pub name: String,

    /// 原子列表
    pub atoms: Vec<Atom>,

    /// 晶格（周期体系）
    pub lattice: Option<Lattice>,

    /// 速度 (Å/ps)，与 `atoms` 一一对应
    pub velocities: Option<Vec<[f64; 3]>>,
}

impl Structure {
    pub fn new(name: impl Into<String>, atoms: Vec<Atom>, lattice: Option<Lattice>) -> Self {
        Structure {
            name: name.into(),
            atoms,
            lattice,
            velocities: None,
        }
    }

    /// 原子数
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn is_periodic(&self) -> bool {
        self.lattice.is_some()
    }

    /// 按首次出现顺序排列的元素列表
    pub fn species_in_order(&self) -> Vec<String> {
        let mut species: Vec<String> = Vec::new();
        for atom in &self.atoms {
            if !species.contains(&atom.element) {
                species.push(atom.element.clone());
            }
        }
        species
    }

    /// 去重并排序后的元素列表
    pub fn species(&self) -> Vec<String> {
        let mut species = self.species_in_order();
        species.sort();
        species
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice_from_parameters_cubic() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let (a, b, c, alpha, beta, gamma) = lattice.parameters();

        assert!((a - 5.0).abs() < 1e-6);
        assert!((b - 5.0).abs() < 1e-6);
        assert!((c - 5.0).abs() < 1e-6);
        assert!((alpha - 90.0).abs() < 1e-6);
        assert!((beta - 90.0).abs() < 1e-6);
        assert!((gamma - 90.0).abs() < 1e-6);
        assert!((lattice.volume() - 125.0).abs() < 1e-6);
    }

    #[test]
    fn test_fractional_cartesian_non_orthogonal() {
        let lattice = Lattice::from_vectors([[3.0, 0.0, 0.0], [1.5, 2.6, 0.0], [0.5, 0.4, 4.0]]);
        let frac = [0.25, 0.5, 0.75];
        let cart = lattice.to_cartesian(frac);
        let back = lattice.to_fractional(cart);

        for i in 0..3 {
            assert!((back[i] - frac[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_reciprocal_is_dual_basis() {
        let lattice = Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        let rec = lattice.reciprocal().unwrap();

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((dot(lattice.matrix[i], rec[j]) - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_singular_lattice_has_no_reciprocal() {
        let lattice = Lattice::from_vectors([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(lattice.reciprocal().is_none());
    }

    #[test]
    fn test_structure_species_and_formula() {
        let atoms = vec![
            Atom::new("O", [0.0, 0.0, 0.0]),
            Atom::new("H", [0.0, 0.76, 0.59]),
            Atom::new("H", [0.0, -0.76, 0.59]),
        ];
        let water = Structure::new("water", atoms, None);

        assert_eq!(water.species_in_order(), vec!["O", "H"]);
        assert_eq!(water.species(), vec!["H", "O"]);
        assert_eq!(water.formula(), "H2O");
        assert!(!water.is_periodic());
        assert_eq!(water.len(), 3);
    }
}
