//! # k 点采样
//!
//! 生成 `Hamiltonian_KPointsAndWeights` 参数：
//! - Monkhorst-Pack 网格：每行 `x y z 1.0`
//! - 能带路径 (`Klines`)：每行 `1 x y z`
//!
//! ## 依赖关系
//! - 被 `calculator/dftb.rs`, `cli/` 使用
//! - 使用 `input/params.rs`, `models/structure.rs`

use super::params::{format_float, ParameterSet};
use crate::error::{DftbKitError, Result};
use crate::models::Lattice;

const KPOINTS_KEY: &str = "Hamiltonian_KPointsAndWeights_";

/// k 点设置
#[derive(Debug, Clone, PartialEq)]
pub enum KPoints {
    /// Monkhorst-Pack 网格 `n1 x n2 x n3`
    MonkhorstPack([usize; 3]),
    /// 依次连接分数坐标特殊点的能带路径，共约 `npoints` 个点
    BandPath {
        points: Vec<[f64; 3]>,
        npoints: usize,
    },
}

impl KPoints {
    /// 解析 `4,4,4` 或 `4x4x4`
    pub fn parse_grid(text: &str) -> Result<[usize; 3]> {
        let values: Vec<usize> = text
            .split(|c| c == ',' || c == 'x' || c == 'X')
            .map(|w| w.trim().parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| DftbKitError::InvalidArgument(format!("bad k-point grid '{}'", text)))?;

        match values.as_slice() {
            [n1, n2, n3] if *n1 > 0 && *n2 > 0 && *n3 > 0 => Ok([*n1, *n2, *n3]),
            _ => Err(DftbKitError::InvalidArgument(format!(
                "k-point grid needs three positive integers, got '{}'",
                text
            ))),
        }
    }

    /// 解析 `0,0,0;0.5,0,0.5;...`（分数坐标，至少两个点）
    pub fn parse_path(text: &str) -> Result<Vec<[f64; 3]>> {
        let points = text
            .split(';')
            .filter(|p| !p.trim().is_empty())
            .map(|p| {
                let values: Vec<f64> = p
                    .split(',')
                    .map(|w| w.trim().parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| {
                        DftbKitError::InvalidArgument(format!("bad k-point '{}'", p.trim()))
                    })?;
                match values.as_slice() {
                    [x, y, z] => Ok([*x, *y, *z]),
                    _ => Err(DftbKitError::InvalidArgument(format!(
                        "k-point '{}' needs three coordinates",
                        p.trim()
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        if points.len() < 2 {
            return Err(DftbKitError::InvalidArgument(
                "band path needs at least two points".to_string(),
            ));
        }
        Ok(points)
    }

    /// 生成分数坐标 k 点列表
    pub fn coordinates(&self, lattice: Option<&Lattice>) -> Vec<[f64; 3]> {
        match self {
            KPoints::MonkhorstPack(size) => monkhorst_pack(*size),
            KPoints::BandPath { points, npoints } => band_path(points, *npoints, lattice),
        }
    }

    /// 写入参数集合，替换已有的 k 点设置
    pub fn apply(&self, params: &mut ParameterSet, lattice: Option<&Lattice>) {
        params.remove_prefixed(KPOINTS_KEY);

        let klines = matches!(self, KPoints::BandPath { .. });
        params.set(KPOINTS_KEY, if klines { "Klines " } else { "" });

        for (i, k) in self.coordinates(lattice).iter().enumerate() {
            let coords = k.iter().map(|&c| format_float(c)).collect::<Vec<_>>().join(" ");
            let row = if klines {
                format!("1 {}", coords)
            } else {
                format!("{} 1.0", coords)
            };
            params.set(format!("{}empty{:09}", KPOINTS_KEY, i), row);
        }
    }
}

/// `(i + 0.5) / n - 0.5`，最后一个轴变化最快
fn monkhorst_pack(size: [usize; 3]) -> Vec<[f64; 3]> {
    let coord = |i: usize, n: usize| (i as f64 + 0.5) / n as f64 - 0.5;

    let mut kpts = Vec::with_capacity(size[0] * size[1] * size[2]);
    for i in 0..size[0] {
        for j in 0..size[1] {
            for k in 0..size[2] {
                kpts.push([coord(i, size[0]), coord(j, size[1]), coord(k, size[2])]);
            }
        }
    }
    kpts
}

fn band_path(points: &[[f64; 3]], npoints: usize, lattice: Option<&Lattice>) -> Vec<[f64; 3]> {
    let Some(last) = points.last() else {
        return Vec::new();
    };

    let reciprocal = lattice.and_then(Lattice::reciprocal);
    let segment_length = |a: [f64; 3], b: [f64; 3]| {
        let d = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = match reciprocal {
            Some(r) => [
                d[0] * r[0][0] + d[1] * r[1][0] + d[2] * r[2][0],
                d[0] * r[0][1] + d[1] * r[1][1] + d[2] * r[2][1],
                d[0] * r[0][2] + d[1] * r[1][2] + d[2] * r[2][2],
            ],
            None => d,
        };
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    };

    let lengths: Vec<f64> = points
        .windows(2)
        .map(|w| segment_length(w[0], w[1]))
        .collect();
    let total: f64 = lengths.iter().sum();

    let mut kpts: Vec<[f64; 3]> = Vec::new();
    let mut covered = 0.0;
    for (segment, &length) in points.windows(2).zip(&lengths) {
        let remaining = total - covered;
        let left = npoints.saturating_sub(kpts.len()) as f64;
        let n = if remaining > 0.0 {
            ((length * left / remaining).round() as usize).max(2)
        } else {
            2
        };

        let [start, end] = [segment[0], segment[1]];
        for step in 0..n - 1 {
            let t = step as f64 / (n - 1) as f64;
            kpts.push([
                start[0] + t * (end[0] - start[0]),
                start[1] + t * (end[1] - start[1]),
                start[2] + t * (end[2] - start[2]),
            ]);
        }
        covered += length;
    }
    kpts.push(*last);
    kpts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monkhorst_pack_order() {
        let kpts = monkhorst_pack([2, 1, 2]);
        assert_eq!(kpts.len(), 4);
        assert_eq!(kpts[0], [-0.25, 0.0, -0.25]);
        assert_eq!(kpts[1], [-0.25, 0.0, 0.25]);
        assert_eq!(kpts[3], [0.25, 0.0, 0.25]);
    }

    #[test]
    fn test_apply_monkhorst_pack() {
        let mut params = ParameterSet::new();
        params.set("Hamiltonian_KPointsAndWeights_empty000000099", "stale");
        KPoints::MonkhorstPack([1, 1, 2]).apply(&mut params, None);

        assert_eq!(params.get("Hamiltonian_KPointsAndWeights_"), Some(""));
        assert_eq!(
            params.get("Hamiltonian_KPointsAndWeights_empty000000000"),
            Some("0.0 0.0 -0.25 1.0")
        );
        assert_eq!(
            params.get("Hamiltonian_KPointsAndWeights_empty000000001"),
            Some("0.0 0.0 0.25 1.0")
        );
        assert!(!params.contains_key("Hamiltonian_KPointsAndWeights_empty000000099"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_band_path_counts() {
        // 两段等长，各分 3 个点 (不含段终点) + 终点
        let points = vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [0.5, 0.5, 0.0]];
        let kpts = band_path(&points, 7, None);
        assert_eq!(kpts.len(), 7);
        assert_eq!(kpts[0], [0.0, 0.0, 0.0]);
        assert_eq!(kpts[3], [0.5, 0.0, 0.0]);
        assert_eq!(kpts[6], [0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_band_path_minimum_two_per_segment() {
        let points = vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [0.5, 0.001, 0.0]];
        let kpts = band_path(&points, 4, None);
        // 短段至少贡献起点
        assert!(kpts.contains(&[0.5, 0.0, 0.0]));
        assert_eq!(kpts.last(), Some(&[0.5, 0.001, 0.0]));
    }

    #[test]
    fn test_apply_band_path() {
        let mut params = ParameterSet::new();
        let kpts = KPoints::BandPath {
            points: vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.5]],
            npoints: 3,
        };
        kpts.apply(&mut params, None);

        assert_eq!(params.get("Hamiltonian_KPointsAndWeights_"), Some("Klines "));
        assert_eq!(
            params.get("Hamiltonian_KPointsAndWeights_empty000000000"),
            Some("1 0.0 0.0 0.0")
        );
        assert_eq!(
            params.get("Hamiltonian_KPointsAndWeights_empty000000002"),
            Some("1 0.5 0.0 0.5")
        );
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!(KPoints::parse_grid("4,4,1").unwrap(), [4, 4, 1]);
        assert_eq!(KPoints::parse_grid("2x3x4").unwrap(), [2, 3, 4]);
        assert!(KPoints::parse_grid("4,4").is_err());
        assert!(KPoints::parse_grid("0,1,1").is_err());

        let path = KPoints::parse_path("0,0,0; 0.5,0,0.5").unwrap();
        assert_eq!(path, vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.5]]);
        assert!(KPoints::parse_path("0,0,0").is_err());
    }
}
