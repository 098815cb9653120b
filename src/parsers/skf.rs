//! # Slater-Koster (.skf) 文件头解析
//!
//! 从同核 SKF 文件（如 `O-O.skf`）的头部推断该元素的最大角动量。
//!
//! ## .skf 头部格式说明
//! ```text
//! 0.02 500                                   # 简单格式：第 1 行为网格
//! Ed Ep Es SPE Ud Up Us fd fp fs             # 第 2 行，占据数从偏移 7 开始
//!
//! @ ...                                      # 扩展格式：首字符为 '@'
//! 0.02 500
//! Ef Ed Ep Es SPE Uf Ud Up Us ff fd fp fs    # 第 3 行，占据数从偏移 9 开始
//! ```
//! 占据数按角动量从高到低排列，逗号与空格均可作分隔符。
//!
//! ## 依赖关系
//! - 被 `input/renderer.rs` 使用

use crate::error::{DftbKitError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 角动量编号对应的轨道符号
pub const ORBITAL_LABELS: [char; 4] = ['s', 'p', 'd', 'f'];

/// 同核 SKF 文件路径
pub fn homonuclear_skf_path(slako_dir: &Path, species: &str) -> PathBuf {
    slako_dir.join(format!("{0}-{0}.skf", species))
}

/// 读取 SKF 文件并推断最大角动量
pub fn read_max_angular_momentum(path: &Path, species: &str) -> Result<usize> {
    let content = fs::read_to_string(path).map_err(|e| DftbKitError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    max_angular_momentum(&content).ok_or_else(|| DftbKitError::MissingAngularMomentumData {
        species: species.to_string(),
        path: path.display().to_string(),
    })
}

/// 从 SKF 内容推断最大角动量；找不到正的占据数时返回 `None`
pub fn max_angular_momentum(content: &str) -> Option<usize> {
    let mut lines = content.lines();
    let first = lines.next()?;

    let (lmax, offset) = if first.starts_with('@') {
        lines.next()?;
        (3usize, 9usize)
    } else {
        (2, 7)
    };

    let occupations: Vec<f64> = lines
        .next()?
        .replace(',', " ")
        .split_whitespace()
        .skip(offset)
        .take(lmax + 1)
        .map(|w| w.parse::<f64>().ok())
        .collect::<Option<_>>()?;

    occupations
        .iter()
        .position(|&f| f > 0.0)
        .map(|i| lmax - i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_format_p_shell() {
        let content = "0.02 500\n-0.1 -0.2 -0.3 0.0 0.3 0.3 0.3 0.0 2.0 2.0\n";
        assert_eq!(max_angular_momentum(content), Some(1));
    }

    #[test]
    fn test_occupations_read_highest_l_first() {
        // d p s
        let p_shell = "0.02 500\n-0.1 -0.2 -0.3 0.0 0.3 0.3 0.3 0.0 2.0 2.0\n";
        let d_shell = "0.02 500\n-0.1 -0.2 -0.3 0.0 0.3 0.3 0.3 2.0 2.0 0.0\n";
        assert_eq!(max_angular_momentum(p_shell), Some(1));
        assert_eq!(max_angular_momentum(d_shell), Some(2));
    }

    #[test]
    fn test_simple_format_with_commas() {
        let content = "0.02, 500\n-0.1, -0.2, -0.3, 0.0, 0.3, 0.3, 0.3, 0.0, 0.0, 1.0\n";
        assert_eq!(max_angular_momentum(content), Some(0));
    }

    #[test]
    fn test_extended_format_d_shell() {
        let content = "@ extended header\n0.02 500\n\
            0 -0.1 -0.2 -0.3 0.0 0 0.3 0.3 0.3 0.0 6.0 0.0 2.0\n";
        assert_eq!(max_angular_momentum(content), Some(2));
    }

    #[test]
    fn test_no_positive_occupation() {
        let content = "0.02 500\n-0.1 -0.2 -0.3 0.0 0.3 0.3 0.3 0.0 0.0 0.0\n";
        assert_eq!(max_angular_momentum(content), None);

        assert_eq!(max_angular_momentum("0.02 500\n1 2 3\n"), None);
    }

    #[test]
    fn test_read_missing_data_names_species() {
        let dir = tempfile::tempdir().unwrap();
        let path = homonuclear_skf_path(dir.path(), "X");
        fs::write(&path, "0.02 500\n0 0 0 0 0 0 0 0 0 0\n").unwrap();

        match read_max_angular_momentum(&path, "X") {
            Err(DftbKitError::MissingAngularMomentumData { species, path: p }) => {
                assert_eq!(species, "X");
                assert!(p.ends_with("X-X.skf"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = homonuclear_skf_path(dir.path(), "O");
        fs::write(&path, "0.02 500\n-0.1 -0.2 -0.3 0.0 0.3 0.3 0.3 0.0 4.0 2.0\n").unwrap();

        assert_eq!(read_max_angular_momentum(&path, "O").unwrap(), 1);
        assert_eq!(ORBITAL_LABELS[1], 'p');
    }
}
