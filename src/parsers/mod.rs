//! # 解析器模块
//!
//! DFTB+ 输出文件与几何结构文件的解析器。
//!
//! ## 依赖关系
//! - 被 `calculator/`, `input/`, `commands/` 使用
//! - 使用 `models/` 数据模型
//! - 子模块:
//!   - 输出: document, results_tag, detailed_out, outputs, md_out
//!   - 结构: gen, hsd_geometry, xyz
//!   - 参数: skf

pub mod detailed_out;
pub mod document;
pub mod gen;
pub mod hsd_geometry;
pub mod md_out;
pub mod outputs;
pub mod results_tag;
pub mod skf;
pub mod xyz;

use crate::error::{DftbKitError, Result};
use crate::models::Structure;
use std::path::Path;

/// 从文件路径推断格式并解析
pub fn parse_structure_file(path: &Path) -> Result<Structure> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "gen" => gen::parse_gen_file(path),
        "hsd" => hsd_geometry::parse_hsd_file(path),
        "xyz" => xyz::parse_xyz_file(path),
        _ => Err(DftbKitError::UnsupportedFormat(format!(
            "Cannot determine format for: {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_dispatch_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let gen_path = dir.path().join("geo_end.gen");
        fs::write(&gen_path, "1  C\nAr\n1 1 0.0 0.0 0.0\n").unwrap();
        assert_eq!(parse_structure_file(&gen_path).unwrap().len(), 1);

        let xyz_path = dir.path().join("water.XYZ");
        fs::write(&xyz_path, "1\nwater\nO 0 0 0\n").unwrap();
        assert_eq!(parse_structure_file(&xyz_path).unwrap().atoms[0].element, "O");

        assert!(matches!(
            parse_structure_file(&dir.path().join("POSCAR")),
            Err(DftbKitError::UnsupportedFormat(_))
        ));
    }
}
