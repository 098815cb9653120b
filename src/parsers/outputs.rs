//! # DFTB+ 输出汇总读取
//!
//! 组合 `results.tag` 与 `detailed.out` 的各个提取函数，
//! 生成一份完整的 [`DftbResults`]。任一已声明的数值块格式错误
//! 都会使整次读取失败，不返回部分结果。
//!
//! ## 依赖关系
//! - 被 `calculator/dftb.rs`, `commands/parse.rs`, `commands/collect.rs` 使用
//! - 使用 `parsers/results_tag.rs`, `parsers/detailed_out.rs`

use super::detailed_out;
use super::document::OutputDocument;
use super::results_tag;
use crate::error::{DftbKitError, Result};
use crate::models::DftbResults;
use std::fs;
use std::path::Path;

/// 机器可读结果文件名
pub const RESULTS_TAG: &str = "results.tag";

/// 详细输出文件名
pub const DETAILED_OUT: &str = "detailed.out";

/// 读取选项
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// 是否要求 results.tag 中存在受力
    pub read_forces: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions { read_forces: true }
    }
}

/// 从两个已加载的文档中解析结果
pub fn parse_outputs(
    results_tag: &OutputDocument,
    detailed: &OutputDocument,
    natoms: usize,
    options: ReadOptions,
) -> Result<DftbResults> {
    let mut results = DftbResults::new(detailed_out::parse_energy(detailed)?);

    results.charges = detailed_out::parse_charges(detailed, natoms)?;
    results.dipole = detailed_out::parse_dipole(detailed)?;

    if options.read_forces {
        results.forces = Some(results_tag::parse_forces(results_tag)?);
    }
    results.stress = results_tag::parse_stress(results_tag)?;
    results.fermi_levels = results_tag::parse_fermi_levels(results_tag)?;
    results.eigenvalues = results_tag::parse_eigenvalues(results_tag)?;

    Ok(results)
}

/// 读取计算目录中的 results.tag 与 detailed.out（不删除任何文件）
pub fn read_outputs(directory: &Path, natoms: usize, options: ReadOptions) -> Result<DftbResults> {
    let results_tag = OutputDocument::read(&directory.join(RESULTS_TAG))?;
    let detailed = OutputDocument::read(&directory.join(DETAILED_OUT))?;

    parse_outputs(&results_tag, &detailed, natoms, options)
}

/// 删除 results.tag，标记该结果已被读取
pub fn consume_results_tag(directory: &Path) -> Result<()> {
    let tag = directory.join(RESULTS_TAG);
    fs::remove_file(&tag).map_err(|e| DftbKitError::FileWriteError {
        path: tag.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::units::HARTREE;

    const TAG: &str = "\
forces              :real:2:3,2
  0.1 0.0 0.0
 -0.1 0.0 0.0
fermi_level         :real:1:2
  0.000000000000000E+000 -0.2
";

    const DETAILED: &str = "Total energy:      -5.0 H     -136.0 eV\n";

    #[test]
    fn test_read_outputs_without_charges() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(RESULTS_TAG), TAG).unwrap();
        fs::write(dir.path().join(DETAILED_OUT), DETAILED).unwrap();

        let results = read_outputs(dir.path(), 2, ReadOptions::default()).unwrap();
        assert!((results.energy + 5.0 * HARTREE).abs() < 1e-9);
        assert!(results.charges.is_none());
        assert_eq!(results.forces.as_ref().map(|f| f.len()), Some(2));
        assert!(results.stress.is_none());
        assert!(results.eigenvalues.is_none());
        assert_eq!(results.fermi_levels.as_ref().map(|f| f.len()), Some(1));

        // 非消费式读取不删除文件
        assert!(dir.path().join(RESULTS_TAG).exists());
    }

    #[test]
    fn test_forces_skipped_when_not_requested() {
        let tag = OutputDocument::from_text("fermi_level   :real:1:2\n -0.2 0.0\n", "results.tag");
        let detailed = OutputDocument::from_text(DETAILED, "detailed.out");

        let options = ReadOptions { read_forces: false };
        let results = parse_outputs(&tag, &detailed, 2, options).unwrap();
        assert!(results.forces.is_none());

        let err = parse_outputs(&tag, &detailed, 2, ReadOptions::default()).unwrap_err();
        assert!(matches!(err, DftbKitError::ForceParseError { .. }));
    }

    #[test]
    fn test_consume_results_tag() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(RESULTS_TAG), TAG).unwrap();

        consume_results_tag(dir.path()).unwrap();
        assert!(!dir.path().join(RESULTS_TAG).exists());
        assert!(consume_results_tag(dir.path()).is_err());
    }

    #[test]
    fn test_missing_results_tag() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DETAILED_OUT), DETAILED).unwrap();

        let err = read_outputs(dir.path(), 2, ReadOptions::default()).unwrap_err();
        assert!(matches!(err, DftbKitError::FileNotFound { .. }));
    }
}
