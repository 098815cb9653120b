//! # parse 命令实现
//!
//! 读取已完成计算目录中的 `results.tag` 与 `detailed.out`。
//!
//! ## 功能
//! - 原子数取自 `--structure`，否则依次尝试 `dftb_pin.hsd`、`geo_end.gen`
//! - 默认读取成功后删除 `results.tag`，`--keep` 保留
//! - 终端表格与可选 CSV 输出
//!
//! ## 依赖关系
//! - 使用 `cli/parse.rs` 定义的参数
//! - 使用 `parsers/outputs.rs`, `commands/report.rs`

use super::report;
use crate::cli::parse::ParseArgs;
use crate::error::{DftbKitError, Result};
use crate::models::Structure;
use crate::parsers::{self, outputs, outputs::ReadOptions};
use crate::utils::output;

use std::path::{Path, PathBuf};

/// 计算目录中按顺序尝试的结构文件
const STRUCTURE_CANDIDATES: [&str; 2] = ["dftb_pin.hsd", "geo_end.gen"];

/// 执行 parse 命令
pub fn execute(args: ParseArgs) -> Result<()> {
    output::print_header("Parsing DFTB+ Results");

    if !args.dir.is_dir() {
        return Err(DftbKitError::DirectoryNotFound {
            path: args.dir.display().to_string(),
        });
    }

    let structure = load_structure(&args.dir, args.structure.as_deref())?;
    let options = ReadOptions {
        read_forces: !args.no_forces,
    };
    let results = outputs::read_outputs(&args.dir, structure.len(), options)?;

    if args.keep {
        output::print_info("results.tag kept (--keep)");
    } else {
        outputs::consume_results_tag(&args.dir)?;
    }

    report::print_results(&results, &structure);

    if let Some(kpt) = args.eigenvalues {
        report::print_eigenvalues(&results, kpt)?;
    }

    if let Some(path) = &args.output_csv {
        report::save_atoms_csv(&results, &structure, path)?;
        output::print_success(&format!("Per-atom results saved to '{}'", path.display()));
    }

    Ok(())
}

/// 确定结构文件：显式指定优先，否则查找目录中的候选文件
pub fn locate_structure(dir: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    STRUCTURE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// 读取计算对应的结构
pub fn load_structure(dir: &Path, explicit: Option<&Path>) -> Result<Structure> {
    let path = locate_structure(dir, explicit).ok_or_else(|| DftbKitError::FileNotFound {
        path: dir
            .join(format!("{{{}}}", STRUCTURE_CANDIDATES.join(",")))
            .display()
            .to_string(),
    })?;
    parsers::parse_structure_file(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_locate_structure_order() {
        let dir = tempfile::tempdir().unwrap();
        assert!(locate_structure(dir.path(), None).is_none());

        fs::write(dir.path().join("geo_end.gen"), "1  C\nAr\n1 1 0.0 0.0 0.0\n").unwrap();
        assert_eq!(
            locate_structure(dir.path(), None),
            Some(dir.path().join("geo_end.gen"))
        );

        fs::write(
            dir.path().join("dftb_pin.hsd"),
            "Geometry = GenFormat {\n2  C\nAr\n1 1 0.0 0.0 0.0\n2 1 0.0 0.0 3.0\n}\n",
        )
        .unwrap();
        assert_eq!(
            locate_structure(dir.path(), None),
            Some(dir.path().join("dftb_pin.hsd"))
        );
        assert_eq!(load_structure(dir.path(), None).unwrap().len(), 2);

        let explicit = dir.path().join("other.xyz");
        assert_eq!(
            locate_structure(dir.path(), Some(&explicit)),
            Some(explicit.clone())
        );
    }

    #[test]
    fn test_missing_structure_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_structure(dir.path(), None),
            Err(DftbKitError::FileNotFound { .. })
        ));
    }
}
