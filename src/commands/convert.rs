//! # convert 命令实现
//!
//! 批量转换结构文件格式。
//!
//! ## 功能
//! - 读取 .gen / .hsd / .xyz 文件
//! - 转换为 .gen 或 .xyz 格式
//! - 支持并行处理
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的参数
//! - 使用 `batch/` 收集文件并并行执行
//! - 使用 `parsers/`, `utils/output.rs`

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::convert::{ConvertArgs, OutputFormat};
use crate::error::{DftbKitError, Result};
use crate::parsers::{self, gen::to_gen_string, xyz::to_xyz_string};
use crate::utils::output;

use std::fs;
use std::path::Path;

/// 执行 convert 命令
pub fn execute(args: ConvertArgs) -> Result<()> {
    output::print_header(&format!("Converting to {} format", args.target));

    if !args.input.exists() {
        return Err(DftbKitError::DirectoryNotFound {
            path: args.input.display().to_string(),
        });
    }

    fs::create_dir_all(&args.output).map_err(|e| DftbKitError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        return Err(DftbKitError::NoFilesFound {
            pattern: format!("{} under {}", args.pattern, args.input.display()),
        });
    }

    output::print_info(&format!("Found {} files to convert", files.len()));

    let result = BatchRunner::new(args.jobs).run(files, |input_path| {
        match convert_file(input_path, &args.output, args.target, args.overwrite) {
            Ok(true) => ProcessResult::Success(input_path.display().to_string()),
            Ok(false) => ProcessResult::Skipped(input_path.display().to_string()),
            Err(e) => ProcessResult::Failed(input_path.display().to_string(), e.to_string()),
        }
    });

    output::print_done(&format!(
        "Converted {} of {} file(s) to '{}' in '{}' ({} skipped, {} failed)",
        result.success,
        result.total(),
        args.target,
        args.output.display(),
        result.skipped,
        result.failed
    ));

    if !result.failures.is_empty() {
        output::print_warning("Failed conversions:");
        for (path, err) in &result.failures {
            output::print_error(&format!("{}: {}", path, err));
        }
    }

    Ok(())
}

/// 转换单个文件；目标已存在且未要求覆盖时返回 `Ok(false)`
fn convert_file(
    input_path: &Path,
    output_dir: &Path,
    target: OutputFormat,
    overwrite: bool,
) -> Result<bool> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure");
    let output_path = output_dir.join(format!("{}.{}", stem, target.extension()));

    if output_path.exists() && !overwrite {
        return Ok(false);
    }

    let structure = parsers::parse_structure_file(input_path)?;

    let content = match target {
        OutputFormat::Gen => to_gen_string(&structure),
        OutputFormat::Xyz => to_xyz_string(&structure),
    };

    fs::write(&output_path, content).map_err(|e| DftbKitError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATER_GEN: &str = "3  C\nO H\n1 1 0.0 0.0 0.0\n2 2 0.0 0.757 0.587\n3 2 0.0 -0.757 0.587\n";

    #[test]
    fn test_convert_file_gen_to_xyz() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("water.gen");
        fs::write(&input, WATER_GEN).unwrap();
        let out_dir = dir.path().join("out");
        fs::create_dir_all(&out_dir).unwrap();

        assert!(convert_file(&input, &out_dir, OutputFormat::Xyz, false).unwrap());
        let text = fs::read_to_string(out_dir.join("water.xyz")).unwrap();
        assert_eq!(text.lines().next().unwrap().trim(), "3");
        assert_eq!(text.lines().count(), 5);

        // 已存在则跳过，--overwrite 时重写
        assert!(!convert_file(&input, &out_dir, OutputFormat::Xyz, false).unwrap());
        assert!(convert_file(&input, &out_dir, OutputFormat::Xyz, true).unwrap());
    }

    #[test]
    fn test_convert_file_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.gen");
        fs::write(&input, "not a gen file\n").unwrap();

        assert!(convert_file(&input, dir.path(), OutputFormat::Xyz, false).is_err());
        assert!(!dir.path().join("broken.xyz").exists());
    }
}
