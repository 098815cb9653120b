//! # md 命令实现
//!
//! 汇总 DFTB+ 分子动力学运行的晶格演化，可选导出带晶格的轨迹和末帧速度。
//!
//! ## 依赖关系
//! - 使用 `cli/md.rs` 定义的参数
//! - 使用 `parsers/md_out.rs`, `parsers/xyz.rs`
//! - 使用 `utils/output.rs`

use crate::cli::md::MdArgs;
use crate::error::{DftbKitError, Result};
use crate::models::{Lattice, Structure};
use crate::parsers::document::OutputDocument;
use crate::parsers::md_out::{apply_lattices, parse_lattices};
use crate::parsers::xyz::{parse_xyz_trajectory, read_velocities, to_xyz_string, write_velocities};
use crate::utils::output;

use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};

/// 晶格表格行
#[derive(Debug, Clone, Tabled)]
struct LatticeRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "a (Å)")]
    a: String,
    #[tabled(rename = "b (Å)")]
    b: String,
    #[tabled(rename = "c (Å)")]
    c: String,
    #[tabled(rename = "α (°)")]
    alpha: String,
    #[tabled(rename = "β (°)")]
    beta: String,
    #[tabled(rename = "γ (°)")]
    gamma: String,
    #[tabled(rename = "V (Å³)")]
    volume: String,
}

/// 执行 md 命令
pub fn execute(args: MdArgs) -> Result<()> {
    output::print_header("DFTB+ Molecular Dynamics");

    if !args.dir.is_dir() {
        return Err(DftbKitError::DirectoryNotFound {
            path: args.dir.display().to_string(),
        });
    }

    let md_path = args.dir.join(&args.md_out);
    let lattices = if md_path.is_file() {
        parse_lattices(&OutputDocument::read(&md_path)?)?
    } else {
        output::print_skip(&format!("{} not found, no lattice history", md_path.display()));
        Vec::new()
    };

    if !lattices.is_empty() {
        output::print_info(&format!("{} lattice blocks in {}", lattices.len(), md_path.display()));
        println!("{}", Table::new(lattice_rows(&lattices)));
    }

    let trajectory_path = args.dir.join(&args.trajectory);
    if !trajectory_path.is_file() {
        if args.export_xyz.is_some() || args.velocities_out.is_some() {
            return Err(DftbKitError::FileNotFound {
                path: trajectory_path.display().to_string(),
            });
        }
        return Ok(());
    }

    let frames = load_frames(&trajectory_path, &lattices)?;
    output::print_info(&format!(
        "{} frames in {}",
        frames.len(),
        trajectory_path.display()
    ));

    if let Some(path) = &args.export_xyz {
        export_trajectory(&frames, path)?;
        output::print_success(&format!("Trajectory written to '{}'", path.display()));
    }

    if let Some(path) = &args.velocities_out {
        let natoms = frames.last().map(Structure::len).unwrap_or(0);
        let velocities = read_velocities(&trajectory_path, natoms)?;
        write_velocities(path, &velocities)?;
        output::print_success(&format!(
            "Velocities of {} atoms (a.u.) written to '{}'",
            velocities.len(),
            path.display()
        ));
    }

    Ok(())
}

/// 读取轨迹；有晶格记录时逐帧赋值
fn load_frames(path: &Path, lattices: &[Lattice]) -> Result<Vec<Structure>> {
    let mut frames = parse_xyz_trajectory(path)?;
    if !lattices.is_empty() {
        apply_lattices(&mut frames, lattices)?;
    }
    Ok(frames)
}

fn lattice_rows(lattices: &[Lattice]) -> Vec<LatticeRow> {
    lattices
        .iter()
        .enumerate()
        .map(|(step, lattice)| {
            let (a, b, c, alpha, beta, gamma) = lattice.parameters();
            LatticeRow {
                step,
                a: format!("{:.4}", a),
                b: format!("{:.4}", b),
                c: format!("{:.4}", c),
                alpha: format!("{:.2}", alpha),
                beta: format!("{:.2}", beta),
                gamma: format!("{:.2}", gamma),
                volume: format!("{:.3}", lattice.volume()),
            }
        })
        .collect()
}

fn export_trajectory(frames: &[Structure], path: &Path) -> Result<()> {
    let content: String = frames.iter().map(to_xyz_string).collect();
    fs::write(path, content).map_err(|e| DftbKitError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::xyz::parse_xyz_frames;

    const MD_OUT: &str = "\
MD step: 0
Lattice vectors (A)
   4.0   0.0   0.0
   0.0   4.0   0.0
   0.0   0.0   4.0
MD step: 10
Lattice vectors (A)
   4.1   0.0   0.0
   0.0   4.1   0.0
   0.0   0.0   4.1
";

    const TRAJECTORY: &str = "\
2
MD iter: 0
Ar  0.0 0.0 0.0  0.0  0.1 0.2 0.3
Ar  2.0 2.0 2.0  0.0 -0.1 -0.2 -0.3
2
MD iter: 10
Ar  0.1 0.0 0.0  0.0  0.4 0.5 0.6
Ar  2.1 2.0 2.0  0.0 -0.4 -0.5 -0.6
";

    #[test]
    fn test_lattice_rows() {
        let doc = OutputDocument::from_text(MD_OUT, "md.out");
        let lattices = parse_lattices(&doc).unwrap();
        let rows = lattice_rows(&lattices);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].step, 1);
        assert_eq!(rows[1].a, "4.1000");
        assert_eq!(rows[0].gamma, "90.00");
        assert_eq!(rows[0].volume, "64.000");
    }

    #[test]
    fn test_execute_exports_trajectory_and_velocities() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("md.out"), MD_OUT).unwrap();
        fs::write(dir.path().join("geo_end.xyz"), TRAJECTORY).unwrap();

        let export = dir.path().join("traj.xyz");
        let velocities = dir.path().join("velocities.txt");
        execute(MdArgs {
            dir: dir.path().to_path_buf(),
            md_out: "md.out".into(),
            trajectory: "geo_end.xyz".into(),
            export_xyz: Some(export.clone()),
            velocities_out: Some(velocities.clone()),
        })
        .unwrap();

        let text = fs::read_to_string(&export).unwrap();
        let frames = parse_xyz_frames(&text, "traj").unwrap();
        assert_eq!(frames.len(), 2);
        let lattice = frames[1].lattice.as_ref().unwrap();
        assert!((lattice.matrix[0][0] - 4.1).abs() < 1e-9);

        let vel_text = fs::read_to_string(&velocities).unwrap();
        assert_eq!(vel_text.lines().count(), 2);
    }

    #[test]
    fn test_lattice_count_mismatch_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo_end.xyz");
        fs::write(&path, TRAJECTORY).unwrap();

        let lattices = vec![Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0)];
        assert!(load_frames(&path, &lattices).is_err());
        assert_eq!(load_frames(&path, &[]).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_trajectory_with_export_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = execute(MdArgs {
            dir: dir.path().to_path_buf(),
            md_out: "md.out".into(),
            trajectory: "geo_end.xyz".into(),
            export_xyz: Some(dir.path().join("out.xyz")),
            velocities_out: None,
        });
        assert!(matches!(result, Err(DftbKitError::FileNotFound { .. })));
    }
}
