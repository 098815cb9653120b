//! # XYZ 格式解析器
//!
//! 读写 XYZ 结构文件，并处理 DFTB+ MD 输出 `geo_end.xyz` 中的速度列。
//!
//! ## XYZ 格式说明
//! ```text
//! 3
//! water Lattice="a1 a2 a3 b1 b2 b3 c1 c2 c3"   # 周期体系在注释行携带晶格
//! O  0.0  0.0  0.0
//! H  0.0  0.76 0.59
//! H  0.0 -0.76 0.59
//! ```
//! `geo_end.xyz` 每行为 `El x y z q vx vy vz`，速度单位 Å/ps。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `commands/convert.rs`, `commands/md.rs` 使用
//! - 使用 `regex` 匹配注释行中的晶格

use crate::error::{DftbKitError, Result};
use crate::models::units::VELOCITY_TO_AU;
use crate::models::{Atom, Lattice, Structure};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static LATTICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Lattice="([^"]*)""#).expect("valid lattice regex"));

/// 解析 .xyz 文件（多帧时取最后一帧）
pub fn parse_xyz_file(path: &Path) -> Result<Structure> {
    let content = read(path)?;
    parse_xyz_content(&content, file_stem(path))
}

/// 解析 .xyz 轨迹的全部帧
pub fn parse_xyz_trajectory(path: &Path) -> Result<Vec<Structure>> {
    let content = read(path)?;
    parse_xyz_frames(&content, file_stem(path))
}

fn file_stem(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| DftbKitError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 从字符串内容解析 XYZ 格式（多帧时取最后一帧）
pub fn parse_xyz_content(content: &str, name: &str) -> Result<Structure> {
    parse_xyz_frames(content, name)?
        .pop()
        .ok_or_else(|| DftbKitError::parse("XYZ", name, "no frames found"))
}

/// 依次解析所有帧
pub fn parse_xyz_frames(content: &str, name: &str) -> Result<Vec<Structure>> {
    let lines: Vec<&str> = content.lines().collect();
    let xyz_error = |reason: String| DftbKitError::parse("XYZ", name, reason);

    let mut start = 0;
    let mut frames = Vec::new();
    while start < lines.len() {
        if lines[start].trim().is_empty() {
            start += 1;
            continue;
        }

        let natoms: usize = lines[start]
            .trim()
            .parse()
            .map_err(|_| xyz_error(format!("bad atom count on line {}", start + 1)))?;
        let comment = lines.get(start + 1).copied().unwrap_or("");

        let lattice = match LATTICE_RE.captures(comment) {
            Some(caps) => {
                let values: Vec<f64> = caps[1]
                    .split_whitespace()
                    .map(|w| w.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| xyz_error("bad Lattice entry".to_string()))?;
                if values.len() != 9 {
                    return Err(xyz_error("Lattice needs 9 numbers".to_string()));
                }
                Some(Lattice::from_vectors([
                    [values[0], values[1], values[2]],
                    [values[3], values[4], values[5]],
                    [values[6], values[7], values[8]],
                ]))
            }
            None => None,
        };

        let mut atoms = Vec::with_capacity(natoms);
        let mut velocities = Vec::with_capacity(natoms);
        for i in 0..natoms {
            let line = lines
                .get(start + 2 + i)
                .ok_or_else(|| xyz_error(format!("expected {} atom rows", natoms)))?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            let position = (parts.len() >= 4)
                .then(|| -> Option<[f64; 3]> {
                    Some([
                        parts[1].parse().ok()?,
                        parts[2].parse().ok()?,
                        parts[3].parse().ok()?,
                    ])
                })
                .flatten()
                .ok_or_else(|| xyz_error(format!("bad atom row '{}'", line.trim())))?;
            atoms.push(Atom::new(parts[0], position));
            if let [.., vx, vy, vz] = &parts[4..] {
                let v: Vec<f64> = [vx, vy, vz].iter().filter_map(|w| w.parse().ok()).collect();
                if let [vx, vy, vz] = v[..] {
                    velocities.push([vx, vy, vz]);
                }
            }
        }

        let mut frame = Structure::new(name, atoms, lattice);
        if natoms > 0 && velocities.len() == natoms {
            frame.velocities = Some(velocities);
        }
        frames.push(frame);
        start += natoms + 2;
    }

    Ok(frames)
}

/// 将 Structure 转换为 XYZ 格式字符串
pub fn to_xyz_string(structure: &Structure) -> String {
    let mut result = String::new();
    result.push_str(&format!("{}\n", structure.len()));

    match &structure.lattice {
        Some(lattice) => {
            let flat: Vec<String> = lattice
                .matrix
                .iter()
                .flatten()
                .map(|v| format!("{:.10}", v))
                .collect();
            result.push_str(&format!(
                "{} Lattice=\"{}\"\n",
                structure.name,
                flat.join(" ")
            ));
        }
        None => result.push_str(&format!("{}\n", structure.name)),
    }

    for atom in &structure.atoms {
        let [x, y, z] = atom.position;
        result.push_str(&format!(
            "{:<4} {:16.10} {:16.10} {:16.10}\n",
            atom.element, x, y, z
        ));
    }

    result
}

/// 从 `geo_end.xyz` 读取最后 `natoms` 个非空行的速度 (Å/ps)
pub fn read_velocities(path: &Path, natoms: usize) -> Result<Vec<[f64; 3]>> {
    let content = read(path)?;
    parse_velocities(&content, natoms, &path.display().to_string())
}

pub fn parse_velocities(content: &str, natoms: usize, source: &str) -> Result<Vec<[f64; 3]>> {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < natoms {
        return Err(DftbKitError::parse(
            "velocities",
            source,
            format!("expected at least {} lines", natoms),
        ));
    }

    lines[lines.len() - natoms..]
        .iter()
        .map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let value = |i: usize| parts.get(i).and_then(|w| w.parse::<f64>().ok());
            match (value(5), value(6), value(7)) {
                (Some(vx), Some(vy), Some(vz)) => Ok([vx, vy, vz]),
                _ => Err(DftbKitError::parse(
                    "velocities",
                    source,
                    format!("no velocity columns in '{}'", line.trim()),
                )),
            }
        })
        .collect()
}

/// 将速度 (Å/ps) 换算为原子单位后写出，供 DFTB+ 读取
pub fn to_velocities_string(velocities: &[[f64; 3]]) -> String {
    velocities
        .iter()
        .map(|v| {
            format!(
                " {:19.16} {:19.16} {:19.16} \n",
                v[0] * VELOCITY_TO_AU,
                v[1] * VELOCITY_TO_AU,
                v[2] * VELOCITY_TO_AU
            )
        })
        .collect()
}

/// 写出原子单位速度文件
pub fn write_velocities(path: &Path, velocities: &[[f64; 3]]) -> Result<()> {
    fs::write(path, to_velocities_string(velocities)).map_err(|e| DftbKitError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_xyz() {
        let content = "3\nwater\nO 0.0 0.0 0.0\nH 0.0 0.76 0.59\nH 0.0 -0.76 0.59\n";
        let s = parse_xyz_content(content, "water").unwrap();
        assert_eq!(s.len(), 3);
        assert!(!s.is_periodic());
        assert_eq!(s.formula(), "H2O");
    }

    #[test]
    fn test_last_frame_wins() {
        let content = "1\nstep 0\nAr 0.0 0.0 0.0\n1\nstep 1\nAr 0.5 0.0 0.0\n";
        let s = parse_xyz_content(content, "ar").unwrap();
        assert!((s.atoms[0].position[0] - 0.5).abs() < 1e-12);

        assert_eq!(parse_xyz_frames(content, "ar").unwrap().len(), 2);
        assert!(parse_xyz_content("\n\n", "empty").is_err());
    }

    #[test]
    fn test_xyz_round_trip_with_lattice() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let s = Structure::new("Si", vec![Atom::new("Si", [1.0, 1.0, 1.0])], Some(lattice));

        let parsed = parse_xyz_content(&to_xyz_string(&s), "Si").unwrap();
        assert!(parsed.is_periodic());
        assert!((parsed.lattice.unwrap().volume() - 64.0).abs() < 1e-6);
        assert!((parsed.atoms[0].position[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_velocities_takes_last_frame() {
        let content = "\
2
MD iter: 0
O 0.0 0.0 0.0 -0.6 1.0 2.0 3.0
H 0.0 0.0 1.0 0.3 4.0 5.0 6.0

2
MD iter: 10
O 0.0 0.0 0.0 -0.6 0.1 0.2 0.3
H 0.0 0.0 1.0 0.3 0.4 0.5 0.6
";
        let v = parse_velocities(content, 2, "geo_end.xyz").unwrap();
        assert_eq!(v, vec![[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]);

        let frames = parse_xyz_frames(content, "geo_end").unwrap();
        assert_eq!(frames[0].velocities.as_ref().unwrap()[1], [4.0, 5.0, 6.0]);
        assert!(parse_xyz_content("1\nx\nO 0 0 0 -0.6\n", "q").unwrap().velocities.is_none());

        assert!(parse_velocities("O 0 0 0\n", 1, "geo_end.xyz").is_err());
    }

    #[test]
    fn test_velocities_in_atomic_units() {
        let text = to_velocities_string(&[[1.0, 0.0, -1.0]]);
        let values: Vec<f64> = text
            .split_whitespace()
            .map(|w| w.parse().unwrap())
            .collect();
        assert!((values[0] - VELOCITY_TO_AU).abs() < 1e-15);
        assert!((values[2] + VELOCITY_TO_AU).abs() < 1e-15);
        assert!(text.ends_with(" \n"));
    }
}
