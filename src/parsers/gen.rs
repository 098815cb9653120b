//! # DFTB+ GEN 格式解析器
//!
//! 解析与写出 DFTB+ 的 GEN 几何格式（`geo_end.gen`）。
//!
//! ## GEN 格式说明
//! ```text
//! 3  C                      # 原子数 + 类型 (C 团簇 / S 超胞 / F 分数坐标超胞)
//! O H                       # 元素列表
//! 1 1  0.0 0.0 0.0          # 序号 元素编号 x y z
//! 2 2  0.0 0.76 0.59
//! 3 2  0.0 -0.76 0.59
//! 0.0 0.0 0.0               # S/F: 原点
//! a1 a2 a3                  # S/F: 晶格向量
//! b1 b2 b3
//! c1 c2 c3
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `parsers/hsd_geometry.rs`, `calculator/dftb.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{DftbKitError, Result};
use crate::models::{Atom, Lattice, Structure};
use std::fs;
use std::path::Path;

/// 解析 .gen 文件
pub fn parse_gen_file(path: &Path) -> Result<Structure> {
    let content = fs::read_to_string(path).map_err(|e| DftbKitError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_gen_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 GEN 格式
pub fn parse_gen_content(content: &str, name: &str) -> Result<Structure> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    let gen_error = |reason: String| DftbKitError::parse("GEN geometry", name, reason);

    let header: Vec<&str> = lines
        .first()
        .ok_or_else(|| gen_error("empty input".to_string()))?
        .split_whitespace()
        .collect();
    if header.len() < 2 {
        return Err(gen_error("header must hold atom count and type".to_string()));
    }

    let natoms: usize = header[0]
        .parse()
        .map_err(|_| gen_error(format!("bad atom count '{}'", header[0])))?;
    let kind = header[1].to_ascii_uppercase();
    let (periodic, fractional) = match kind.as_str() {
        "C" => (false, false),
        "S" => (true, false),
        "F" => (true, true),
        other => return Err(gen_error(format!("unknown geometry type '{}'", other))),
    };

    let species: Vec<&str> = lines
        .get(1)
        .ok_or_else(|| gen_error("missing species line".to_string()))?
        .split_whitespace()
        .collect();

    let mut raw_atoms: Vec<(String, [f64; 3])> = Vec::with_capacity(natoms);
    for i in 0..natoms {
        let line = lines
            .get(2 + i)
            .ok_or_else(|| gen_error(format!("expected {} atom rows", natoms)))?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 {
            return Err(gen_error(format!("atom row {} is too short", i + 1)));
        }

        let type_index: usize = parts[1]
            .parse()
            .map_err(|_| gen_error(format!("bad species index '{}'", parts[1])))?;
        let element = type_index
            .checked_sub(1)
            .and_then(|t| species.get(t))
            .ok_or_else(|| gen_error(format!("species index {} out of range", type_index)))?;

        let position = parse_vector(&parts[2..5]).ok_or_else(|| {
            gen_error(format!("bad coordinates in atom row {}", i + 1))
        })?;
        raw_atoms.push((element.to_string(), position));
    }

    let lattice = if periodic {
        // 原点行之后是三行晶格向量
        let mut matrix = [[0.0; 3]; 3];
        for (i, row) in matrix.iter_mut().enumerate() {
            let line = lines
                .get(3 + natoms + i)
                .ok_or_else(|| gen_error("missing lattice vectors".to_string()))?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            *row = parts
                .get(..3)
                .and_then(parse_vector)
                .ok_or_else(|| gen_error(format!("bad lattice vector {}", i + 1)))?;
        }
        Some(Lattice::from_vectors(matrix))
    } else {
        None
    };

    let atoms = raw_atoms
        .into_iter()
        .map(|(element, position)| match (&lattice, fractional) {
            (Some(lat), true) => Atom::new(element, lat.to_cartesian(position)),
            _ => Atom::new(element, position),
        })
        .collect();

    Ok(Structure::new(name, atoms, lattice))
}

fn parse_vector(parts: &[&str]) -> Option<[f64; 3]> {
    if parts.len() < 3 {
        return None;
    }
    Some([
        parts[0].parse().ok()?,
        parts[1].parse().ok()?,
        parts[2].parse().ok()?,
    ])
}

/// 将 Structure 转换为 GEN 格式字符串（周期体系写为 S 类型）
pub fn to_gen_string(structure: &Structure) -> String {
    let species = structure.species_in_order();
    let kind = if structure.is_periodic() { "S" } else { "C" };

    let mut result = String::new();
    result.push_str(&format!("{}  {:<5}\n", structure.len(), kind));

    for symbol in &species {
        result.push_str(&format!("{:<5}", symbol));
    }
    result.push('\n');

    for (i, atom) in structure.atoms.iter().enumerate() {
        let type_index = species
            .iter()
            .position(|s| s == &atom.element)
            .map(|t| t + 1)
            .unwrap_or(1);
        let [x, y, z] = atom.position;
        result.push_str(&format!(
            "{:<6} {} {:22.15} {:22.15} {:22.15}\n",
            i + 1,
            type_index,
            x,
            y,
            z
        ));
    }

    if let Some(lattice) = &structure.lattice {
        result.push_str(&format!("{:22.15} {:22.15} {:22.15}\n", 0.0, 0.0, 0.0));
        for row in &lattice.matrix {
            result.push_str(&format!(
                "{:22.15} {:22.15} {:22.15}\n",
                row[0], row[1], row[2]
            ));
        }
    }

    result
}
