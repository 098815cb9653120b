//! # HSD 输入文件几何段解析器
//!
//! 从 DFTB+ 输入文件（`dftb_in.hsd` / `dftb_pin.hsd`）的 `Geometry` 段读取结构。
//! 支持两种写法：
//! - GEN 格式：`Geometry = GenFormat { ... }`，内联内容或 `<<< "file.gen"` 引用
//! - 显式格式：`TypeNames`、`TypesAndCoordinates`、`Periodic`、`LatticeVectors`
//!
//! 显式格式默认单位为 Å；`[Bohr]` 修饰符换算为 Å，
//! `TypesAndCoordinates [relative]` 按分数坐标处理。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `commands/parse.rs` 使用
//! - 使用 `parsers/gen.rs`, `models/`

use super::gen;
use crate::error::{DftbKitError, Result};
use crate::models::units::BOHR;
use crate::models::{Atom, Lattice, Structure};
use std::fs;
use std::path::Path;

/// 解析 HSD 输入文件中的几何结构
pub fn parse_hsd_file(path: &Path) -> Result<Structure> {
    let content = fs::read_to_string(path).map_err(|e| DftbKitError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    parse_hsd_geometry(&content, name, base_dir)
}

/// 从 HSD 内容解析几何结构，`base_dir` 用于解析 `<<<` 引用
pub fn parse_hsd_geometry(content: &str, name: &str, base_dir: &Path) -> Result<Structure> {
    let lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().starts_with('#'))
        .collect();

    match lines
        .iter()
        .position(|l| l.to_lowercase().contains("genformat"))
    {
        Some(start) => parse_gen_block(&lines[start + 1..], name, base_dir),
        None => parse_explicit(&lines, name),
    }
}

/// GenFormat 块：引用文件或内联内容
fn parse_gen_block(lines: &[&str], name: &str, base_dir: &Path) -> Result<Structure> {
    let block: Vec<&str> = lines
        .iter()
        .take_while(|l| !l.contains('}'))
        .copied()
        .collect();

    if let Some(include) = block.iter().find(|l| l.contains("<<<")) {
        let file = include
            .split('"')
            .nth(1)
            .ok_or_else(|| DftbKitError::parse("Geometry", name, "bad '<<<' include line"))?;
        let mut structure = gen::parse_gen_file(&base_dir.join(file))?;
        structure.name = name.to_string();
        return Ok(structure);
    }

    gen::parse_gen_content(&block.join("\n"), name)
}

/// 方括号中的单位修饰符（小写）
fn unit_modifier(line: &str) -> Option<String> {
    let start = line.find('[')?;
    let end = line[start..].find(']')? + start;
    Some(line[start + 1..end].trim().to_lowercase())
}

fn length_scale(line: &str) -> f64 {
    match unit_modifier(line).as_deref() {
        Some("bohr") | Some("au") => BOHR,
        _ => 1.0,
    }
}

fn parse_row(line: &str) -> Option<Vec<f64>> {
    line.split_whitespace()
        .map(|w| w.parse::<f64>().ok())
        .collect()
}

/// 显式格式
fn parse_explicit(lines: &[&str], name: &str) -> Result<Structure> {
    let explicit_error = |reason: String| DftbKitError::parse("Geometry", name, reason);

    let mut type_names: Vec<String> = Vec::new();
    let mut periodic = false;
    let mut lattice: Option<Lattice> = None;

    for (i, line) in lines.iter().enumerate() {
        if line.contains("TypeNames") {
            let cols: Vec<&str> = line.split_whitespace().collect();
            for col in cols.iter().take(cols.len().saturating_sub(1)).skip(3) {
                type_names.push(col.trim_matches('"').to_string());
            }
        } else if line.contains("Periodic") {
            if line.contains("Yes") {
                periodic = true;
            }
        } else if line.contains("LatticeVectors") {
            let scale = length_scale(line);
            let mut matrix = [[0.0; 3]; 3];
            for (j, row) in matrix.iter_mut().enumerate() {
                let values = lines
                    .get(i + 1 + j)
                    .and_then(|l| parse_row(l))
                    .filter(|v| v.len() >= 3)
                    .ok_or_else(|| explicit_error(format!("bad lattice vector {}", j + 1)))?;
                *row = [values[0] * scale, values[1] * scale, values[2] * scale];
            }
            lattice = Some(Lattice::from_vectors(matrix));
        }
    }

    let header = lines
        .iter()
        .position(|l| l.contains("TypesAndCoordinates"))
        .ok_or_else(|| explicit_error("no GenFormat or TypesAndCoordinates block".to_string()))?;
    let modifier = unit_modifier(lines[header]);
    let scale = length_scale(lines[header]);
    let relative = modifier.as_deref() == Some("relative");

    let lattice = if periodic { lattice } else { None };

    let mut atoms = Vec::new();
    for line in lines[header + 1..].iter().take_while(|l| !l.contains('}')) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        if parts.len() < 4 {
            return Err(explicit_error(format!("short coordinate row '{}'", line.trim())));
        }

        let type_index: usize = parts[0]
            .parse()
            .map_err(|_| explicit_error(format!("bad type index '{}'", parts[0])))?;
        let symbol = type_index
            .checked_sub(1)
            .and_then(|t| type_names.get(t))
            .ok_or_else(|| explicit_error(format!("type index {} out of range", type_index)))?;
        let values = parse_row(&parts[1..4].join(" "))
            .ok_or_else(|| explicit_error(format!("bad coordinates '{}'", line.trim())))?;
        let raw = [values[0], values[1], values[2]];

        let position = match (&lattice, relative) {
            (Some(lat), true) => lat.to_cartesian(raw),
            _ => [raw[0] * scale, raw[1] * scale, raw[2] * scale],
        };
        atoms.push(Atom::new(symbol.clone(), position));
    }

    Ok(Structure::new(name, atoms, lattice))
}
