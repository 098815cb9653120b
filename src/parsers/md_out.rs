//! # DFTB+ 分子动力学日志解析器
//!
//! 从 MD 输出（通常为 `md.out`）中提取每一步的晶格向量。
//!
//! ```text
//! Lattice vectors (A)
//!    5.43   0.00   0.00
//!    0.00   5.43   0.00
//!    0.00   0.00   5.43
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/md.rs` 使用
//! - 使用 `parsers/document.rs`

use super::document::{parse_floats, OutputDocument};
use crate::error::{DftbKitError, Result};
use crate::models::{Lattice, Structure};

/// 提取所有 `Lattice vectors` 块
pub fn parse_lattices(doc: &OutputDocument) -> Result<Vec<Lattice>> {
    let mut lattices = Vec::new();

    for (i, line) in doc.lines().iter().enumerate() {
        if !line.contains("Lattice vectors") {
            continue;
        }

        let mut matrix = [[0.0; 3]; 3];
        for (j, row) in matrix.iter_mut().enumerate() {
            let values = doc
                .line(i + 1 + j)
                .ok_or_else(|| "file ended inside lattice block".to_string())
                .and_then(parse_floats)
                .map_err(|e| DftbKitError::parse("Lattice vectors", doc.path(), e))?;
            if values.len() != 3 {
                return Err(DftbKitError::parse(
                    "Lattice vectors",
                    doc.path(),
                    format!("row {} has {} elements, expected 3", i + 2 + j, values.len()),
                ));
            }
            *row = [values[0], values[1], values[2]];
        }
        lattices.push(Lattice::from_vectors(matrix));
    }

    Ok(lattices)
}

/// 将晶格逐帧赋给结构序列；两者数量必须一致
pub fn apply_lattices(images: &mut [Structure], lattices: &[Lattice]) -> Result<()> {
    if images.len() != lattices.len() {
        return Err(DftbKitError::InvalidArgument(format!(
            "{} structures but {} lattice blocks",
            images.len(),
            lattices.len()
        )));
    }

    for (image, lattice) in images.iter_mut().zip(lattices) {
        image.lattice = Some(lattice.clone());
    }
    Ok(())
}
