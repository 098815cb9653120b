//! # HSD 输入渲染
//!
//! 将扁平参数集合渲染为 DFTB+ 的 `dftb_in.hsd`。几何结构总是通过
//! `<<< "geo_end.gen"` 引用，参数按键的字节序逐个写出。
//! 每个块起始键都会被关闭：下一个键的深度不大于块所在深度时，
//! 先补齐对应数量的 `}`。
//!
//! ## 依赖关系
//! - 被 `calculator/dftb.rs` 使用
//! - 使用 `input/params.rs`, `parsers/skf.rs`

use super::params::{ParameterKind, ParameterSet};
use crate::error::Result;
use crate::parsers::skf::{homonuclear_skf_path, read_max_angular_momentum, ORBITAL_LABELS};
use std::path::Path;

/// 最大角动量参数前缀
pub const MAX_ANGULAR_MOMENTUM_PREFIX: &str = "Hamiltonian_MaxAngularMomentum_";

/// 外部点电荷文件名
pub const EXTERNAL_CHARGES_FILE: &str = "dftb_external_charges.dat";

/// 渲染时需要的计算环境
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// 计算目录，用于检查 `charges.dat` / `charges.bin`
    pub directory: &'a Path,
    /// 外部点电荷数目；`None` 表示未挂载点电荷势
    pub point_charges: Option<usize>,
    /// 是否显式请求力
    pub do_forces: bool,
}

/// 渲染结果
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedInput {
    pub text: String,
    /// 渲染过程中对参数所做的调整
    pub warnings: Vec<String>,
}

/// 用户未指定任何 `Hamiltonian_MaxAngularMomentum_<S>` 时，从同核 SKF 文件补全
pub fn with_angular_momentum_defaults(
    params: &ParameterSet,
    species: &[String],
    slako_dir: &Path,
) -> Result<ParameterSet> {
    let mut params = params.clone();
    if params.has_prefix_child(MAX_ANGULAR_MOMENTUM_PREFIX) {
        return Ok(params);
    }

    for symbol in species {
        let path = homonuclear_skf_path(slako_dir, symbol);
        let l = read_max_angular_momentum(&path, symbol)?;
        params.set(
            format!("{}{}", MAX_ANGULAR_MOMENTUM_PREFIX, symbol),
            format!("\"{}\"", ORBITAL_LABELS[l]),
        );
    }
    Ok(params)
}

fn initial_charges_available(directory: &Path) -> bool {
    ["charges.dat", "charges.bin"]
        .iter()
        .any(|f| directory.join(f).exists())
}

fn push_electric_field(out: &mut String, ncharges: usize) {
    out.push_str("   ElectricField = { \n");
    out.push_str("      PointCharges = { \n");
    out.push_str("         CoordsAndCharges [Angstrom] = DirectRead { \n");
    out.push_str(&format!("            Records = {} \n", ncharges));
    out.push_str(&format!("            File = \"{}\" \n", EXTERNAL_CHARGES_FILE));
    out.push_str("         } \n");
    out.push_str("      } \n");
    out.push_str("   } \n");
}

/// 关闭栈中深度不小于 `depth` 的块，返回关闭的数目
fn close_blocks(open: &mut Vec<usize>, depth: usize) -> usize {
    let keep = open.iter().take_while(|&&d| d < depth).count();
    let closed = open.len() - keep;
    open.truncate(keep);
    closed
}

/// 键与键之间的关闭行，缩进依次为 `3*n` .. `3`
fn push_inner_closings(out: &mut String, count: usize) {
    for level in (1..=count).rev() {
        out.push_str(&" ".repeat(3 * level));
        out.push_str("} \n");
    }
}

/// 文档末尾的关闭行，缩进依次为 `3*(n-1)` .. `0`
fn push_final_closings(out: &mut String, count: usize) {
    for level in (0..count).rev() {
        out.push_str(&" ".repeat(3 * level));
        out.push_str("} \n");
    }
}

/// 渲染完整的 `dftb_in.hsd`
pub fn render(params: &ParameterSet, ctx: &RenderContext) -> RenderedInput {
    let mut out = String::new();
    let mut warnings = Vec::new();

    out.push_str("Geometry = GenFormat { \n");
    out.push_str("    <<< \"geo_end.gen\" \n");
    out.push_str("} \n");
    out.push_str(" \n");

    // 当前打开的块所在深度，由外到内
    let mut open: Vec<usize> = Vec::new();
    for param in params.parameters() {
        let depth = param.depth();
        let value = param.value();
        let closed = close_blocks(&mut open, depth);
        push_inner_closings(&mut out, closed);
        out.push_str(&" ".repeat(3 * depth));

        match param.kind() {
            ParameterKind::BlockOpener { label } if !value.is_empty() => {
                out.push_str(&format!("{} = {}{{ \n", label, value));
            }
            ParameterKind::BlockOpener { label } if depth == 0 => {
                out.push_str(&format!("{} {{ \n", label));
            }
            ParameterKind::BlockOpener { label } => {
                out.push_str(&format!("{} = {{ \n", label));
            }
            ParameterKind::AnonymousEntry => {
                out.push_str(&format!("{} \n", value));
            }
            ParameterKind::ReadInitialCharges => {
                let wants_charges = value.trim().eq_ignore_ascii_case("yes");
                let written = if wants_charges && !initial_charges_available(ctx.directory) {
                    warnings.push(format!(
                        "No charges.dat or charges.bin in {}, ReadInitialCharges set to No",
                        ctx.directory.display()
                    ));
                    "No"
                } else {
                    value
                };
                out.push_str(&format!("ReadInitialCharges = {} \n", written));
            }
            ParameterKind::Leaf { name } => {
                out.push_str(&format!("{} = {} \n", name, value));
            }
        }

        if matches!(param.kind(), ParameterKind::BlockOpener { .. }) {
            open.push(depth);
        }

        if let Some(ncharges) = ctx.point_charges {
            if value.contains("DFTB") {
                push_electric_field(&mut out, ncharges);
            }
        }
    }
    push_final_closings(&mut out, open.len());

    out.push_str("Options { \n");
    out.push_str("   WriteResultsTag = Yes  \n");
    out.push_str("} \n");
    out.push_str("ParserOptions { \n");
    out.push_str("   IgnoreUnprocessedNodes = Yes  \n");
    out.push_str("} \n");
    if ctx.do_forces {
        out.push_str("Analysis { \n");
        out.push_str("   CalculateForces = Yes  \n");
        out.push_str("} \n");
    }

    RenderedInput {
        text: out,
        warnings,
    }
}
