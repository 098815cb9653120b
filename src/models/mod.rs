//! # 数据模型模块
//!
//! 定义统一的原子结构、计算结果数据模型及单位常数。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`input/`、`calculator/` 和 `commands/` 使用
//! - 子模块: structure, calculation, units

pub mod calculation;
pub mod structure;
pub mod units;

pub use calculation::DftbResults;
pub use structure::{Atom, Lattice, Structure};
