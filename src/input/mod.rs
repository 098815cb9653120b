//! # DFTB+ 输入生成模块
//!
//! 扁平参数集合、k 点设置与 `dftb_in.hsd` 渲染。
//!
//! ## 依赖关系
//! - 被 `calculator/`, `cli/`, `commands/` 使用
//! - 子模块: params, kpoints, renderer

pub mod kpoints;
pub mod params;
pub mod renderer;

pub use kpoints::KPoints;
pub use params::ParameterSet;
pub use renderer::{render, with_angular_momentum_defaults, RenderContext, RenderedInput};
