//! # DFTB+ 计算器模块
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 子模块: dftb, pcpot

pub mod dftb;
pub mod pcpot;

pub use dftb::Dftb;
pub use pcpot::PointChargePotential;
