//! # 单位换算常数
//!
//! DFTB+ 输出使用原子单位，内部统一使用 eV / Å / ps。
//! 数值取自 CODATA 2014。

/// 1 Hartree 对应的能量 (eV)
pub const HARTREE: f64 = 27.211386024367243;

/// 1 Bohr 对应的长度 (Å)
pub const BOHR: f64 = 0.52917721067;

/// 1 原子时间单位对应的时间 (ps)
pub const AUT_PS: f64 = 2.418884326585747e-5;

/// Hartree/Bohr -> eV/Å
pub const FORCE_UNIT: f64 = HARTREE / BOHR;

/// Hartree/Bohr³ -> eV/Å³
pub const STRESS_UNIT: f64 = HARTREE / (BOHR * BOHR * BOHR);

/// Å/ps -> Bohr/a.u.(time)
pub const VELOCITY_TO_AU: f64 = AUT_PS / BOHR;
