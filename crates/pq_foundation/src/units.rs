// crates/pq_foundation/src/units.rs

//! 单位常量与换算
//!
//! 项目内部所有数值使用 SI 单位（米、秒、千克、帕斯卡），
//! 工程单位（bar、psi）只在输入输出边界换算。
//!
//! # 约定
//!
//! - 深度向下为正，单位 m
//! - 压力单位 Pa，储层工程常用 bar（1 bar = 1e5 Pa）
//! - 重力加速度为带符号标量，深度向下为正时取正值

/// 标准重力加速度 [m/s²]
pub const GRAVITY: f64 = 9.80665;

/// 1 bar 对应的帕斯卡数
pub const BARSA: f64 = 1.0e5;

/// 1 psi 对应的帕斯卡数
pub const PSIA: f64 = 6.894757e3;

/// 标准大气压 [Pa]
pub const ATM: f64 = 101_325.0;

/// bar 转 Pa
#[inline]
pub fn from_bar(p: f64) -> f64 {
    p * BARSA
}

/// Pa 转 bar
#[inline]
pub fn to_bar(p: f64) -> f64 {
    p / BARSA
}

/// psi 转 Pa
#[inline]
pub fn from_psi(p: f64) -> f64 {
    p * PSIA
}

/// Pa 转 psi
#[inline]
pub fn to_psi(p: f64) -> f64 {
    p / PSIA
}
