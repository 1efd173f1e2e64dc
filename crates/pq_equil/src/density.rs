// crates/pq_equil/src/density.rs

//! 相密度计算
//!
//! 密度计算器是无状态函数对象：给定相、深度与局部相压力，返回
//! 该相密度。物性表在区域的**代表单元**（区域首单元）处采样，
//! 这是一种近似而非逐单元精确求值。
//!
//! 两种密度规律：
//! - [`IncompressibleDensity`]: 密度与压力无关，返回缓存的常数
//! - [`BlackoilDensity`]: 密度通过体积系数表依赖局部相压力；
//!   压力正是待求量，积分器必须以当前压力估计值反复调用本计算器

use crate::props::FluidProperties;
use crate::types::{Phase, MAX_PHASES};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================
// 混溶策略
// ============================================================

/// 混溶策略：溶解气油比 Rs 或挥发油气比 Rv
///
/// 返回给定深度与压力下的混溶比（体积比，表面条件）。
pub trait Miscibility: Send + Sync {
    /// 混溶比
    fn ratio(&self, depth: f64, pressure: f64) -> f64;
}

/// 无混溶（死油/干气）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMixing;

impl Miscibility for NoMixing {
    #[inline]
    fn ratio(&self, _depth: f64, _pressure: f64) -> f64 {
        0.0
    }
}

/// 常数混溶比
#[derive(Debug, Clone, Copy)]
pub struct ConstantMixing(pub f64);

impl Miscibility for ConstantMixing {
    #[inline]
    fn ratio(&self, _depth: f64, _pressure: f64) -> f64 {
        self.0
    }
}

// ============================================================
// 密度计算器
// ============================================================

/// 密度规律选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityModel {
    /// 不可压缩：各相密度为常数
    #[default]
    Incompressible,
    /// 黑油模型：密度经体积系数表依赖局部相压力
    Blackoil,
}

/// 相密度计算器
///
/// 纯函数：无副作用，只依赖输入。
pub trait DensityCalculator: Sync {
    /// 指定相在给定深度与局部相压力下的密度 [kg/m³]
    fn density(&self, phase: Phase, depth: f64, pressure: f64) -> f64;
}

/// 不可压缩密度：缓存的常数相密度
#[derive(Debug, Clone, Copy)]
pub struct IncompressibleDensity {
    rho: [f64; MAX_PHASES],
}

impl IncompressibleDensity {
    /// 从各相密度创建（不活跃相可填 0）
    pub fn new(rho_water: f64, rho_oil: f64, rho_gas: f64) -> Self {
        Self {
            rho: [rho_water, rho_oil, rho_gas],
        }
    }

    /// 在代表单元处采样物性表面密度
    pub fn from_props(props: &dyn FluidProperties, cell: usize) -> Self {
        let mut rho = [0.0; MAX_PHASES];
        for phase in props.phase_usage().active_phases() {
            rho[phase.index()] = props.surface_density(cell, phase);
        }
        Self { rho }
    }
}

impl DensityCalculator for IncompressibleDensity {
    #[inline]
    fn density(&self, phase: Phase, _depth: f64, _pressure: f64) -> f64 {
        self.rho[phase.index()]
    }
}

/// 黑油密度：表面密度经体积系数换算到储层条件
///
/// - 水相: `ρ_w(p) = ρ_w,surf / B_w(p)`
/// - 油相: `ρ_o(p) = (ρ_o,surf + Rs·ρ_g,surf) / B_o(p)`（溶解气）
/// - 气相: `ρ_g(p) = (ρ_g,surf + Rv·ρ_o,surf) / B_g(p)`（挥发油）
///
/// 物性表在构造时固定于代表单元。
pub struct BlackoilDensity<'a> {
    props: &'a dyn FluidProperties,
    cell: usize,
    rs: Arc<dyn Miscibility>,
    rv: Arc<dyn Miscibility>,
}

impl<'a> BlackoilDensity<'a> {
    /// 创建黑油密度计算器
    ///
    /// # 参数
    /// - `props`: 流体物性
    /// - `cell`: 代表单元（物性表采样点）
    /// - `rs`: 油相的溶解气策略
    /// - `rv`: 气相的挥发油策略
    pub fn new(
        props: &'a dyn FluidProperties,
        cell: usize,
        rs: Arc<dyn Miscibility>,
        rv: Arc<dyn Miscibility>,
    ) -> Self {
        Self {
            props,
            cell,
            rs,
            rv,
        }
    }
}

impl DensityCalculator for BlackoilDensity<'_> {
    fn density(&self, phase: Phase, depth: f64, pressure: f64) -> f64 {
        let b = self
            .props
            .formation_volume_factor(self.cell, phase, pressure);
        match phase {
            Phase::Water => self.props.surface_density(self.cell, Phase::Water) / b,
            Phase::Oil => {
                let rs = self.rs.ratio(depth, pressure);
                (self.props.surface_density(self.cell, Phase::Oil)
                    + rs * self.props.surface_density(self.cell, Phase::Gas))
                    / b
            }
            Phase::Gas => {
                let rv = self.rv.ratio(depth, pressure);
                (self.props.surface_density(self.cell, Phase::Gas)
                    + rv * self.props.surface_density(self.cell, Phase::Oil))
                    / b
            }
        }
    }
}

// ============================================================
// 测试
// ============================================================
