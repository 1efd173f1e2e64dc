// crates/pq_equil/src/props.rs

//! 流体物性契约
//!
//! 引擎通过 [`FluidProperties`] 访问每个单元的饱和度界限、毛管压力
//! 函数、表面密度与体积系数，不依赖物性模型的内部实现。
//!
//! # 符号约定（领域惯例，两个方向相反）
//!
//! - `pc_ow(Sw) = p_o − p_w`，对 Sw **单调递减**
//! - `pc_og(Sg) = p_g − p_o`，对 Sg **单调递增**

use crate::error::{EquilError, EquilResult};
use crate::types::{Phase, PhaseUsage, MAX_PHASES};
use serde::{Deserialize, Serialize};

// ============================================================
// 饱和度界限
// ============================================================

/// 单元的各相饱和度界限，按规范相索引（0=水, 1=油, 2=气）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatRange {
    /// 最小饱和度
    pub smin: [f64; MAX_PHASES],
    /// 最大饱和度
    pub smax: [f64; MAX_PHASES],
}

impl SatRange {
    /// 指定相的界限 `[smin, smax]`
    #[inline]
    pub fn bounds(&self, phase: Phase) -> (f64, f64) {
        (self.smin[phase.index()], self.smax[phase.index()])
    }
}

// ============================================================
// 物性接口
// ============================================================

/// 流体物性接口
///
/// 每单元查询接口；实现可以在内部按单元、按区域或全局均匀地
/// 存储物性表。毛管压力的两个符号约定见模块文档。
pub trait FluidProperties: Sync {
    /// 相使用配置（全局共享，只读）
    fn phase_usage(&self) -> PhaseUsage;

    /// 物性覆盖的单元总数
    fn n_cells(&self) -> usize;

    /// 单元的饱和度界限
    fn sat_range(&self, cell: usize) -> SatRange;

    /// 油水毛管压力 `p_o − p_w` [Pa]，对 Sw 单调递减
    fn pc_ow(&self, cell: usize, sw: f64) -> f64;

    /// 气油毛管压力 `p_g − p_o` [Pa]，对 Sg 单调递增
    fn pc_og(&self, cell: usize, sg: f64) -> f64;

    /// 表面（参考）密度 [kg/m³]
    fn surface_density(&self, cell: usize, phase: Phase) -> f64;

    /// 体积系数 B(p)，无量纲
    ///
    /// 缺省实现返回 1.0（不可压缩流体）。
    fn formation_volume_factor(&self, _cell: usize, _phase: Phase, _pressure: f64) -> f64 {
        1.0
    }
}

// ============================================================
// 分段线性表
// ============================================================

/// 毛管压力表：饱和度 → 毛管压力的单调分段线性函数
///
/// 饱和度节点严格递增；压力值必须整体单调（方向任意）。
/// 表域外取端点值（钳位外推）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcTable {
    sat: Vec<f64>,
    pc: Vec<f64>,
}

impl PcTable {
    /// 创建毛管压力表
    pub fn new(sat: Vec<f64>, pc: Vec<f64>) -> EquilResult<Self> {
        if sat.len() < 2 || sat.len() != pc.len() {
            return Err(EquilError::SizeMismatch {
                name: "PcTable 节点",
                expected: sat.len().max(2),
                actual: pc.len(),
            });
        }
        for w in sat.windows(2) {
            if !(w[1] > w[0]) {
                return Err(EquilError::invalid_input("毛管压力表饱和度节点必须严格递增"));
            }
        }
        let increasing = pc[pc.len() - 1] > pc[0];
        for w in pc.windows(2) {
            let ok = if increasing { w[1] >= w[0] } else { w[1] <= w[0] };
            if !ok || !w[0].is_finite() {
                return Err(EquilError::invalid_input("毛管压力表必须整体单调且有限"));
            }
        }
        Ok(Self { sat, pc })
    }

    /// 饱和度定义域下界
    #[inline]
    pub fn smin(&self) -> f64 {
        self.sat[0]
    }

    /// 饱和度定义域上界
    #[inline]
    pub fn smax(&self) -> f64 {
        *self.sat.last().unwrap_or(&1.0)
    }

    /// 表是否单调递增
    #[inline]
    pub fn is_increasing(&self) -> bool {
        self.pc[self.pc.len() - 1] > self.pc[0]
    }

    /// 求值（线性插值，域外钳位）
    pub fn eval(&self, s: f64) -> f64 {
        if s <= self.smin() {
            return self.pc[0];
        }
        if s >= self.smax() {
            return self.pc[self.pc.len() - 1];
        }
        // partition_point: 第一个 sat[i] > s 的位置
        let hi = self.sat.partition_point(|&x| x <= s);
        let lo = hi - 1;
        let t = (s - self.sat[lo]) / (self.sat[hi] - self.sat[lo]);
        self.pc[lo] + t * (self.pc[hi] - self.pc[lo])
    }
}

/// 体积系数表：压力 → B(p) 的分段线性函数
///
/// 压力节点严格递增，B 值为正。表域外取端点值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FvfTable {
    pressure: Vec<f64>,
    fvf: Vec<f64>,
}

impl FvfTable {
    /// 创建体积系数表
    pub fn new(pressure: Vec<f64>, fvf: Vec<f64>) -> EquilResult<Self> {
        if pressure.len() < 2 || pressure.len() != fvf.len() {
            return Err(EquilError::SizeMismatch {
                name: "FvfTable 节点",
                expected: pressure.len().max(2),
                actual: fvf.len(),
            });
        }
        for w in pressure.windows(2) {
            if !(w[1] > w[0]) {
                return Err(EquilError::invalid_input("体积系数表压力节点必须严格递增"));
            }
        }
        if fvf.iter().any(|&b| !(b.is_finite() && b > 0.0)) {
            return Err(EquilError::invalid_input("体积系数必须为正的有限值"));
        }
        Ok(Self { pressure, fvf })
    }

    /// 求值（线性插值，域外钳位）
    pub fn eval(&self, p: f64) -> f64 {
        if p <= self.pressure[0] {
            return self.fvf[0];
        }
        let n = self.pressure.len();
        if p >= self.pressure[n - 1] {
            return self.fvf[n - 1];
        }
        let hi = self.pressure.partition_point(|&x| x <= p);
        let lo = hi - 1;
        let t = (p - self.pressure[lo]) / (self.pressure[hi] - self.pressure[lo]);
        self.fvf[lo] + t * (self.fvf[hi] - self.fvf[lo])
    }
}

// ============================================================
// 表驱动物性实现
// ============================================================

/// 表驱动的均匀物性
///
/// 所有单元共享同一组物性表。接口仍按单元查询，以便将来替换为
/// 按单元分表的实现而不改动引擎。
#[derive(Debug, Clone)]
pub struct TableProperties {
    usage: PhaseUsage,
    n_cells: usize,
    rho_surface: [f64; MAX_PHASES],
    pc_ow: Option<PcTable>,
    pc_og: Option<PcTable>,
    fvf: [Option<FvfTable>; MAX_PHASES],
}

impl TableProperties {
    /// 创建表驱动物性
    ///
    /// 水相活跃时必须提供油水毛管压力表；气相活跃时必须提供
    /// 气油毛管压力表。活跃相的表面密度必须为正。
    pub fn new(
        usage: PhaseUsage,
        n_cells: usize,
        rho_surface: [f64; MAX_PHASES],
        pc_ow: Option<PcTable>,
        pc_og: Option<PcTable>,
    ) -> EquilResult<Self> {
        for phase in usage.active_phases() {
            let rho = rho_surface[phase.index()];
            if !(rho.is_finite() && rho > 0.0) {
                return Err(EquilError::invalid_input(format!(
                    "{} 相表面密度无效: {rho}",
                    phase.name()
                )));
            }
        }
        if usage.is_used(Phase::Water) && pc_ow.is_none() {
            return Err(EquilError::invalid_input("水相活跃但缺少油水毛管压力表"));
        }
        if usage.is_used(Phase::Gas) && pc_og.is_none() {
            return Err(EquilError::invalid_input("气相活跃但缺少气油毛管压力表"));
        }
        if let Some(t) = &pc_ow {
            if t.is_increasing() {
                return Err(EquilError::invalid_input(
                    "油水毛管压力表必须对 Sw 单调递减 (Pc_ow = p_o − p_w)",
                ));
            }
        }
        if let Some(t) = &pc_og {
            if !t.is_increasing() {
                return Err(EquilError::invalid_input(
                    "气油毛管压力表必须对 Sg 单调递增 (Pc_og = p_g − p_o)",
                ));
            }
        }
        Ok(Self {
            usage,
            n_cells,
            rho_surface,
            pc_ow,
            pc_og,
            fvf: [None, None, None],
        })
    }

    /// 为指定相设置体积系数表（可压缩模型）
    pub fn with_fvf(mut self, phase: Phase, table: FvfTable) -> Self {
        self.fvf[phase.index()] = Some(table);
        self
    }
}

impl FluidProperties for TableProperties {
    fn phase_usage(&self) -> PhaseUsage {
        self.usage
    }

    fn n_cells(&self) -> usize {
        self.n_cells
    }

    fn sat_range(&self, _cell: usize) -> SatRange {
        let mut smin = [0.0; MAX_PHASES];
        let mut smax = [0.0; MAX_PHASES];
        if let Some(t) = &self.pc_ow {
            smin[Phase::Water.index()] = t.smin();
            smax[Phase::Water.index()] = t.smax();
        }
        if let Some(t) = &self.pc_og {
            smin[Phase::Gas.index()] = t.smin();
            smax[Phase::Gas.index()] = t.smax();
        }
        if self.usage.is_used(Phase::Oil) {
            smax[Phase::Oil.index()] = 1.0;
        }
        SatRange { smin, smax }
    }

    fn pc_ow(&self, _cell: usize, sw: f64) -> f64 {
        self.pc_ow.as_ref().map(|t| t.eval(sw)).unwrap_or(0.0)
    }

    fn pc_og(&self, _cell: usize, sg: f64) -> f64 {
        self.pc_og.as_ref().map(|t| t.eval(sg)).unwrap_or(0.0)
    }

    fn surface_density(&self, _cell: usize, phase: Phase) -> f64 {
        self.rho_surface[phase.index()]
    }

    fn formation_volume_factor(&self, _cell: usize, phase: Phase, pressure: f64) -> f64 {
        self.fvf[phase.index()]
            .as_ref()
            .map(|t| t.eval(pressure))
            .unwrap_or(1.0)
    }
}

// ============================================================
// 测试
// ============================================================
