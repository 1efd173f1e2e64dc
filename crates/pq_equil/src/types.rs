// crates/pq_equil/src/types.rs

//! 平衡初始化核心类型定义
//!
//! 本模块提供引擎所需的类型系统，包括：
//! - **相枚举**：`Phase`（水/油/气）
//! - **相使用配置**：`PhaseUsage` 记录活跃相及其致密位置索引
//! - **平衡记录**：`EquilRecord` 对应 ECLIPSE EQUIL 关键字的一行
//! - **数值参数**：`IntegrationParams` 与 `InversionParams`，
//!   显式暴露校正迭代次数与收敛容差，不使用隐藏常数

use crate::error::{EquilError, EquilResult};
use serde::{Deserialize, Serialize};

/// 最大相数（水、油、气）
pub const MAX_PHASES: usize = 3;

// ============================================================
// 相与相使用配置
// ============================================================

/// 流体相
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// 水相
    Water,
    /// 油相（参考相，基准压力定义于此相）
    Oil,
    /// 气相
    Gas,
}

impl Phase {
    /// 全部相，按规范顺序（水、油、气）
    pub const ALL: [Phase; MAX_PHASES] = [Phase::Water, Phase::Oil, Phase::Gas];

    /// 规范索引（0=水, 1=油, 2=气）
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Phase::Water => 0,
            Phase::Oil => 1,
            Phase::Gas => 2,
        }
    }

    /// 相名称（用于日志与输出）
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Water => "water",
            Phase::Oil => "oil",
            Phase::Gas => "gas",
        }
    }
}

/// 相使用配置
///
/// 记录哪些相处于活跃状态，以及每个活跃相在致密相数组中的
/// 位置索引（0..num_phases）。整个运行期共享、只读。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseUsage {
    used: [bool; MAX_PHASES],
    pos: [usize; MAX_PHASES],
    num_phases: usize,
}

impl PhaseUsage {
    /// 从活跃相标志创建
    ///
    /// 致密位置按规范顺序（水、油、气）分配。
    pub fn new(water: bool, oil: bool, gas: bool) -> Self {
        let used = [water, oil, gas];
        let mut pos = [usize::MAX; MAX_PHASES];
        let mut num_phases = 0;
        for phase in Phase::ALL {
            if used[phase.index()] {
                pos[phase.index()] = num_phases;
                num_phases += 1;
            }
        }
        Self {
            used,
            pos,
            num_phases,
        }
    }

    /// 油水两相系统
    pub fn water_oil() -> Self {
        Self::new(true, true, false)
    }

    /// 油气两相系统
    pub fn oil_gas() -> Self {
        Self::new(false, true, true)
    }

    /// 水油气三相系统
    pub fn three_phase() -> Self {
        Self::new(true, true, true)
    }

    /// 活跃相数量
    #[inline]
    pub fn num_phases(&self) -> usize {
        self.num_phases
    }

    /// 相是否活跃
    #[inline]
    pub fn is_used(&self, phase: Phase) -> bool {
        self.used[phase.index()]
    }

    /// 活跃相的致密位置索引
    ///
    /// 相不活跃时返回 `None`。
    #[inline]
    pub fn pos(&self, phase: Phase) -> Option<usize> {
        if self.is_used(phase) {
            Some(self.pos[phase.index()])
        } else {
            None
        }
    }

    /// 按致密顺序迭代活跃相
    pub fn active_phases(&self) -> impl Iterator<Item = Phase> + '_ {
        Phase::ALL.into_iter().filter(|p| self.is_used(*p))
    }
}

// ============================================================
// 平衡记录
// ============================================================

/// 基准点：深度及该处定义的油相压力
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatumPoint {
    /// 基准深度 [m]
    pub depth: f64,
    /// 基准深度处的油相压力 [Pa]
    pub pressure: f64,
}

/// 流体接触面：深度及该处的毛管压力边界条件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// 接触面深度 [m]
    pub depth: f64,
    /// 接触面处的毛管压力 [Pa]
    ///
    /// 油水接触面取 `Pc_ow = p_o − p_w`，气油接触面取 `Pc_og = p_g − p_o`。
    pub pc: f64,
}

/// 平衡记录
///
/// 每个平衡区域一条，解析后不可变。对应 ECLIPSE EQUIL 关键字一行的
/// 前六个数值字段（第七个精度调节字段不属于本引擎契约，被忽略）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilRecord {
    /// 基准点（深度 + 油相压力）
    pub datum: DatumPoint,
    /// 油水接触面（WOC），缺省表示区域内无水油过渡
    pub woc: Option<Contact>,
    /// 气油接触面（GOC），缺省表示区域内无气油过渡
    pub goc: Option<Contact>,
}

impl EquilRecord {
    /// 创建记录
    pub fn new(datum: DatumPoint, woc: Option<Contact>, goc: Option<Contact>) -> Self {
        Self { datum, goc, woc }
    }

    /// 从原始字段数组解析
    ///
    /// 字段顺序与 EQUIL 行一致：
    /// `[datum_depth, datum_pressure, woc_depth, pc_woc, goc_depth, pc_goc, (accuracy)]`
    ///
    /// 接受 6 或 7 个字段；第七个字段被忽略。接触面深度为 NaN 时
    /// 视为该接触面缺省。
    pub fn from_raw(fields: &[f64]) -> EquilResult<Self> {
        if fields.len() != 6 && fields.len() != 7 {
            return Err(EquilError::SizeMismatch {
                name: "EquilRecord 字段",
                expected: 6,
                actual: fields.len(),
            });
        }
        if !fields[0].is_finite() || !fields[1].is_finite() {
            return Err(EquilError::invalid_input("基准深度与基准压力必须为有限值"));
        }

        let contact = |depth: f64, pc: f64| -> Option<Contact> {
            if depth.is_nan() {
                None
            } else {
                Some(Contact {
                    depth,
                    pc: if pc.is_nan() { 0.0 } else { pc },
                })
            }
        };

        Ok(Self {
            datum: DatumPoint {
                depth: fields[0],
                pressure: fields[1],
            },
            woc: contact(fields[2], fields[3]),
            goc: contact(fields[4], fields[5]),
        })
    }

    /// 基准深度 [m]
    #[inline]
    pub fn datum_depth(&self) -> f64 {
        self.datum.depth
    }

    /// 基准压力（油相） [Pa]
    #[inline]
    pub fn datum_pressure(&self) -> f64 {
        self.datum.pressure
    }

    /// 油水接触面深度，缺省时为 +∞（油区向下无界）
    #[inline]
    pub fn zwoc(&self) -> f64 {
        self.woc.map(|c| c.depth).unwrap_or(f64::INFINITY)
    }

    /// 气油接触面深度，缺省时为 −∞（油区向上无界）
    #[inline]
    pub fn zgoc(&self) -> f64 {
        self.goc.map(|c| c.depth).unwrap_or(f64::NEG_INFINITY)
    }

    /// WOC 处的毛管压力 `p_o − p_w`，缺省时为 0
    #[inline]
    pub fn pc_woc(&self) -> f64 {
        self.woc.map(|c| c.pc).unwrap_or(0.0)
    }

    /// GOC 处的毛管压力 `p_g − p_o`，缺省时为 0
    #[inline]
    pub fn pc_goc(&self) -> f64 {
        self.goc.map(|c| c.pc).unwrap_or(0.0)
    }
}

// ============================================================
// 数值参数
// ============================================================

/// 压力 ODE 积分参数
///
/// 可压缩模型中密度依赖于待求压力，积分采用梯形预估-校正的
/// 小型不动点迭代。校正次数与收敛容差是显式配置。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationParams {
    /// 每个积分步的最大校正迭代次数
    pub max_corrections: usize,
    /// 压力自洽收敛容差 [Pa]
    pub tolerance: f64,
    /// 最大积分步长 [m]，大深度跨度被细分为不超过该长度的子步
    pub max_step: f64,
}

impl Default for IntegrationParams {
    fn default() -> Self {
        Self {
            max_corrections: 8,
            tolerance: 1e-6,
            max_step: 25.0,
        }
    }
}

impl IntegrationParams {
    /// 创建积分参数
    pub fn new(max_corrections: usize, tolerance: f64) -> Self {
        Self {
            max_corrections,
            tolerance,
            ..Default::default()
        }
    }
}

/// 毛管压力反演参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InversionParams {
    /// 饱和度区间收敛容差
    pub tolerance: f64,
    /// 最大二分迭代次数
    pub max_iterations: usize,
}

impl Default for InversionParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 60,
        }
    }
}

impl InversionParams {
    /// 创建反演参数
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }
}

// ============================================================
// 测试
// ============================================================
