// crates/pq_equil/src/pressure.rs

//! 静水压力 ODE 的垂向积分
//!
//! 压力场满足 `dp/dz = ρ(z, p)·g`（深度向下为正，g 为带符号
//! 标量）。每个活跃相从各自的锚点（深度、压力）独立积分到每个
//! 单元深度；相与相之间在本步骤不耦合（与饱和度的耦合只发生在
//! 毛管压力反演中）。
//!
//! # 锚点推导链
//!
//! - 油相总是锚定在基准点 `(zdatum, pdatum)`，这是参考相压力
//! - 水相锚定在 WOC：`p_w(zwoc) = p_o(zwoc) − pc_woc`；无 WOC 时
//!   回退为基准点派生压力
//! - 气相锚定在 GOC：`p_g(zgoc) = p_o(zgoc) + pc_goc`；无 GOC 时
//!   同样回退
//!
//! 回退链表示为显式的 [`AnchorSource`] 标签选择，而非嵌套条件，
//! 便于独立于积分步骤进行单元测试。

use crate::density::DensityCalculator;
use crate::error::{EquilError, EquilResult};
use crate::grid::EquilGrid;
use crate::region::EquilRegion;
use crate::types::{EquilRecord, IntegrationParams, Phase};
use tracing::debug;

// ============================================================
// 锚点
// ============================================================

/// 相压力积分的锚点来源
///
/// 每相一个标签化选择：要么锚定在自己的接触面，要么从基准点
/// 派生（接触面缺省时的回退）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorSource {
    /// 锚定在本相自己的接触面（WOC 或 GOC）
    OwnContact {
        /// 锚点深度 [m]
        depth: f64,
        /// 锚点压力 [Pa]
        pressure: f64,
    },
    /// 接触面缺省，从基准点经毛管压力偏移派生
    DerivedFromDatum {
        /// 锚点深度 [m]（即基准深度）
        depth: f64,
        /// 锚点压力 [Pa]
        pressure: f64,
    },
}

impl AnchorSource {
    /// 锚点深度 [m]
    #[inline]
    pub fn depth(&self) -> f64 {
        match *self {
            Self::OwnContact { depth, .. } | Self::DerivedFromDatum { depth, .. } => depth,
        }
    }

    /// 锚点压力 [Pa]
    #[inline]
    pub fn pressure(&self) -> f64 {
        match *self {
            Self::OwnContact { pressure, .. } | Self::DerivedFromDatum { pressure, .. } => pressure,
        }
    }

    /// 是否锚定在接触面
    #[inline]
    pub fn is_contact(&self) -> bool {
        matches!(self, Self::OwnContact { .. })
    }
}

/// 水相锚点：WOC 存在时 `p_w = p_o(zwoc) − pc_woc`，否则基准点派生
pub fn water_anchor(record: &EquilRecord, oil: &PressureColumn<'_>) -> AnchorSource {
    match record.woc {
        Some(c) => AnchorSource::OwnContact {
            depth: c.depth,
            pressure: oil.pressure_at(c.depth) - c.pc,
        },
        None => AnchorSource::DerivedFromDatum {
            depth: record.datum_depth(),
            pressure: record.datum_pressure() - record.pc_woc(),
        },
    }
}

/// 气相锚点：GOC 存在时 `p_g = p_o(zgoc) + pc_goc`，否则基准点派生
///
/// 注意 `Pc_og = p_g − p_o`，与油水约定符号相反。
pub fn gas_anchor(record: &EquilRecord, oil: &PressureColumn<'_>) -> AnchorSource {
    match record.goc {
        Some(c) => AnchorSource::OwnContact {
            depth: c.depth,
            pressure: oil.pressure_at(c.depth) + c.pc,
        },
        None => AnchorSource::DerivedFromDatum {
            depth: record.datum_depth(),
            pressure: record.datum_pressure() + record.pc_goc(),
        },
    }
}

// ============================================================
// 单相压力柱
// ============================================================

/// 单相压力柱：从锚点向任意深度积分 `dp/dz = ρ(z, p)·g`
///
/// 可压缩模型中密度依赖待求压力，每个子步采用梯形预估-校正的
/// 不动点迭代：以步起点密度显式预估，再用两端密度平均反复校正
/// 至自洽。常数密度时首次校正即精确，退化为闭式解
/// `p(z) = p_锚 + ρ·g·(z − z_锚)`。
pub struct PressureColumn<'a> {
    phase: Phase,
    anchor_depth: f64,
    anchor_pressure: f64,
    density: &'a dyn DensityCalculator,
    gravity: f64,
    params: IntegrationParams,
}

impl<'a> PressureColumn<'a> {
    /// 创建压力柱
    pub fn new(
        phase: Phase,
        anchor_depth: f64,
        anchor_pressure: f64,
        density: &'a dyn DensityCalculator,
        gravity: f64,
        params: IntegrationParams,
    ) -> Self {
        Self {
            phase,
            anchor_depth,
            anchor_pressure,
            density,
            gravity,
            params,
        }
    }

    /// 相
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 锚点深度 [m]
    #[inline]
    pub fn anchor_depth(&self) -> f64 {
        self.anchor_depth
    }

    /// 锚点压力 [Pa]
    #[inline]
    pub fn anchor_pressure(&self) -> f64 {
        self.anchor_pressure
    }

    /// 目标深度处的相压力 [Pa]
    ///
    /// 大深度跨度被细分为不超过 `params.max_step` 的子步后逐步
    /// 推进，目标深度可以在锚点上方或下方。
    pub fn pressure_at(&self, depth: f64) -> f64 {
        let span = depth - self.anchor_depth;
        if span == 0.0 {
            return self.anchor_pressure;
        }

        let n_steps = (span.abs() / self.params.max_step).ceil().max(1.0) as usize;
        let dz = span / n_steps as f64;

        let mut z = self.anchor_depth;
        let mut p = self.anchor_pressure;
        for _ in 0..n_steps {
            let z_next = z + dz;
            let rho_a = self.density.density(self.phase, z, p);
            // 预估：步起点密度显式外推
            let mut p_next = p + rho_a * self.gravity * dz;
            // 校正：两端密度平均，迭代至自洽
            for _ in 0..self.params.max_corrections {
                let rho_b = self.density.density(self.phase, z_next, p_next);
                let p_corr = p + 0.5 * (rho_a + rho_b) * self.gravity * dz;
                let done = (p_corr - p_next).abs() <= self.params.tolerance;
                p_next = p_corr;
                if done {
                    break;
                }
            }
            z = z_next;
            p = p_next;
        }
        p
    }
}

// ============================================================
// 区域相压力
// ============================================================

/// 计算区域内每个活跃相、每个单元的压力
///
/// # 参数
/// - `grid`: 网格（只读取单元深度）
/// - `region`: 当前平衡区域
/// - `cells`: 区域单元范围（全局索引升序）
/// - `gravity`: 重力加速度 [m/s²]，深度向下为正时取正值
/// - `params`: 积分参数
///
/// # 返回
/// 按致密相位置索引的压力向量，每个向量与 `cells` 迭代顺序一致。
///
/// # 错误
/// 基准深度不在油区内或相组合不受支持时返回致命配置错误，
/// 在任何积分工作开始前检出。
pub fn phase_pressures(
    grid: &dyn EquilGrid,
    region: &EquilRegion<'_>,
    cells: &[usize],
    gravity: f64,
    params: &IntegrationParams,
) -> EquilResult<Vec<Vec<f64>>> {
    region.validate()?;

    let usage = *region.phase_usage();
    let record = region.record();
    let density = region.density_calculator();

    let Some(oil_pos) = usage.pos(Phase::Oil) else {
        return Err(EquilError::unsupported_phases("油相为参考相, 必须活跃"));
    };

    // 油相总是锚定在基准点（参考相）
    let oil = PressureColumn::new(
        Phase::Oil,
        record.datum_depth(),
        record.datum_pressure(),
        density,
        gravity,
        *params,
    );

    // 水/气锚点经显式回退链推导
    let water = usage.pos(Phase::Water).map(|pos| {
        let anchor = water_anchor(record, &oil);
        debug!(
            region = region.region_id(),
            depth = anchor.depth(),
            pressure = anchor.pressure(),
            contact = anchor.is_contact(),
            "水相锚点"
        );
        (
            pos,
            PressureColumn::new(
                Phase::Water,
                anchor.depth(),
                anchor.pressure(),
                density,
                gravity,
                *params,
            ),
        )
    });
    let gas = usage.pos(Phase::Gas).map(|pos| {
        let anchor = gas_anchor(record, &oil);
        debug!(
            region = region.region_id(),
            depth = anchor.depth(),
            pressure = anchor.pressure(),
            contact = anchor.is_contact(),
            "气相锚点"
        );
        (
            pos,
            PressureColumn::new(
                Phase::Gas,
                anchor.depth(),
                anchor.pressure(),
                density,
                gravity,
                *params,
            ),
        )
    });

    let mut pressures = vec![vec![0.0; cells.len()]; usage.num_phases()];
    for (i, &cell) in cells.iter().enumerate() {
        let z = grid.cell_depth(cell);
        pressures[oil_pos][i] = oil.pressure_at(z);
        if let Some((pos, col)) = &water {
            pressures[*pos][i] = col.pressure_at(z);
        }
        if let Some((pos, col)) = &gas {
            pressures[*pos][i] = col.pressure_at(z);
        }
    }
    Ok(pressures)
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::IncompressibleDensity;
    use crate::types::{Contact, DatumPoint};

    const G: f64 = 9.81;

    fn oil_column<'a>(density: &'a IncompressibleDensity) -> PressureColumn<'a> {
        PressureColumn::new(
            Phase::Oil,
            2000.0,
            3.0e7,
            density,
            G,
            IntegrationParams::default(),
        )
    }

    #[test]
    fn test_incompressible_closed_form_below_anchor() {
        let rho = IncompressibleDensity::new(1000.0, 800.0, 1.2);
        let col = oil_column(&rho);
        // p(z) = p0 + ρ g (z − z0)，锚点下方 50 m
        let expected = 3.0e7 + 800.0 * G * 50.0;
        assert!((col.pressure_at(2050.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_incompressible_closed_form_above_anchor() {
        let rho = IncompressibleDensity::new(1000.0, 800.0, 1.2);
        let col = oil_column(&rho);
        let expected = 3.0e7 - 800.0 * G * 120.0;
        assert!((col.pressure_at(1880.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_pressure_at_anchor_is_anchor_pressure() {
        let rho = IncompressibleDensity::new(1000.0, 800.0, 1.2);
        let col = oil_column(&rho);
        assert_eq!(col.pressure_at(2000.0), 3.0e7);
    }

    #[test]
    fn test_pressure_monotone_with_depth() {
        let rho = IncompressibleDensity::new(1000.0, 800.0, 1.2);
        let col = oil_column(&rho);
        let mut prev = col.pressure_at(1900.0);
        for i in 1..=20 {
            let z = 1900.0 + 10.0 * i as f64;
            let p = col.pressure_at(z);
            assert!(p >= prev, "压力必须随深度单调增加: z={z}");
            prev = p;
        }
    }

    /// 密度随压力线性变化的简单可压缩模型
    struct LinearCompressible {
        rho0: f64,
        p_ref: f64,
        slope: f64,
    }

    impl DensityCalculator for LinearCompressible {
        fn density(&self, _phase: Phase, _depth: f64, pressure: f64) -> f64 {
            self.rho0 + self.slope * (pressure - self.p_ref)
        }
    }

    #[test]
    fn test_compressible_self_consistent() {
        let model = LinearCompressible {
            rho0: 800.0,
            p_ref: 3.0e7,
            slope: 5.0e-6,
        };
        let params = IntegrationParams::default();
        let col = PressureColumn::new(Phase::Oil, 2000.0, 3.0e7, &model, G, params);

        let z = 2100.0;
        let p = col.pressure_at(z);
        // 压力应高于用锚点密度的显式估计（密度随压力增加）
        let explicit = 3.0e7 + 800.0 * G * 100.0;
        assert!(p > explicit);
        // 且低于用最终密度的全程估计
        let rho_end = model.density(Phase::Oil, z, p);
        assert!(p < 3.0e7 + rho_end * G * 100.0);
    }

    #[test]
    fn test_water_anchor_own_contact() {
        let rho = IncompressibleDensity::new(1000.0, 800.0, 1.2);
        let oil = oil_column(&rho);
        let record = EquilRecord::new(
            DatumPoint {
                depth: 2000.0,
                pressure: 3.0e7,
            },
            Some(Contact {
                depth: 2100.0,
                pc: 2.0e4,
            }),
            None,
        );
        let anchor = water_anchor(&record, &oil);
        assert!(anchor.is_contact());
        assert_eq!(anchor.depth(), 2100.0);
        // p_w(zwoc) = p_o(zwoc) − pc_woc
        let expected = (3.0e7 + 800.0 * G * 100.0) - 2.0e4;
        assert!((anchor.pressure() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_water_anchor_fallback_to_datum() {
        let rho = IncompressibleDensity::new(1000.0, 800.0, 1.2);
        let oil = oil_column(&rho);
        let record = EquilRecord::new(
            DatumPoint {
                depth: 2000.0,
                pressure: 3.0e7,
            },
            None,
            None,
        );
        let anchor = water_anchor(&record, &oil);
        assert!(!anchor.is_contact());
        assert_eq!(anchor.depth(), 2000.0);
        assert_eq!(anchor.pressure(), 3.0e7);
    }

    #[test]
    fn test_gas_anchor_sign_convention() {
        let rho = IncompressibleDensity::new(1000.0, 800.0, 1.2);
        let oil = oil_column(&rho);
        let record = EquilRecord::new(
            DatumPoint {
                depth: 2000.0,
                pressure: 3.0e7,
            },
            None,
            Some(Contact {
                depth: 1950.0,
                pc: 5.0e4,
            }),
        );
        let anchor = gas_anchor(&record, &oil);
        assert!(anchor.is_contact());
        // p_g(zgoc) = p_o(zgoc) + pc_goc（注意加号）
        let expected = (3.0e7 - 800.0 * G * 50.0) + 5.0e4;
        assert!((anchor.pressure() - expected).abs() < 1e-6);
    }
}
