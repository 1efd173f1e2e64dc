// crates/pq_equil/src/scenario.rs

//! 场景配置
//!
//! 自描述的 JSON/serde 场景定义，把一次平衡初始化所需的全部输入
//! （网格、区域划分、平衡记录、流体物性、数值参数）捆绑为一个
//! 可序列化结构。配置文件中压力与毛管压力以 bar 为单位书写，
//! 构建时换算为 Pa。
//!
//! 配置只做形式校验（字段存在、尺寸一致）；物理合法性（基准
//! 深度位于油区等）由驱动器在初始化前统一检出。

use crate::density::DensityModel;
use crate::driver::{EquilOptions, RegionStrategy};
use crate::error::{EquilError, EquilResult};
use crate::grid::DepthColumn;
use crate::props::{FvfTable, PcTable, TableProperties};
use crate::region::RegionMapping;
use crate::types::{
    Contact, DatumPoint, EquilRecord, IntegrationParams, InversionParams, Phase, PhaseUsage,
};
use pq_foundation::{ensure, units};
use serde::{Deserialize, Serialize};

// ============================================================
// 配置结构
// ============================================================

/// 网格定义：显式深度数组，或等厚层序区间
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridConfig {
    /// 等厚层序：`[top, bottom]` 区间内 `n_cells` 个单元
    Interval {
        /// 顶部深度 [m]
        top: f64,
        /// 底部深度 [m]
        bottom: f64,
        /// 单元数量
        n_cells: usize,
    },
    /// 显式单元中心深度数组 [m]
    Depths {
        /// 单元中心深度
        depths: Vec<f64>,
    },
}

/// 接触面配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContactConfig {
    /// 接触面深度 [m]
    pub depth: f64,
    /// 接触面处的毛管压力 [bar]
    #[serde(default)]
    pub pc_bar: f64,
}

/// 平衡记录配置（每区域一条，压力以 bar 书写）
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecordConfig {
    /// 基准深度 [m]
    pub datum_depth: f64,
    /// 基准深度处的油相压力 [bar]
    pub datum_pressure_bar: f64,
    /// 油水接触面，缺省表示无
    #[serde(default)]
    pub woc: Option<ContactConfig>,
    /// 气油接触面，缺省表示无
    #[serde(default)]
    pub goc: Option<ContactConfig>,
}

/// 活跃相标志
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhasesConfig {
    /// 水相活跃
    #[serde(default)]
    pub water: bool,
    /// 油相活跃
    #[serde(default)]
    pub oil: bool,
    /// 气相活跃
    #[serde(default)]
    pub gas: bool,
}

/// 各相表面密度 [kg/m³]（不活跃相可省略）
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SurfaceDensityConfig {
    /// 水相
    #[serde(default)]
    pub water: f64,
    /// 油相
    #[serde(default)]
    pub oil: f64,
    /// 气相
    #[serde(default)]
    pub gas: f64,
}

/// 体积系数表配置（压力节点以 bar 书写）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FvfTableConfig {
    /// 压力节点 [bar]，严格递增
    pub pressure_bar: Vec<f64>,
    /// 对应的体积系数 B(p)
    pub fvf: Vec<f64>,
}

/// 各相体积系数表（可压缩模型用，省略的相 B ≡ 1）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FvfConfig {
    /// 水相
    #[serde(default)]
    pub water: Option<FvfTableConfig>,
    /// 油相
    #[serde(default)]
    pub oil: Option<FvfTableConfig>,
    /// 气相
    #[serde(default)]
    pub gas: Option<FvfTableConfig>,
}

/// 流体定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluidConfig {
    /// 活跃相
    pub phases: PhasesConfig,
    /// 表面密度
    pub surface_density: SurfaceDensityConfig,
    /// 密度规律
    #[serde(default)]
    pub model: DensityModel,
    /// 常数溶解气油比 Rs（黑油模型）
    #[serde(default)]
    pub dissolved_gas: Option<f64>,
    /// 常数挥发油气比 Rv（黑油模型）
    #[serde(default)]
    pub vaporized_oil: Option<f64>,
    /// 体积系数表
    #[serde(default)]
    pub fvf: FvfConfig,
}

/// 毛管压力表配置（毛管压力以 bar 书写）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcTableConfig {
    /// 饱和度节点，严格递增
    pub sat: Vec<f64>,
    /// 对应的毛管压力 [bar]
    pub pc_bar: Vec<f64>,
}

/// 毛管压力定义
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapillaryConfig {
    /// 油水表 `Pc_ow(Sw) = p_o − p_w`，对 Sw 递减；水相活跃时必填
    #[serde(default)]
    pub ow: Option<PcTableConfig>,
    /// 气油表 `Pc_og(Sg) = p_g − p_o`，对 Sg 递增；气相活跃时必填
    #[serde(default)]
    pub og: Option<PcTableConfig>,
}

/// 数值与执行参数（全部可省略，取引擎缺省值）
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NumericsConfig {
    /// 压力积分参数
    #[serde(default)]
    pub integration: Option<IntegrationParams>,
    /// 毛管压力反演参数
    #[serde(default)]
    pub inversion: Option<InversionParams>,
    /// 区域执行策略
    #[serde(default)]
    pub strategy: RegionStrategy,
}

/// 完整场景配置
///
/// # 示例
///
/// ```json
/// {
///   "grid": { "top": 2000.0, "bottom": 2100.0, "n_cells": 20 },
///   "records": [
///     { "datum_depth": 2000.0, "datum_pressure_bar": 300.0,
///       "woc": { "depth": 2080.0 } }
///   ],
///   "fluids": {
///     "phases": { "water": true, "oil": true },
///     "surface_density": { "water": 1000.0, "oil": 800.0 }
///   },
///   "capillary": {
///     "ow": { "sat": [0.2, 1.0], "pc_bar": [1.0, -1.0] }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// 重力加速度 [m/s²]，缺省为标准重力
    #[serde(default)]
    pub gravity: Option<f64>,
    /// 网格定义
    pub grid: GridConfig,
    /// 每单元区域编号，缺省时全部单元归入区域 0
    #[serde(default)]
    pub regions: Option<Vec<usize>>,
    /// 平衡记录（每区域一条）
    pub records: Vec<RecordConfig>,
    /// 流体定义
    pub fluids: FluidConfig,
    /// 毛管压力定义
    #[serde(default)]
    pub capillary: CapillaryConfig,
    /// 数值与执行参数
    #[serde(default)]
    pub numerics: NumericsConfig,
}

// ============================================================
// 构建
// ============================================================

/// 构建完成的场景：初始化所需的全部输入
pub struct Scenario {
    /// 网格
    pub grid: DepthColumn,
    /// 流体物性
    pub props: TableProperties,
    /// 平衡记录（压力已换算为 Pa）
    pub records: Vec<EquilRecord>,
    /// 区域划分
    pub mapping: RegionMapping,
    /// 初始化配置
    pub options: EquilOptions,
}

fn build_pc_table(cfg: &PcTableConfig) -> EquilResult<PcTable> {
    let pc = cfg.pc_bar.iter().map(|&v| units::from_bar(v)).collect();
    PcTable::new(cfg.sat.clone(), pc)
}

fn build_fvf_table(cfg: &FvfTableConfig) -> EquilResult<FvfTable> {
    let pressure = cfg
        .pressure_bar
        .iter()
        .map(|&v| units::from_bar(v))
        .collect();
    FvfTable::new(pressure, cfg.fvf.clone())
}

impl RecordConfig {
    fn build(&self) -> EquilRecord {
        let contact = |c: &ContactConfig| Contact {
            depth: c.depth,
            pc: units::from_bar(c.pc_bar),
        };
        EquilRecord::new(
            DatumPoint {
                depth: self.datum_depth,
                pressure: units::from_bar(self.datum_pressure_bar),
            },
            self.woc.as_ref().map(contact),
            self.goc.as_ref().map(contact),
        )
    }
}

impl ScenarioConfig {
    /// 构建场景
    ///
    /// 换算单位、组装物性表与区域划分。尺寸不一致或表不合法时
    /// 返回错误；物理合法性留给驱动器校验。
    pub fn build(&self) -> EquilResult<Scenario> {
        let grid = match &self.grid {
            GridConfig::Interval {
                top,
                bottom,
                n_cells,
            } => DepthColumn::from_interval(*top, *bottom, *n_cells)?,
            GridConfig::Depths { depths } => DepthColumn::new(depths.clone())?,
        };
        let n_cells = grid.depths().len();

        let mapping = match &self.regions {
            Some(ids) => {
                ensure!(
                    ids.len() == n_cells,
                    EquilError::SizeMismatch {
                        name: "regions 数组",
                        expected: n_cells,
                        actual: ids.len(),
                    }
                );
                RegionMapping::new(ids.clone())
            }
            None => RegionMapping::uniform(n_cells),
        };

        ensure!(
            !self.records.is_empty(),
            EquilError::invalid_input("至少需要一条平衡记录")
        );
        let records: Vec<EquilRecord> = self.records.iter().map(RecordConfig::build).collect();

        let usage = PhaseUsage::new(
            self.fluids.phases.water,
            self.fluids.phases.oil,
            self.fluids.phases.gas,
        );
        let rho = self.fluids.surface_density;
        let pc_ow = self.capillary.ow.as_ref().map(build_pc_table).transpose()?;
        let pc_og = self.capillary.og.as_ref().map(build_pc_table).transpose()?;
        let mut props = TableProperties::new(
            usage,
            n_cells,
            [rho.water, rho.oil, rho.gas],
            pc_ow,
            pc_og,
        )?;
        for (phase, cfg) in [
            (Phase::Water, &self.fluids.fvf.water),
            (Phase::Oil, &self.fluids.fvf.oil),
            (Phase::Gas, &self.fluids.fvf.gas),
        ] {
            if let Some(cfg) = cfg {
                props = props.with_fvf(phase, build_fvf_table(cfg)?);
            }
        }

        let options = EquilOptions {
            gravity: self.gravity.unwrap_or(units::GRAVITY),
            density_model: self.fluids.model,
            integration: self.numerics.integration.unwrap_or_default(),
            inversion: self.numerics.inversion.unwrap_or_default(),
            strategy: self.numerics.strategy,
            dissolved_gas: self.fluids.dissolved_gas,
            vaporized_oil: self.fluids.vaporized_oil,
            ..EquilOptions::default()
        };

        Ok(Scenario {
            grid,
            props,
            records,
            mapping,
            options,
        })
    }
}

// ============================================================
// 测试
// ============================================================
