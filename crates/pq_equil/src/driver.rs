// crates/pq_equil/src/driver.rs

//! 区域循环驱动
//!
//! 对区域划分中的每个区域：用该区域的记录与以区域首单元为代表
//! 单元的密度计算器构建平衡区域 → 计算相压力 → 反演饱和度 →
//! 把每相结果向量按位置对应关系散射到全局相数组。
//!
//! 区域之间没有数据依赖：每个区域只读自己的记录、密度计算器与
//! 互不相交的单元范围，只写全局输出数组中属于自己单元的互不相交
//! 片段。并行策略仿照"收集后散射"：先并行求解各区域，再串行
//! 散射，输出数组在任何区域任务启动前按全局单元数整体预分配。

use crate::density::{ConstantMixing, DensityModel, Miscibility, NoMixing};
use crate::error::{EquilError, EquilResult};
use crate::grid::EquilGrid;
use crate::pressure::phase_pressures;
use crate::props::FluidProperties;
use crate::region::{check_region_config, EquilRegion, RegionMapping};
use crate::saturation::phase_saturations;
use crate::types::{EquilRecord, IntegrationParams, InversionParams, Phase, PhaseUsage};
use pq_foundation::{ensure, require};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================
// 配置
// ============================================================

/// 区域执行策略
///
/// # 策略说明
///
/// - `Sequential`: 按区域串行执行，适用于区域很少的情形
/// - `CollectThenScatter`: 先并行求解各区域，后串行散射到全局数组
/// - `Auto`: 根据区域数量自动选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionStrategy {
    /// 串行执行
    Sequential,
    /// 收集后散射：并行求解区域 → 收集结果 → 串行散射
    CollectThenScatter,
    /// 自动选择（根据区域数量）
    #[default]
    Auto,
}

/// 平衡初始化配置
#[derive(Debug, Clone)]
pub struct EquilOptions {
    /// 重力加速度 [m/s²]，深度向下为正时取正值
    pub gravity: f64,
    /// 密度规律
    pub density_model: DensityModel,
    /// 压力积分参数
    pub integration: IntegrationParams,
    /// 毛管压力反演参数
    pub inversion: InversionParams,
    /// 区域执行策略
    pub strategy: RegionStrategy,
    /// 最小并行区域数（Auto 策略低于此值时串行）
    pub min_parallel_regions: usize,
    /// 油相常数溶解气油比 Rs（黑油模型），None 表示无混溶
    pub dissolved_gas: Option<f64>,
    /// 气相常数挥发油气比 Rv（黑油模型），None 表示无混溶
    pub vaporized_oil: Option<f64>,
}

impl Default for EquilOptions {
    fn default() -> Self {
        Self {
            gravity: pq_foundation::units::GRAVITY,
            density_model: DensityModel::Incompressible,
            integration: IntegrationParams::default(),
            inversion: InversionParams::default(),
            strategy: RegionStrategy::Auto,
            min_parallel_regions: 4,
            dissolved_gas: None,
            vaporized_oil: None,
        }
    }
}

// ============================================================
// 输出
// ============================================================

/// 初始状态：每个活跃相的全局压力场与饱和度场
///
/// 一次性产物，拷入模拟器的持久状态数组后即可丢弃。
#[derive(Debug, Clone)]
pub struct InitialState {
    usage: PhaseUsage,
    /// 相压力 [Pa]，`pressure[相位置][全局单元]`
    pub pressure: Vec<Vec<f64>>,
    /// 相饱和度，`saturation[相位置][全局单元]`
    pub saturation: Vec<Vec<f64>>,
}

impl InitialState {
    /// 相使用配置
    #[inline]
    pub fn phase_usage(&self) -> &PhaseUsage {
        &self.usage
    }

    /// 单元总数
    pub fn n_cells(&self) -> usize {
        self.pressure.first().map(|v| v.len()).unwrap_or(0)
    }

    /// 指定相的压力场，相不活跃时返回 `None`
    pub fn pressure_of(&self, phase: Phase) -> Option<&[f64]> {
        self.usage.pos(phase).map(|pos| self.pressure[pos].as_slice())
    }

    /// 指定相的饱和度场，相不活跃时返回 `None`
    pub fn saturation_of(&self, phase: Phase) -> Option<&[f64]> {
        self.usage
            .pos(phase)
            .map(|pos| self.saturation[pos].as_slice())
    }
}

// ============================================================
// 配置校验
// ============================================================

/// 校验整体配置：尺寸一致、每个非空区域有记录且记录合法
///
/// 致命配置错误在任何数值工作开始前一次性检出；检出即中止整个
/// 初始化（相压力场是所有下游饱和度计算的前提，部分结果不可用）。
pub fn validate_configuration(
    props: &dyn FluidProperties,
    records: &[EquilRecord],
    mapping: &RegionMapping,
) -> EquilResult<()> {
    ensure!(
        props.n_cells() == mapping.num_cells(),
        EquilError::SizeMismatch {
            name: "物性单元数",
            expected: mapping.num_cells(),
            actual: props.n_cells(),
        }
    );
    let usage = props.phase_usage();
    for region in 0..mapping.num_regions() {
        if mapping.cells(region).is_empty() {
            continue;
        }
        let record = require!(
            records.get(region),
            EquilError::MissingRecord {
                region,
                available: records.len(),
            }
        );
        check_region_config(region, record, &usage)?;
    }
    Ok(())
}

// ============================================================
// 驱动
// ============================================================

/// 单区域求解：构建区域 → 相压力 → 相饱和度
fn solve_region(
    grid: &dyn EquilGrid,
    props: &dyn FluidProperties,
    record: &EquilRecord,
    region_id: usize,
    cells: &[usize],
    opts: &EquilOptions,
) -> EquilResult<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
    // 区域首单元为物性采样的代表单元
    let seed_cell = cells[0];
    let rs: Arc<dyn Miscibility> = match opts.dissolved_gas {
        Some(ratio) => Arc::new(ConstantMixing(ratio)),
        None => Arc::new(NoMixing),
    };
    let rv: Arc<dyn Miscibility> = match opts.vaporized_oil {
        Some(ratio) => Arc::new(ConstantMixing(ratio)),
        None => Arc::new(NoMixing),
    };
    let region = EquilRegion::new(
        region_id,
        record,
        opts.density_model,
        props,
        seed_cell,
        rs,
        rv,
    );

    let pressures = phase_pressures(grid, &region, cells, opts.gravity, &opts.integration)?;
    let saturations = phase_saturations(&region, cells, props, &pressures, &opts.inversion)?;

    debug!(
        region = region_id,
        cells = cells.len(),
        seed_cell,
        "区域求解完成"
    );
    Ok((pressures, saturations))
}

/// 把区域结果向量按位置对应关系写入全局数组
fn scatter(global: &mut [Vec<f64>], local: &[Vec<f64>], cells: &[usize]) {
    for (phase_pos, column) in local.iter().enumerate() {
        for (i, &cell) in cells.iter().enumerate() {
            global[phase_pos][cell] = column[i];
        }
    }
}

/// 平衡初始化：从平衡记录计算全局初始压力场与饱和度场
///
/// 纯函数：输入为网格单元深度、每单元区域编号、平衡记录与物性
/// 回调，输出为每个活跃相的压力数组与饱和度数组。
///
/// # 错误
/// 任何区域的致命配置错误（基准深度不在油区、相组合不受支持、
/// 记录缺失、尺寸不一致）中止整个初始化，不产生部分结果。
pub fn initialize(
    grid: &dyn EquilGrid,
    props: &dyn FluidProperties,
    records: &[EquilRecord],
    mapping: &RegionMapping,
    opts: &EquilOptions,
) -> EquilResult<InitialState> {
    ensure!(
        grid.n_cells() == mapping.num_cells(),
        EquilError::SizeMismatch {
            name: "网格单元数",
            expected: mapping.num_cells(),
            actual: grid.n_cells(),
        }
    );
    validate_configuration(props, records, mapping)?;

    let usage = props.phase_usage();
    let n_cells = mapping.num_cells();

    // 区域并行的前提：输出数组先按全局单元数整体预分配，
    // 各区域任务只写已分配的互不相交索引片段
    let mut pressure = vec![vec![0.0; n_cells]; usage.num_phases()];
    let mut saturation = vec![vec![0.0; n_cells]; usage.num_phases()];

    // 空区域被跳过，无需特殊处理
    let active_regions: Vec<usize> = (0..mapping.num_regions())
        .filter(|&r| !mapping.cells(r).is_empty())
        .collect();

    let parallel = match opts.strategy {
        RegionStrategy::Sequential => false,
        RegionStrategy::CollectThenScatter => true,
        RegionStrategy::Auto => active_regions.len() >= opts.min_parallel_regions,
    };

    info!(
        cells = n_cells,
        regions = active_regions.len(),
        phases = usage.num_phases(),
        parallel,
        "平衡初始化开始"
    );

    if parallel {
        // 先并行求解各区域，再串行散射
        let results: Vec<(usize, EquilResult<(Vec<Vec<f64>>, Vec<Vec<f64>>)>)> = active_regions
            .par_iter()
            .map(|&r| {
                (
                    r,
                    solve_region(grid, props, &records[r], r, mapping.cells(r), opts),
                )
            })
            .collect();
        for (r, result) in results {
            let (press, sats) = result?;
            let cells = mapping.cells(r);
            scatter(&mut pressure, &press, cells);
            scatter(&mut saturation, &sats, cells);
        }
    } else {
        for &r in &active_regions {
            let cells = mapping.cells(r);
            let (press, sats) = solve_region(grid, props, &records[r], r, cells, opts)?;
            scatter(&mut pressure, &press, cells);
            scatter(&mut saturation, &sats, cells);
        }
    }

    info!("平衡初始化完成");
    Ok(InitialState {
        usage,
        pressure,
        saturation,
    })
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DepthColumn;
    use crate::props::{PcTable, TableProperties};
    use crate::types::{Contact, DatumPoint};

    fn water_oil_setup(n_cells: usize) -> (DepthColumn, TableProperties, Vec<EquilRecord>) {
        let grid = DepthColumn::from_interval(2000.0, 2100.0, n_cells).unwrap();
        let pc_ow = PcTable::new(vec![0.2, 1.0], vec![1.0e5, -1.0e5]).unwrap();
        let props = TableProperties::new(
            PhaseUsage::water_oil(),
            n_cells,
            [1000.0, 800.0, 0.0],
            Some(pc_ow),
            None,
        )
        .unwrap();
        let records = vec![EquilRecord::new(
            DatumPoint {
                depth: 2050.0,
                pressure: 3.0e7,
            },
            Some(Contact {
                depth: 2080.0,
                pc: 0.0,
            }),
            None,
        )];
        (grid, props, records)
    }

    #[test]
    fn test_initialize_single_region() {
        let (grid, props, records) = water_oil_setup(10);
        let mapping = RegionMapping::uniform(10);
        let state = initialize(&grid, &props, &records, &mapping, &EquilOptions::default())
            .unwrap();

        assert_eq!(state.n_cells(), 10);
        let p_oil = state.pressure_of(Phase::Oil).unwrap();
        // 油压随深度单调增加
        for w in p_oil.windows(2) {
            assert!(w[1] >= w[0]);
        }
        // 饱和度之和为 1
        let sw = state.saturation_of(Phase::Water).unwrap();
        let so = state.saturation_of(Phase::Oil).unwrap();
        for i in 0..10 {
            assert!((sw[i] + so[i] - 1.0).abs() < 1e-12);
        }
        assert!(state.saturation_of(Phase::Gas).is_none());
    }

    #[test]
    fn test_initialize_rejects_bad_datum() {
        let (grid, props, _) = water_oil_setup(10);
        let mapping = RegionMapping::uniform(10);
        // 基准深度在 WOC 之下 → 致命配置错误
        let records = vec![EquilRecord::new(
            DatumPoint {
                depth: 2090.0,
                pressure: 3.0e7,
            },
            Some(Contact {
                depth: 2080.0,
                pc: 0.0,
            }),
            None,
        )];
        let res = initialize(&grid, &props, &records, &mapping, &EquilOptions::default());
        assert!(matches!(res, Err(EquilError::DatumOutsideOilZone { .. })));
    }

    #[test]
    fn test_initialize_missing_record() {
        let (grid, props, records) = water_oil_setup(10);
        // 两个区域但只有一条记录
        let ids: Vec<usize> = (0..10).map(|i| if i < 5 { 0 } else { 1 }).collect();
        let mapping = RegionMapping::new(ids);
        let res = initialize(&grid, &props, &records, &mapping, &EquilOptions::default());
        assert!(matches!(res, Err(EquilError::MissingRecord { region: 1, .. })));
    }

    #[test]
    fn test_initialize_size_mismatch() {
        let (grid, props, records) = water_oil_setup(10);
        let mapping = RegionMapping::uniform(8);
        let res = initialize(&grid, &props, &records, &mapping, &EquilOptions::default());
        assert!(matches!(res, Err(EquilError::SizeMismatch { .. })));
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        // 两个区域、不同记录；串行与并行结果必须一致
        let n_cells = 20;
        let grid = DepthColumn::from_interval(2000.0, 2100.0, n_cells).unwrap();
        let pc_ow = PcTable::new(vec![0.2, 1.0], vec![1.0e5, -1.0e5]).unwrap();
        let props = TableProperties::new(
            PhaseUsage::water_oil(),
            n_cells,
            [1000.0, 800.0, 0.0],
            Some(pc_ow),
            None,
        )
        .unwrap();
        // 交错划分：区域在空间上不连通也合法
        let ids: Vec<usize> = (0..n_cells).map(|i| i % 2).collect();
        let mapping = RegionMapping::new(ids);
        let records = vec![
            EquilRecord::new(
                DatumPoint {
                    depth: 2040.0,
                    pressure: 3.0e7,
                },
                Some(Contact {
                    depth: 2070.0,
                    pc: 0.0,
                }),
                None,
            ),
            EquilRecord::new(
                DatumPoint {
                    depth: 2050.0,
                    pressure: 3.1e7,
                },
                Some(Contact {
                    depth: 2085.0,
                    pc: 1.0e4,
                }),
                None,
            ),
        ];

        let seq = initialize(
            &grid,
            &props,
            &records,
            &mapping,
            &EquilOptions {
                strategy: RegionStrategy::Sequential,
                ..Default::default()
            },
        )
        .unwrap();
        let par = initialize(
            &grid,
            &props,
            &records,
            &mapping,
            &EquilOptions {
                strategy: RegionStrategy::CollectThenScatter,
                ..Default::default()
            },
        )
        .unwrap();

        for p in 0..2 {
            for c in 0..n_cells {
                assert_eq!(seq.pressure[p][c], par.pressure[p][c]);
                assert_eq!(seq.saturation[p][c], par.saturation[p][c]);
            }
        }
    }

    #[test]
    fn test_empty_region_skipped() {
        let (grid, props, _) = water_oil_setup(10);
        // 区域 0 空，全部单元在区域 1
        let mapping = RegionMapping::new(vec![1; 10]);
        // 基准在 WOC 之下，若被校验将是致命错误
        let bad = EquilRecord::new(
            DatumPoint {
                depth: 2090.0,
                pressure: 3.0e7,
            },
            Some(Contact {
                depth: 2050.0,
                pc: 0.0,
            }),
            None,
        );
        let good = EquilRecord::new(
            DatumPoint {
                depth: 2050.0,
                pressure: 3.0e7,
            },
            Some(Contact {
                depth: 2080.0,
                pc: 0.0,
            }),
            None,
        );
        // 空区域的记录不会被触碰
        let state = initialize(
            &grid,
            &props,
            &[bad, good],
            &mapping,
            &EquilOptions::default(),
        )
        .unwrap();
        assert_eq!(state.n_cells(), 10);
    }
}
