// crates/pq_equil/src/region.rs

//! 平衡区域与区域划分
//!
//! - [`RegionMapping`]: 以每单元区域编号数组把全局单元集划分为
//!   互不相交的平衡区域，并提供区域 → 有序单元范围的反向映射
//! - [`EquilRegion`]: 把一条平衡记录、密度计算器、各相混溶策略
//!   与相使用配置捆绑为纯数据 + 访问器，不持有单元，不含可变状态

use crate::density::{
    BlackoilDensity, DensityCalculator, DensityModel, IncompressibleDensity, Miscibility,
};
use crate::error::{EquilError, EquilResult};
use crate::props::FluidProperties;
use crate::types::{EquilRecord, Phase, PhaseUsage};
use std::sync::Arc;

// ============================================================
// 区域划分
// ============================================================

/// 区域划分：单元 → 区域编号，及派生的区域 → 有序单元集
///
/// 每个单元恰好属于一个区域；区域在空间上可以不连通。区域内
/// 单元按全局索引升序排列（稳定、确定性顺序，之后用于把区域
/// 结果向量按位置写回全局数组）。空区域合法，由调用方跳过。
#[derive(Debug, Clone)]
pub struct RegionMapping {
    region_of: Vec<usize>,
    cells_by_region: Vec<Vec<usize>>,
}

impl RegionMapping {
    /// 从每单元区域编号数组创建
    ///
    /// 区域数量为最大编号 + 1；未被任何单元引用的中间编号对应
    /// 空区域。
    pub fn new(region_of: Vec<usize>) -> Self {
        let num_regions = region_of.iter().max().map(|&r| r + 1).unwrap_or(0);
        let mut cells_by_region = vec![Vec::new(); num_regions];
        for (cell, &r) in region_of.iter().enumerate() {
            cells_by_region[r].push(cell);
        }
        Self {
            region_of,
            cells_by_region,
        }
    }

    /// 全部单元归入区域 0（无显式区域数组时的缺省划分）
    pub fn uniform(n_cells: usize) -> Self {
        Self::new(vec![0; n_cells])
    }

    /// 区域数量
    #[inline]
    pub fn num_regions(&self) -> usize {
        self.cells_by_region.len()
    }

    /// 单元总数
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.region_of.len()
    }

    /// 区域内的单元（全局索引升序）
    #[inline]
    pub fn cells(&self, region: usize) -> &[usize] {
        &self.cells_by_region[region]
    }

    /// 单元所属区域
    #[inline]
    pub fn region_of(&self, cell: usize) -> usize {
        self.region_of[cell]
    }
}

// ============================================================
// 配置校验
// ============================================================

/// 校验区域配置：相组合受支持且基准深度位于油区内
///
/// 本方案以油相为参考相，无油相的系统（如水+气）被拒绝。
/// 这是积分前一次性检出的致命配置错误。
pub fn check_region_config(
    region_id: usize,
    record: &EquilRecord,
    usage: &PhaseUsage,
) -> EquilResult<()> {
    if !usage.is_used(Phase::Oil) {
        let active: Vec<&str> = usage.active_phases().map(|p| p.name()).collect();
        return Err(EquilError::unsupported_phases(format!(
            "油相为参考相, 必须活跃; 当前活跃相: [{}]",
            active.join(", ")
        )));
    }
    let zgoc = record.zgoc();
    let zdatum = record.datum_depth();
    let zwoc = record.zwoc();
    if zgoc > zdatum || zdatum > zwoc {
        return Err(EquilError::DatumOutsideOilZone {
            region: region_id,
            zgoc,
            zdatum,
            zwoc,
        });
    }
    Ok(())
}

// ============================================================
// 平衡区域
// ============================================================

/// 平衡区域
///
/// 每次初始化按区域从共享输入重新构建，用毕即弃。
pub struct EquilRegion<'a> {
    region_id: usize,
    record: &'a EquilRecord,
    density: Box<dyn DensityCalculator + 'a>,
    rs: Arc<dyn Miscibility>,
    rv: Arc<dyn Miscibility>,
    usage: PhaseUsage,
}

impl<'a> EquilRegion<'a> {
    /// 构建平衡区域
    ///
    /// 密度计算器按 `model` 在代表单元 `seed_cell`（区域首单元）
    /// 处采样物性构建。`rs`/`rv` 分别是油相与气相的混溶策略。
    pub fn new(
        region_id: usize,
        record: &'a EquilRecord,
        model: DensityModel,
        props: &'a dyn FluidProperties,
        seed_cell: usize,
        rs: Arc<dyn Miscibility>,
        rv: Arc<dyn Miscibility>,
    ) -> Self {
        let density: Box<dyn DensityCalculator + 'a> = match model {
            DensityModel::Incompressible => {
                Box::new(IncompressibleDensity::from_props(props, seed_cell))
            }
            DensityModel::Blackoil => Box::new(BlackoilDensity::new(
                props,
                seed_cell,
                Arc::clone(&rs),
                Arc::clone(&rv),
            )),
        };
        Self {
            region_id,
            record,
            density,
            rs,
            rv,
            usage: props.phase_usage(),
        }
    }

    /// 校验区域配置（致命配置错误在此一次性检出）
    pub fn validate(&self) -> EquilResult<()> {
        check_region_config(self.region_id, self.record, &self.usage)
    }

    /// 区域编号
    #[inline]
    pub fn region_id(&self) -> usize {
        self.region_id
    }

    /// 平衡记录
    #[inline]
    pub fn record(&self) -> &EquilRecord {
        self.record
    }

    /// 基准深度 [m]
    #[inline]
    pub fn datum(&self) -> f64 {
        self.record.datum_depth()
    }

    /// 油水接触面深度 [m]
    #[inline]
    pub fn zwoc(&self) -> f64 {
        self.record.zwoc()
    }

    /// 气油接触面深度 [m]
    #[inline]
    pub fn zgoc(&self) -> f64 {
        self.record.zgoc()
    }

    /// 密度计算器
    #[inline]
    pub fn density_calculator(&self) -> &dyn DensityCalculator {
        self.density.as_ref()
    }

    /// 油相的溶解气策略
    #[inline]
    pub fn dissolved_gas(&self) -> &Arc<dyn Miscibility> {
        &self.rs
    }

    /// 气相的挥发油策略
    #[inline]
    pub fn vaporized_oil(&self) -> &Arc<dyn Miscibility> {
        &self.rv
    }

    /// 相使用配置
    #[inline]
    pub fn phase_usage(&self) -> &PhaseUsage {
        &self.usage
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::NoMixing;
    use crate::props::{PcTable, TableProperties};
    use crate::types::{Contact, DatumPoint};

    #[test]
    fn test_mapping_partition() {
        let mapping = RegionMapping::new(vec![0, 1, 0, 2, 1, 0]);
        assert_eq!(mapping.num_regions(), 3);
        assert_eq!(mapping.num_cells(), 6);
        assert_eq!(mapping.cells(0), &[0, 2, 5]);
        assert_eq!(mapping.cells(1), &[1, 4]);
        assert_eq!(mapping.cells(2), &[3]);
        assert_eq!(mapping.region_of(4), 1);
    }

    #[test]
    fn test_mapping_empty_region_is_legal() {
        // 编号 1 未被引用 → 空区域
        let mapping = RegionMapping::new(vec![0, 0, 2]);
        assert_eq!(mapping.num_regions(), 3);
        assert!(mapping.cells(1).is_empty());
    }

    #[test]
    fn test_mapping_uniform() {
        let mapping = RegionMapping::uniform(4);
        assert_eq!(mapping.num_regions(), 1);
        assert_eq!(mapping.cells(0), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_mapping_no_cells() {
        let mapping = RegionMapping::new(Vec::new());
        assert_eq!(mapping.num_regions(), 0);
    }

    fn record(zdatum: f64, zwoc: f64, zgoc: f64) -> EquilRecord {
        EquilRecord::new(
            DatumPoint {
                depth: zdatum,
                pressure: 3.0e7,
            },
            Some(Contact {
                depth: zwoc,
                pc: 0.0,
            }),
            Some(Contact {
                depth: zgoc,
                pc: 0.0,
            }),
        )
    }

    #[test]
    fn test_check_config_datum_in_oil_zone() {
        let usage = PhaseUsage::three_phase();
        assert!(check_region_config(0, &record(2000.0, 2100.0, 1950.0), &usage).is_ok());
    }

    #[test]
    fn test_check_config_datum_below_woc() {
        let usage = PhaseUsage::three_phase();
        let err = check_region_config(0, &record(2200.0, 2100.0, 1950.0), &usage).unwrap_err();
        assert!(matches!(err, EquilError::DatumOutsideOilZone { .. }));
    }

    #[test]
    fn test_check_config_datum_above_goc() {
        let usage = PhaseUsage::three_phase();
        let err = check_region_config(0, &record(1900.0, 2100.0, 1950.0), &usage).unwrap_err();
        assert!(matches!(err, EquilError::DatumOutsideOilZone { .. }));
    }

    #[test]
    fn test_check_config_rejects_water_gas() {
        let usage = PhaseUsage::new(true, false, true);
        let err = check_region_config(0, &record(2000.0, 2100.0, 1950.0), &usage).unwrap_err();
        assert!(matches!(err, EquilError::UnsupportedPhases { .. }));
    }

    #[test]
    fn test_region_accessors() {
        let pc_ow = PcTable::new(vec![0.2, 1.0], vec![1.0e5, -1.0e5]).unwrap();
        let props = TableProperties::new(
            PhaseUsage::water_oil(),
            3,
            [1000.0, 800.0, 0.0],
            Some(pc_ow),
            None,
        )
        .unwrap();
        let rec = record(2000.0, 2100.0, f64::NEG_INFINITY);
        let region = EquilRegion::new(
            7,
            &rec,
            DensityModel::Incompressible,
            &props,
            0,
            Arc::new(NoMixing),
            Arc::new(NoMixing),
        );
        assert_eq!(region.region_id(), 7);
        assert_eq!(region.datum(), 2000.0);
        assert_eq!(region.zwoc(), 2100.0);
        assert!(region.validate().is_ok());
        assert_eq!(region.phase_usage().num_phases(), 2);
        assert_eq!(region.dissolved_gas().ratio(2000.0, 3.0e7), 0.0);
    }
}
