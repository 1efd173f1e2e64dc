// crates/pq_equil/src/saturation.rs

//! 毛管压力反演与过渡带重叠修正
//!
//! 由相压力差反演毛管压力函数，逐单元恢复与压力场一致的饱和度：
//!
//! 1. 水相活跃时，`pcow = p_o − p_w`，在单元饱和度界限上反演
//!    单调递减的 `Pc_ow(Sw)`
//! 2. 气相活跃时，`pcog = p_g − p_o`（符号约定与油水相反），
//!    反演单调递增的 `Pc_og(Sg)`
//! 3. **重叠修正**：独立反演得到的 `Sw + Sg > 1` 说明油水与气油
//!    过渡带在该单元物理上重叠（该深度无油）。丢弃独立结果，
//!    直接反演组合关系 `Pc_gw(Sw) = Pc_og(1−Sw) + Pc_ow(Sw)`
//!    （对 Sw 单调递减）求 `p_g − p_w`，再取 `Sg = 1 − Sw`
//! 4. 油相饱和度恒为余量 `So = 1 − Sw − Sg`，三相之和恒等于 1
//!    由构造保证，而非再做一次反演
//!
//! 反演目标超出函数值域时钳位到单元饱和度界限，属于被处理的
//! 数值边界情况。重叠修正为单次修正，不迭代复核。

use crate::error::{EquilError, EquilResult};
use crate::numerics::invert_monotone;
use crate::props::FluidProperties;
use crate::region::EquilRegion;
use crate::types::{InversionParams, Phase};

/// 计算区域内每个活跃相、每个单元的饱和度
///
/// # 参数
/// - `region`: 当前平衡区域
/// - `cells`: 区域单元范围（与压力计算时一致的顺序）
/// - `props`: 物性接口（饱和度界限与毛管压力函数）
/// - `phase_pressures`: 相压力数组，按致密相位置索引，与 `cells`
///   顺序位置对应
/// - `params`: 反演参数
///
/// # 返回
/// 按致密相位置索引的饱和度向量，每单元三相之和恒为 1。
pub fn phase_saturations(
    region: &EquilRegion<'_>,
    cells: &[usize],
    props: &dyn FluidProperties,
    phase_pressures: &[Vec<f64>],
    params: &InversionParams,
) -> EquilResult<Vec<Vec<f64>>> {
    // 与压力计算相同的前置校验：两种算法运行前都必须通过
    region.validate()?;

    let usage = *region.phase_usage();
    let Some(oil_pos) = usage.pos(Phase::Oil) else {
        return Err(EquilError::unsupported_phases("油相为参考相, 必须活跃"));
    };
    let water_pos = usage.pos(Phase::Water);
    let gas_pos = usage.pos(Phase::Gas);

    if phase_pressures.len() != usage.num_phases() {
        return Err(EquilError::SizeMismatch {
            name: "phase_pressures 相数",
            expected: usage.num_phases(),
            actual: phase_pressures.len(),
        });
    }
    for (pos, column) in phase_pressures.iter().enumerate() {
        if column.len() != cells.len() {
            return Err(EquilError::SizeMismatch {
                name: "phase_pressures 单元数",
                expected: cells.len(),
                actual: phase_pressures[pos].len(),
            });
        }
    }

    let mut saturations = vec![vec![0.0; cells.len()]; usage.num_phases()];

    for (i, &cell) in cells.iter().enumerate() {
        let range = props.sat_range(cell);

        let mut sw = 0.0;
        if let Some(wpos) = water_pos {
            let pcow = phase_pressures[oil_pos][i] - phase_pressures[wpos][i];
            let (lo, hi) = range.bounds(Phase::Water);
            // Pc_ow 对 Sw 单调递减
            sw = invert_monotone(|s| props.pc_ow(cell, s), pcow, lo, hi, false, params);
            saturations[wpos][i] = sw;
        }

        let mut sg = 0.0;
        if let Some(gpos) = gas_pos {
            // 注意 pcog 定义为 (p_g − p_o)，不是 (p_o − p_g)
            let pcog = phase_pressures[gpos][i] - phase_pressures[oil_pos][i];
            let (lo, hi) = range.bounds(Phase::Gas);
            // Pc_og 对 Sg 单调递增
            sg = invert_monotone(|s| props.pc_og(cell, s), pcog, lo, hi, true, params);
            saturations[gpos][i] = sg;
        }

        if let (Some(wpos), Some(gpos)) = (water_pos, gas_pos) {
            if sw + sg > 1.0 {
                // 气油与油水过渡带重叠，独立反演会给出非物理的
                // 负油饱和度；改用气水组合毛管压力重新计算
                let pcgw = phase_pressures[gpos][i] - phase_pressures[wpos][i];
                let (lo, hi) = range.bounds(Phase::Water);
                sw = invert_monotone(
                    |s| props.pc_og(cell, 1.0 - s) + props.pc_ow(cell, s),
                    pcgw,
                    lo,
                    hi,
                    false,
                    params,
                );
                sg = 1.0 - sw;
                saturations[wpos][i] = sw;
                saturations[gpos][i] = sg;
            }
        }

        // 油相恒为余量，三相之和由构造保证为 1
        saturations[oil_pos][i] = 1.0 - sw - sg;
    }

    Ok(saturations)
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::{DensityModel, NoMixing};
    use crate::props::{PcTable, TableProperties};
    use crate::types::{Contact, DatumPoint, EquilRecord, PhaseUsage};
    use std::sync::Arc;

    fn water_oil_props(n_cells: usize) -> TableProperties {
        // Pc_ow: Sw=0.2 处 1e5，Sw=1.0 处 −1e5（线性递减）
        let pc_ow = PcTable::new(vec![0.2, 1.0], vec![1.0e5, -1.0e5]).unwrap();
        TableProperties::new(
            PhaseUsage::water_oil(),
            n_cells,
            [1000.0, 800.0, 0.0],
            Some(pc_ow),
            None,
        )
        .unwrap()
    }

    fn record() -> EquilRecord {
        EquilRecord::new(
            DatumPoint {
                depth: 2000.0,
                pressure: 3.0e7,
            },
            Some(Contact {
                depth: 2100.0,
                pc: 0.0,
            }),
            None,
        )
    }

    fn region<'a>(
        rec: &'a EquilRecord,
        props: &'a TableProperties,
    ) -> EquilRegion<'a> {
        EquilRegion::new(
            0,
            rec,
            DensityModel::Incompressible,
            props,
            0,
            Arc::new(NoMixing),
            Arc::new(NoMixing),
        )
    }

    #[test]
    fn test_saturation_from_inversion() {
        let props = water_oil_props(1);
        let rec = record();
        let reg = region(&rec, &props);

        // pcow = 2e4 → 线性表反演: Sw = 0.2 + 0.8·(1e5−2e4)/2e5 = 0.52
        let pressures = vec![vec![3.0e7 - 2.0e4], vec![3.0e7]];
        let sats =
            phase_saturations(&reg, &[0], &props, &pressures, &InversionParams::default())
                .unwrap();
        let sw = sats[0][0];
        let so = sats[1][0];
        assert!((sw - 0.52).abs() < 1e-6);
        assert!((sw + so - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_saturation_clamped_to_bounds() {
        let props = water_oil_props(2);
        let rec = record();
        let reg = region(&rec, &props);

        // 单元0: pcow 远大于表最大值 → Sw 钳位到 0.2
        // 单元1: pcow 远小于表最小值 → Sw 钳位到 1.0
        let pressures = vec![vec![3.0e7 - 1.0e6, 3.0e7 + 1.0e6], vec![3.0e7, 3.0e7]];
        let sats =
            phase_saturations(&reg, &[0, 1], &props, &pressures, &InversionParams::default())
                .unwrap();
        assert!((sats[0][0] - 0.2).abs() < 1e-12);
        assert!((sats[0][1] - 1.0).abs() < 1e-12);
        // 油相为余量
        assert!((sats[1][1] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_pressure_size_mismatch_rejected() {
        let props = water_oil_props(1);
        let rec = record();
        let reg = region(&rec, &props);
        let pressures = vec![vec![3.0e7]];
        let res = phase_saturations(&reg, &[0], &props, &pressures, &InversionParams::default());
        assert!(matches!(res, Err(EquilError::SizeMismatch { .. })));
    }

    #[test]
    fn test_overlap_correction_three_phase() {
        // 三相系统：构造使独立反演 Sw + Sg > 1 的压力组合
        let pc_ow = PcTable::new(vec![0.1, 0.9], vec![5.0e4, -5.0e4]).unwrap();
        let pc_og = PcTable::new(vec![0.0, 0.9], vec![-2.0e4, 6.0e4]).unwrap();
        let props = TableProperties::new(
            PhaseUsage::three_phase(),
            1,
            [1000.0, 800.0, 100.0],
            Some(pc_ow),
            Some(pc_og),
        )
        .unwrap();
        let rec = EquilRecord::new(
            DatumPoint {
                depth: 2000.0,
                pressure: 3.0e7,
            },
            Some(Contact {
                depth: 2050.0,
                pc: 0.0,
            }),
            Some(Contact {
                depth: 1950.0,
                pc: 0.0,
            }),
        );
        let reg = EquilRegion::new(
            0,
            &rec,
            DensityModel::Incompressible,
            &props,
            0,
            Arc::new(NoMixing),
            Arc::new(NoMixing),
        );

        // pcow = −4e4 → 独立 Sw ≈ 0.82; pcog = 5e4 → 独立 Sg ≈ 0.7875
        // Sw + Sg > 1 → 触发气水组合反演
        let p_o = 3.0e7;
        let p_w = p_o + 4.0e4;
        let p_g = p_o + 5.0e4;
        let pressures = vec![vec![p_w], vec![p_o], vec![p_g]];
        let params = InversionParams::default();
        let sats = phase_saturations(&reg, &[0], &props, &pressures, &params).unwrap();

        let sw = sats[0][0];
        let so = sats[1][0];
        let sg = sats[2][0];
        assert!(sw + sg <= 1.0 + 1e-12, "修正后 Sw+Sg 不得超过 1");
        assert!((sw + so + sg - 1.0).abs() < 1e-12);

        // 结果必须与直接反演 Pc_gw 一致
        let pcgw = p_g - p_w;
        let direct = invert_monotone(
            |s| props.pc_og(0, 1.0 - s) + props.pc_ow(0, s),
            pcgw,
            0.1,
            0.9,
            false,
            &params,
        );
        assert!((sw - direct).abs() < 1e-9);
        assert!((sg - (1.0 - direct)).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_forward_pc() {
        // 反演正确性：把反演得到的 Sw 代回正向 Pc_ow 应复现压力差
        let props = water_oil_props(1);
        let rec = record();
        let reg = region(&rec, &props);

        let pcow = 3.3e4;
        let pressures = vec![vec![3.0e7 - pcow], vec![3.0e7]];
        let params = InversionParams::default();
        let sats = phase_saturations(&reg, &[0], &props, &pressures, &params).unwrap();
        let recovered = props.pc_ow(0, sats[0][0]);
        assert!((recovered - pcow).abs() < 1.0, "正向函数应复现压力差");
    }
}
