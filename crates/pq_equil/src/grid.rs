// crates/pq_equil/src/grid.rs

//! 网格契约
//!
//! 引擎不关心网格内部存储方式，只需要单元总数和按单元索引查询
//! 深度的能力。实际模拟网格通过实现 [`EquilGrid`] 接入。

use crate::error::{EquilError, EquilResult};

/// 平衡初始化对网格的最小契约
///
/// 深度向下为正 [m]。实现必须保证 `cell < n_cells()` 时
/// `cell_depth(cell)` 返回有限值。
pub trait EquilGrid: Sync {
    /// 网格单元总数
    fn n_cells(&self) -> usize;

    /// 单元中心深度 [m]
    fn cell_depth(&self, cell: usize) -> f64;
}

/// 致密深度数组网格
///
/// 最简单的网格实现：每个单元一个中心深度。
#[derive(Debug, Clone)]
pub struct DepthColumn {
    depths: Vec<f64>,
}

impl DepthColumn {
    /// 从深度数组创建
    ///
    /// 所有深度必须为有限值。
    pub fn new(depths: Vec<f64>) -> EquilResult<Self> {
        for (i, &z) in depths.iter().enumerate() {
            if !z.is_finite() {
                return Err(EquilError::invalid_input(format!(
                    "单元 {i} 的深度非有限值: {z}"
                )));
            }
        }
        Ok(Self { depths })
    }

    /// 在 [top, bottom] 深度区间生成 n 个等厚单元（取层中心深度）
    pub fn from_interval(top: f64, bottom: f64, n_cells: usize) -> EquilResult<Self> {
        if n_cells == 0 {
            return Err(EquilError::invalid_input("单元数量必须大于 0"));
        }
        if !(top.is_finite() && bottom.is_finite()) || bottom <= top {
            return Err(EquilError::invalid_input(format!(
                "深度区间无效: top={top}, bottom={bottom}"
            )));
        }
        let dz = (bottom - top) / n_cells as f64;
        let depths = (0..n_cells)
            .map(|i| top + (i as f64 + 0.5) * dz)
            .collect();
        Ok(Self { depths })
    }

    /// 深度数组视图
    pub fn depths(&self) -> &[f64] {
        &self.depths
    }
}

impl EquilGrid for DepthColumn {
    #[inline]
    fn n_cells(&self) -> usize {
        self.depths.len()
    }

    #[inline]
    fn cell_depth(&self, cell: usize) -> f64 {
        self.depths[cell]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_column_new() {
        let grid = DepthColumn::new(vec![2000.0, 2010.0, 2020.0]).unwrap();
        assert_eq!(grid.n_cells(), 3);
        assert_eq!(grid.cell_depth(1), 2010.0);
    }

    #[test]
    fn test_depth_column_rejects_nan() {
        assert!(DepthColumn::new(vec![2000.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_from_interval_centers() {
        let grid = DepthColumn::from_interval(2000.0, 2100.0, 10).unwrap();
        assert_eq!(grid.n_cells(), 10);
        assert!((grid.cell_depth(0) - 2005.0).abs() < 1e-12);
        assert!((grid.cell_depth(9) - 2095.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_interval_invalid() {
        assert!(DepthColumn::from_interval(2100.0, 2000.0, 10).is_err());
        assert!(DepthColumn::from_interval(2000.0, 2100.0, 0).is_err());
    }
}
