// crates/pq_equil/src/lib.rs

//! PetroEquil 平衡初始化引擎
//!
//! 按 ECLIPSE "EQUIL" 约定，从每个地质区域的基准点与流体接触面记录
//! 计算多相（水/油/气）油藏的初始压力场与饱和度场，包括：
//! - 核心类型定义 (types)
//! - 网格与流体物性契约 (grid, props)
//! - 相密度计算 (density)
//! - 平衡区域与区域划分 (region)
//! - 单调函数反演 (numerics)
//! - 静水压力 ODE 垂向积分 (pressure)
//! - 毛管压力反演与过渡带重叠修正 (saturation)
//! - 区域循环驱动 (driver)
//! - 场景配置 (scenario)
//!
//! # 符号约定
//!
//! - 深度向下为正 [m]，压力 [Pa]，密度 [kg/m³]
//! - 油水毛管压力 `Pc_ow = p_o − p_w`，对 Sw 单调递减
//! - 气油毛管压力 `Pc_og = p_g − p_o`，对 Sg 单调递增
//!   （两个符号约定相反，是领域惯例而非错误）
//!
//! # 计算流程
//!
//! 驱动器按区域迭代：取区域单元范围 → 以首单元为代表单元构建密度
//! 计算器与平衡区域 → 垂向积分得到各活跃相的单元压力 → 反演毛管
//! 压力函数得到饱和度 → 按全局单元索引散射到输出数组。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod density;
pub mod driver;
pub mod error;
pub mod grid;
pub mod numerics;
pub mod pressure;
pub mod props;
pub mod region;
pub mod saturation;
pub mod scenario;
pub mod types;

// 重导出常用类型
pub use density::{
    BlackoilDensity, ConstantMixing, DensityCalculator, DensityModel, IncompressibleDensity,
    Miscibility, NoMixing,
};
pub use driver::{initialize, validate_configuration, EquilOptions, InitialState, RegionStrategy};
pub use error::{EquilError, EquilResult};
pub use grid::{DepthColumn, EquilGrid};
pub use pressure::{phase_pressures, AnchorSource, PressureColumn};
pub use props::{FluidProperties, FvfTable, PcTable, SatRange, TableProperties};
pub use region::{EquilRegion, RegionMapping};
pub use saturation::phase_saturations;
pub use scenario::{Scenario, ScenarioConfig};
pub use types::{
    Contact, DatumPoint, EquilRecord, IntegrationParams, InversionParams, Phase, PhaseUsage,
    MAX_PHASES,
};
