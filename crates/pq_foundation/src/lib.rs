// crates/pq_foundation/src/lib.rs

//! PetroEquil Foundation Layer
//!
//! 基础层，提供整个项目的底层抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`units`]: 单位常量与换算（SI 内部表示）
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 thiserror
//! 2. **SI 单位**: 所有内部数值使用 SI 单位，换算只发生在边界
//! 3. **显式错误**: 不使用 panic 传播可恢复错误

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod units;

// 重导出常用类型
pub use error::{PqError, PqResult};

/// 条件检查宏：条件不成立时返回给定错误
///
/// # 示例
///
/// ```
/// use pq_foundation::{ensure, PqError, PqResult};
///
/// fn check(value: i32) -> PqResult<()> {
///     ensure!(value > 0, PqError::invalid_input("value 必须为正"));
///     Ok(())
/// }
/// assert!(check(-1).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

/// Option 解包宏：None 时返回给定错误
///
/// # 示例
///
/// ```
/// use pq_foundation::{require, PqError, PqResult};
///
/// fn get(opt: Option<i32>) -> PqResult<i32> {
///     let v = require!(opt, PqError::not_found("value"));
///     Ok(v)
/// }
/// assert!(get(None).is_err());
/// ```
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr) => {
        match $opt {
            Some(v) => v,
            None => return Err($err.into()),
        }
    };
}

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{PqError, PqResult};
    pub use crate::units;
    pub use crate::{ensure, require};
}
