// crates/pq_equil/src/error.rs

//! 平衡初始化错误类型
//!
//! 配置错误（基准深度不在油区、相组合不受支持、记录缺失）在任何
//! 数值工作开始前同步检出，并中止整个初始化过程。数值边界情况
//! （反演目标超出函数值域）通过钳位处理，不产生错误。

use thiserror::Error;

/// 平衡初始化结果类型
pub type EquilResult<T> = Result<T, EquilError>;

/// 平衡初始化错误
#[derive(Error, Debug)]
pub enum EquilError {
    /// 基准深度不在油区内（致命配置错误，积分前检出）
    #[error(
        "无法初始化: 区域 {region} 的基准深度必须位于油区内 \
         (zgoc={zgoc}, zdatum={zdatum}, zwoc={zwoc})"
    )]
    DatumOutsideOilZone {
        /// 区域编号
        region: usize,
        /// 气油接触面深度 [m]
        zgoc: f64,
        /// 基准深度 [m]
        zdatum: f64,
        /// 油水接触面深度 [m]
        zwoc: f64,
    },

    /// 不支持的活跃相组合（本方案以油相为参考相）
    #[error("无法初始化: 不支持的活跃相组合 ({description})")]
    UnsupportedPhases {
        /// 组合描述
        description: String,
    },

    /// 区域缺少平衡记录
    #[error("无法初始化: 区域 {region} 缺少平衡记录 (可用记录数 {available})")]
    MissingRecord {
        /// 区域编号
        region: usize,
        /// 可用记录数
        available: usize,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 无效输入数据
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },
}

impl EquilError {
    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 不支持的相组合
    pub fn unsupported_phases(description: impl Into<String>) -> Self {
        Self::UnsupportedPhases {
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datum_error_display() {
        let err = EquilError::DatumOutsideOilZone {
            region: 2,
            zgoc: 2050.0,
            zdatum: 2000.0,
            zwoc: 2100.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("区域 2"));
        assert!(msg.contains("油区"));
    }

    #[test]
    fn test_unsupported_phases_display() {
        let err = EquilError::unsupported_phases("水+气, 无油相");
        assert!(err.to_string().contains("不支持"));
    }
}
