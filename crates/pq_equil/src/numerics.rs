// crates/pq_equil/src/numerics.rs

//! 单调函数反演
//!
//! 毛管压力函数在饱和度界限上单调，反演通过区间二分完成。
//! 目标值超出函数值域时钳位到界限端点，这是被处理的数值边界
//! 情况，不是错误。

use crate::types::InversionParams;
use num_traits::Float;

/// 在 `[lo, hi]` 上反演单调函数：求 s 使 `f(s) ≈ target`
///
/// # 参数
/// - `f`: 在区间上单调的函数
/// - `increasing`: 单调方向（`pc_og` 递增，`pc_ow` 递减）
/// - `params`: 收敛容差与最大迭代次数
///
/// # 返回
/// 目标值在函数值域内时返回二分收敛的根；否则返回更接近目标的
/// 界限端点（钳位）。总是成功。
pub fn invert_monotone<S, F>(
    f: F,
    target: S,
    lo: S,
    hi: S,
    increasing: bool,
    params: &InversionParams,
) -> S
where
    S: Float,
    F: Fn(S) -> S,
{
    debug_assert!(lo <= hi);

    let f_lo = f(lo);
    let f_hi = f(hi);

    // 值域外钳位
    if increasing {
        if target <= f_lo {
            return lo;
        }
        if target >= f_hi {
            return hi;
        }
    } else {
        if target >= f_lo {
            return lo;
        }
        if target <= f_hi {
            return hi;
        }
    }

    let two = S::one() + S::one();
    let tol = S::from(params.tolerance).unwrap_or_else(S::epsilon);

    let mut a = lo;
    let mut b = hi;
    for _ in 0..params.max_iterations {
        let mid = (a + b) / two;
        if b - a < tol {
            return mid;
        }
        let fm = f(mid);
        let go_right = if increasing { fm < target } else { fm > target };
        if go_right {
            a = mid;
        } else {
            b = mid;
        }
    }
    (a + b) / two
}
