// apps/pq_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示版本、符号约定与缺省数值参数。

use anyhow::Result;
use clap::Args;
use pq_equil::{EquilOptions, IntegrationParams, InversionParams};
use pq_foundation::units;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 显示符号约定
    #[arg(long)]
    pub conventions: bool,

    /// 显示缺省数值参数
    #[arg(long)]
    pub defaults: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    println!("=== PetroEquil 信息 ===");
    println!("版本: {}", env!("CARGO_PKG_VERSION"));

    if args.conventions || !args.defaults {
        print_conventions();
    }
    if args.defaults || !args.conventions {
        println!();
        print_defaults();
    }

    Ok(())
}

fn print_conventions() {
    println!("\n=== 符号约定 ===");
    println!("深度: 向下为正 [m]");
    println!("压力: [Pa]（场景文件中以 bar 书写, 1 bar = {} Pa）", units::BARSA);
    println!("油水毛管压力: Pc_ow = p_o − p_w, 对 Sw 单调递减");
    println!("气油毛管压力: Pc_og = p_g − p_o, 对 Sg 单调递增");
    println!("油相为参考相: 基准压力定义在油相上");
}

fn print_defaults() {
    println!("=== 缺省数值参数 ===");

    let opts = EquilOptions::default();
    println!("重力加速度: {} m/s²", opts.gravity);
    println!("密度规律: {:?}", opts.density_model);
    println!("最小并行区域数: {}", opts.min_parallel_regions);

    let integ = IntegrationParams::default();
    println!("\n压力积分:");
    println!("  最大子步长: {} m", integ.max_step);
    println!("  最大校正次数: {}", integ.max_corrections);
    println!("  收敛容差: {} Pa", integ.tolerance);

    let inv = InversionParams::default();
    println!("\n毛管压力反演:");
    println!("  区间容差: {}", inv.tolerance);
    println!("  最大迭代次数: {}", inv.max_iterations);
}
