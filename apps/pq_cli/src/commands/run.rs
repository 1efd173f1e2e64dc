// apps/pq_cli/src/commands/run.rs

//! 运行平衡初始化命令
//!
//! 读取 JSON 场景文件，执行初始化，输出统计信息，可选地把逐
//! 单元结果写为 CSV。

use anyhow::{Context, Result};
use clap::Args;
use pq_equil::grid::EquilGrid;
use pq_equil::{initialize, FluidProperties, InitialState, RegionMapping, Scenario, ScenarioConfig};
use pq_foundation::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 场景文件路径 (JSON)
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// CSV 输出文件路径（省略时只打印统计）
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 读取并解析场景文件
fn load_config(path: &Path) -> PqResult<ScenarioConfig> {
    ensure!(path.exists(), PqError::file_not_found(path));
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| PqError::serialization(e.to_string()))
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== PetroEquil 平衡初始化 ===");

    let config = load_config(&args.scenario)
        .with_context(|| format!("加载场景文件失败: {}", args.scenario.display()))?;
    let scenario = config.build().context("场景构建失败")?;

    info!(
        "场景: {} 单元, {} 区域, {} 相",
        scenario.grid.n_cells(),
        scenario.mapping.num_regions(),
        scenario.props.phase_usage().num_phases()
    );

    let start = Instant::now();
    let state = initialize(
        &scenario.grid,
        &scenario.props,
        &scenario.records,
        &scenario.mapping,
        &scenario.options,
    )
    .context("平衡初始化失败")?;
    let elapsed = start.elapsed();

    print_stats(&state, elapsed.as_secs_f64());

    if let Some(path) = &args.output {
        write_csv(path, &scenario, &state)
            .with_context(|| format!("写出 CSV 失败: {}", path.display()))?;
        info!("结果已写出: {}", path.display());
    }

    Ok(())
}

fn print_stats(state: &InitialState, elapsed: f64) {
    info!("=== 初始化完成 ===");
    info!("计算时间: {:.3} s", elapsed);

    let usage = *state.phase_usage();
    for phase in usage.active_phases() {
        let p = state.pressure_of(phase).unwrap();
        let s = state.saturation_of(phase).unwrap();
        let (p_min, p_max) = min_max(p);
        let (s_min, s_max) = min_max(s);
        info!(
            "{} 相: 压力 [{:.2}, {:.2}] bar, 饱和度 [{:.4}, {:.4}]",
            phase.name(),
            units::to_bar(p_min),
            units::to_bar(p_max),
            s_min,
            s_max
        );
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

fn write_csv(path: &PathBuf, scenario: &Scenario, state: &InitialState) -> Result<()> {
    let usage = *state.phase_usage();
    let mut file = std::fs::File::create(path)?;

    // 表头: cell, depth, region, 每相压力 [bar] 与饱和度
    write!(file, "cell,depth_m,region")?;
    for phase in usage.active_phases() {
        write!(file, ",p_{}_bar,s_{}", phase.name(), phase.name())?;
    }
    writeln!(file)?;

    let grid: &dyn EquilGrid = &scenario.grid;
    let mapping: &RegionMapping = &scenario.mapping;
    for cell in 0..grid.n_cells() {
        write!(
            file,
            "{},{:.3},{}",
            cell,
            grid.cell_depth(cell),
            mapping.region_of(cell)
        )?;
        for phase in usage.active_phases() {
            let p = state.pressure_of(phase).unwrap()[cell];
            let s = state.saturation_of(phase).unwrap()[cell];
            write!(file, ",{:.6},{:.6}", units::to_bar(p), s)?;
        }
        writeln!(file)?;
    }
    Ok(())
}
