// apps/pq_cli/src/commands/validate.rs

//! 场景验证命令
//!
//! 在不执行任何数值计算的前提下验证场景文件：JSON 形式、场景
//! 构建（单位换算、表合法性、尺寸一致）、以及驱动器的致命配置
//! 检查（基准深度位于油区、相组合受支持、记录齐全）。

use anyhow::{bail, Context, Result};
use clap::Args;
use pq_equil::grid::EquilGrid;
use pq_equil::{validate_configuration, ScenarioConfig};
use std::path::PathBuf;
use tracing::{error, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 场景文件路径 (JSON)
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn is_ok_strict(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("=== PetroEquil 场景验证 ===");
    println!("检查场景文件: {}", args.scenario.display());

    let mut result = ValidationResult::default();

    if !args.scenario.exists() {
        result.add_error(format!("场景文件不存在: {}", args.scenario.display()));
        return print_validation_result(&result, args.strict);
    }

    let content = std::fs::read_to_string(&args.scenario).context("无法读取场景文件")?;

    // JSON 形式
    let config: ScenarioConfig = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            result.add_error(format!("JSON 解析错误: {e}"));
            return print_validation_result(&result, args.strict);
        }
    };
    println!("  ✓ JSON 格式有效");

    check_config_ranges(&config, &mut result);

    // 场景构建（表合法性、尺寸一致）
    let scenario = match config.build() {
        Ok(s) => s,
        Err(e) => {
            result.add_error(format!("场景构建失败: {e}"));
            return print_validation_result(&result, args.strict);
        }
    };
    println!("  ✓ 场景构建成功 ({} 单元)", scenario.grid.n_cells());

    // 致命配置检查（与初始化时相同的校验）
    match validate_configuration(&scenario.props, &scenario.records, &scenario.mapping) {
        Ok(()) => println!("  ✓ 平衡配置有效"),
        Err(e) => result.add_error(format!("平衡配置无效: {e}")),
    }

    print_validation_result(&result, args.strict)
}

fn check_config_ranges(config: &ScenarioConfig, result: &mut ValidationResult) {
    // 重力加速度
    if let Some(g) = config.gravity {
        if g <= 0.0 {
            result.add_error("重力加速度必须为正数");
        } else if (g - 9.81).abs() > 1.0 {
            result.add_warning(format!("重力加速度 {g} 偏离地球标准值较大"));
        }
    }

    // 基准压力
    for (i, rec) in config.records.iter().enumerate() {
        if rec.datum_pressure_bar <= 0.0 {
            result.add_error(format!("记录 {i}: 基准压力必须为正数"));
        } else if rec.datum_pressure_bar > 2000.0 {
            result.add_warning(format!(
                "记录 {i}: 基准压力 {} bar 异常大",
                rec.datum_pressure_bar
            ));
        }
        // GOC 深于 WOC 时不存在合法的基准深度
        if let (Some(woc), Some(goc)) = (&rec.woc, &rec.goc) {
            if goc.depth > woc.depth {
                result.add_error(format!(
                    "记录 {i}: GOC ({} m) 深于 WOC ({} m)",
                    goc.depth, woc.depth
                ));
            }
        }
    }
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    if !result.errors.is_empty() {
        println!("\n错误 ({}):", result.errors.len());
        for err in &result.errors {
            error!("  ✗ {}", err);
            println!("  ✗ {err}");
        }
    }

    if !result.warnings.is_empty() {
        println!("\n警告 ({}):", result.warnings.len());
        for warning in &result.warnings {
            warn!("  ⚠ {}", warning);
            println!("  ⚠ {warning}");
        }
    }

    let success = if strict {
        result.is_ok_strict()
    } else {
        result.is_ok()
    };

    if success {
        println!("\n✓ 验证通过");
        Ok(())
    } else {
        println!("\n✗ 验证失败");
        bail!(
            "验证失败：发现 {} 个错误，{} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}
