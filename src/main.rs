// ==========================================
// 用药门诊排期系统 - CLI 主入口
// ==========================================
// 技术栈: Rust + CLI
// 系统定位: 决策支持系统
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use med_clinic_aps::{
    AppointmentImporter, ScheduleOrchestrator, SchedulerConfig, SlotSuggester,
};
use serde::Serialize;
use std::path::PathBuf;

// ==========================================
// CLI 参数
// ==========================================
struct CliArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    suggest: Option<SuggestArgs>,
}

struct SuggestArgs {
    proposed_date: NaiveDate,
    duration_min: u32,
    created_at: Option<NaiveDate>,
}

const USAGE: &str = "用法: med-clinic-aps <输入文件.csv|.xlsx> \
[--config <配置.json>] [--out <输出.json>] \
[--suggest <YYYY-MM-DD> <分钟数> [<创建日期 YYYY-MM-DD>]]";

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let input = args.next().map(PathBuf::from).context(USAGE)?;

    let mut config = None;
    let mut out = None;
    let mut suggest = None;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--config" => {
                config = Some(PathBuf::from(
                    args.next().context("--config 需要一个文件路径")?,
                ));
            }
            "--out" => {
                out = Some(PathBuf::from(
                    args.next().context("--out 需要一个文件路径")?,
                ));
            }
            "--suggest" => {
                let date_str = args.next().context("--suggest 需要日期参数")?;
                let proposed_date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                    .with_context(|| format!("日期格式错误 (期望 YYYY-MM-DD): {}", date_str))?;

                let minutes_str = args.next().context("--suggest 需要分钟数参数")?;
                let duration_min: u32 = minutes_str
                    .parse()
                    .with_context(|| format!("分钟数格式错误: {}", minutes_str))?;

                // 可选的创建日期 (缺省取当天)
                let created_at = match args.next() {
                    None => None,
                    Some(s) if s.starts_with("--") => {
                        bail!("--suggest 的创建日期参数不能是选项: {}", s)
                    }
                    Some(s) => Some(
                        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                            .with_context(|| format!("创建日期格式错误: {}", s))?,
                    ),
                };

                suggest = Some(SuggestArgs {
                    proposed_date,
                    duration_min,
                    created_at,
                });
            }
            other => bail!("未知参数: {}\n{}", other, USAGE),
        }
    }

    Ok(CliArgs {
        input,
        config,
        out,
        suggest,
    })
}

// ==========================================
// 输出契约 (序列化到 stdout 或 --out 文件)
// ==========================================
#[derive(Serialize)]
struct CliOutput {
    report: med_clinic_aps::ImportReport,
    result: med_clinic_aps::ScheduleRunResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestions: Option<Vec<med_clinic_aps::SlotSuggestion>>,
}

fn main() -> Result<()> {
    // 初始化日志系统
    med_clinic_aps::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 决策支持系统", med_clinic_aps::APP_NAME);
    tracing::info!("系统版本: {}", med_clinic_aps::VERSION);
    tracing::info!("==================================================");

    let args = parse_args(std::env::args().skip(1))?;

    // 加载配置 (缺省使用内置默认值)
    let config = match &args.config {
        Some(path) => SchedulerConfig::load(path)
            .with_context(|| format!("配置加载失败: {}", path.display()))?,
        None => SchedulerConfig::default(),
    };
    config.validate().context("配置校验失败")?;

    // 导入历史预约
    let (appointments, report) = AppointmentImporter
        .import_file(&args.input)
        .with_context(|| format!("导入失败: {}", args.input.display()))?;

    // 执行排期流程
    let orchestrator = ScheduleOrchestrator::new(&config);
    let result = orchestrator.run(appointments);

    // 槽位推荐 (可选)
    let suggestions = args.suggest.as_ref().map(|s| {
        let suggester = SlotSuggester::new(&config);
        suggester.suggest(
            &result.ledger,
            s.proposed_date,
            s.duration_min,
            s.created_at,
        )
    });

    let output = CliOutput {
        report,
        result,
        suggestions,
    };
    let json = serde_json::to_string_pretty(&output).context("结果序列化失败")?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("结果写入失败: {}", path.display()))?;
            tracing::info!(file = %path.display(), "排期结果已写出");
        }
        None => println!("{}", json),
    }

    Ok(())
}
