// ==========================================
// 运单系统 - 命令行入口
// ==========================================
// 子命令:
// - process:  订单文件 → 运单 CSV
// - carriers: 市场覆写表查看 / 编辑
// - history:  发号历史查看 / 导出
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use waybill_desk::config::{AppConfig, CollisionPolicy};
use waybill_desk::engine::{
    output_rows, sort_markets_for_display, CarrierDirectory, OrderPipeline, TrackingNumberIssuer,
};
use waybill_desk::export::{default_output_file_name, write_output_file};
use waybill_desk::repository::{JsonCarrierTableRepository, JsonIssuedHistoryRepository};
use waybill_desk::{logging, Carrier};

/// 订单导出文件 → 配送公司分配 + 运单号生成
#[derive(Parser)]
#[command(name = "waybill-desk")]
#[command(about = "waybill-desk - 订单导出文件的配送公司分配与运单号生成", long_about = None)]
#[command(version)]
struct Cli {
    /// 数据目录（覆写表与发号历史），默认使用系统数据目录
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 处理订单文件并生成运单 CSV
    #[command(name = "process")]
    Process {
        /// 输入文件（.xlsx/.xls/.xlsm/.ods/.csv/.tsv/.txt）
        input: PathBuf,

        /// 输出文件（默认与输入文件同目录，按时间命名）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 最少列数（2 = 旧版两列格式，3 = 标准格式）
        #[arg(long)]
        min_columns: Option<usize>,

        /// 随机抽取耗尽后的策略: drop | fail | widen
        #[arg(long)]
        policy: Option<CollisionPolicy>,
    },

    /// 市场覆写表
    #[command(name = "carriers", subcommand)]
    Carriers(CarrierCommands),

    /// 发号历史
    #[command(name = "history", subcommand)]
    History(HistoryCommands),
}

#[derive(Subcommand)]
enum CarrierCommands {
    /// 列出已配置的市场
    #[command(name = "list", alias = "ls")]
    List,
    /// 设置市场的配送公司
    Set {
        market: String,
        /// direct-delivery | tracked-carrier-A..D
        carrier: Carrier,
    },
    /// 删除市场覆写项（恢复默认配送公司）
    #[command(name = "remove", alias = "rm")]
    Remove { market: String },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// 已发出的运单号数量
    Count,
    /// 导出发号历史副本
    Export { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }
    tracing::debug!(version = waybill_desk::VERSION, "{} 启动", waybill_desk::APP_NAME);

    let mut config = AppConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    tracing::debug!(data_dir = %config.data_dir.display(), "配置加载完成");

    match cli.command {
        Commands::Process {
            input,
            output,
            min_columns,
            policy,
        } => {
            if let Some(n) = min_columns {
                config.min_columns = n;
            }
            if let Some(policy) = policy {
                config.collision_policy = policy;
            }
            run_process(&config, &input, output)
        }
        Commands::Carriers(action) => run_carriers(&config, action),
        Commands::History(action) => run_history(&config, action),
    }
}

fn run_process(config: &AppConfig, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let directory = CarrierDirectory::new(JsonCarrierTableRepository::new(config.settings_path()));
    let issuer = TrackingNumberIssuer::new(JsonIssuedHistoryRepository::new(config.history_path()))
        .with_policy(config.collision_policy)
        .with_max_attempts(config.max_attempts);
    let mut pipeline = OrderPipeline::new(directory, issuer);

    let (orders, summary) = pipeline
        .process_file(input, config.min_columns, config.max_file_size)
        .with_context(|| format!("处理失败: {}", input.display()))?;

    let output = output.unwrap_or_else(|| {
        let name = default_output_file_name(chrono::Local::now().naive_local());
        input
            .parent()
            .map(|dir| dir.join(&name))
            .unwrap_or_else(|| PathBuf::from(&name))
    });
    write_output_file(&output, &output_rows(&orders))
        .with_context(|| format!("写入失败: {}", output.display()))?;

    println!("订单数: {}", summary.total_orders);
    println!("需运单号: {}", summary.tracking_required);
    println!("已分配运单号: {}", summary.issued);
    if summary.missing_tracking > 0 {
        println!("未分配运单号: {}", summary.missing_tracking);
    }

    let unconfigured = pipeline.directory().unconfigured_markets(&orders);
    if !unconfigured.is_empty() {
        println!("未配置市场（使用默认配送公司）:");
        for market in sort_markets_for_display(unconfigured) {
            println!("  {}", market);
        }
    }

    println!("输出文件: {}", output.display());
    Ok(())
}

fn run_carriers(config: &AppConfig, action: CarrierCommands) -> Result<()> {
    let mut directory =
        CarrierDirectory::new(JsonCarrierTableRepository::new(config.settings_path()));

    match action {
        CarrierCommands::List => {
            for market in sort_markets_for_display(directory.list_known_markets()) {
                println!("{}\t{}", market, directory.resolve(&market));
            }
        }
        CarrierCommands::Set { market, carrier } => {
            if directory.set_carrier(&market, carrier)? {
                println!("{} → {}", market, carrier);
            } else {
                anyhow::bail!("市场名不能为空");
            }
        }
        CarrierCommands::Remove { market } => {
            if directory.remove_market(&market)? {
                println!("已删除: {}", market);
            } else {
                println!("未配置: {}", market);
            }
        }
    }
    Ok(())
}

fn run_history(config: &AppConfig, action: HistoryCommands) -> Result<()> {
    let issuer = TrackingNumberIssuer::new(JsonIssuedHistoryRepository::new(config.history_path()));

    match action {
        HistoryCommands::Count => println!("{}", issuer.history_len()),
        HistoryCommands::Export { path } => {
            issuer
                .export_history(&path)
                .with_context(|| format!("导出失败: {}", path.display()))?;
            println!("已导出 {} 条: {}", issuer.history_len(), path.display());
        }
    }
    Ok(())
}
