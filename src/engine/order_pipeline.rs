// ==========================================
// 运单系统 - 订单处理流水线
// ==========================================
// 流程:
// 1. 原始行 → RowNormalizer → 订单
// 2. 每条订单 → CarrierDirectory.resolve → 配送公司
// 3. 统计需运单号订单 → 一次性向发号器索取
// 4. 按原始顺序稳定分配（第 N 条需运单号订单 ← 第 N 个号码）
// 红线:
// - 不需要运单号的订单，运单号一律清空
// - 号码不足时，末尾未分配的订单运单号留空，不报错
// ==========================================

use crate::domain::order::{Order, OutputRow};
use crate::engine::carrier_directory::CarrierDirectory;
use crate::engine::tracking_issuer::{IssueError, TrackingNumberSource};
use crate::importer::error::ImportError;
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use crate::importer::file_validator::validate_input_file;
use crate::importer::row_normalizer::{RawRow, RowNormalizer};
use crate::repository::carrier_table_repo::CarrierTableRepository;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// PipelineError
// ==========================================
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Issue(#[from] IssueError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

// ==========================================
// PipelineSummary - 单次运行汇总
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub total_orders: usize,
    pub tracking_required: usize,
    pub issued: usize,
    pub missing_tracking: usize, // 需运单号但未分配到号码的订单数
}

// ==========================================
// OrderPipeline
// ==========================================
pub struct OrderPipeline<R, S>
where
    R: CarrierTableRepository,
    S: TrackingNumberSource,
{
    normalizer: RowNormalizer,
    directory: CarrierDirectory<R>,
    issuer: S,
}

impl<R, S> OrderPipeline<R, S>
where
    R: CarrierTableRepository,
    S: TrackingNumberSource,
{
    pub fn new(directory: CarrierDirectory<R>, issuer: S) -> Self {
        Self {
            normalizer: RowNormalizer::new(),
            directory,
            issuer,
        }
    }

    pub fn directory(&self) -> &CarrierDirectory<R> {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut CarrierDirectory<R> {
        &mut self.directory
    }

    pub fn issuer(&self) -> &S {
        &self.issuer
    }

    /// 标准化 + 配送公司解析（不发号）
    ///
    /// 每次调用都重新加载覆写表，以便看到其他窗口的修改
    pub fn load_orders(&mut self, raw_rows: &[RawRow], min_columns: usize) -> PipelineResult<Vec<Order>> {
        let mut orders = self.normalizer.normalize(raw_rows, min_columns)?;

        self.directory.load();
        for order in orders.iter_mut() {
            order.carrier = Some(self.directory.resolve(&order.market));
        }

        let unconfigured = self.directory.unconfigured_markets(&orders);
        if !unconfigured.is_empty() {
            info!(
                count = unconfigured.len(),
                markets = ?unconfigured,
                "部分市场未配置，使用默认配送公司"
            );
        }

        Ok(orders)
    }

    /// 统计 + 发号 + 稳定分配
    pub fn assign_tracking_numbers(&mut self, orders: &mut [Order]) -> PipelineResult<PipelineSummary> {
        let tracking_required = orders
            .iter()
            .filter(|o| o.requires_tracking_number())
            .count();

        let numbers = self.issuer.issue(tracking_required)?;
        let mut numbers = numbers.into_iter();

        for order in orders.iter_mut() {
            if order.requires_tracking_number() {
                order.tracking_number = numbers.next().unwrap_or_default();
            } else {
                order.tracking_number.clear();
            }
        }

        let missing_tracking = orders
            .iter()
            .filter(|o| o.requires_tracking_number() && o.tracking_number.is_empty())
            .count();

        if missing_tracking > 0 {
            warn!(
                tracking_required = tracking_required,
                missing = missing_tracking,
                "运单号不足，部分订单未分配运单号"
            );
        }

        Ok(PipelineSummary {
            total_orders: orders.len(),
            tracking_required,
            issued: tracking_required - missing_tracking,
            missing_tracking,
        })
    }

    /// 完整流水线：原始行 → 已分配配送公司与运单号的订单
    #[instrument(skip(self, raw_rows), fields(run_id))]
    pub fn process(&mut self, raw_rows: &[RawRow], min_columns: usize) -> PipelineResult<Vec<Order>> {
        let (orders, _) = self.run(raw_rows, min_columns)?;
        Ok(orders)
    }

    /// 从文件运行完整流水线
    #[instrument(skip(self, path), fields(run_id, path = %path.display()))]
    pub fn process_file(
        &mut self,
        path: &Path,
        min_columns: usize,
        max_file_size: u64,
    ) -> PipelineResult<(Vec<Order>, PipelineSummary)> {
        validate_input_file(path, max_file_size)?;
        let raw_rows = UniversalFileParser.parse_to_raw_rows(path)?;
        info!(total_rows = raw_rows.len(), "文件解析完成");

        self.run(&raw_rows, min_columns)
    }

    fn run(&mut self, raw_rows: &[RawRow], min_columns: usize) -> PipelineResult<(Vec<Order>, PipelineSummary)> {
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());
        info!(run_id = %run_id, total_rows = raw_rows.len(), min_columns = min_columns, "开始处理订单");

        let mut orders = self.load_orders(raw_rows, min_columns)?;
        let summary = self.assign_tracking_numbers(&mut orders)?;

        info!(
            run_id = %run_id,
            total_orders = summary.total_orders,
            requested = summary.tracking_required,
            issued = summary.issued,
            "订单处理完成"
        );
        Ok((orders, summary))
    }
}

/// 订单 → 输出行（保持原始顺序）
pub fn output_rows(orders: &[Order]) -> Vec<OutputRow> {
    orders.iter().map(Order::to_output_row).collect()
}
