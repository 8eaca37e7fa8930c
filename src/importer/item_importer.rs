// ==========================================
// SIV-SITE 装配线 BOM 导入 - 物料项导入器实现
// ==========================================
// 职责: 整合导入流程，从文件/字节到归一化 Item 集合
// 流程: 读取 → 表头定位 → 列解析 → 行归一化 → 去重合并
// 红线: 解析核心为同步单遍处理；文件读取在解析开始前完成
// ==========================================

use crate::config::{config_keys, ImportConfigReader};
use crate::domain::cell::Grid;
use crate::domain::field::Field;
use crate::domain::import::{ParseOutcome, ParseStats, DEFAULT_DIVERGENCE_PREVIEW};
use crate::domain::item::ItemDefaults;
use crate::importer::column_resolver::{ColumnRule, RuleTable};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::duplicate_merger::{
    DuplicateMerger, MergeOutcome, MergePolicyKind, DEFAULT_MERGE_SEPARATOR,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::header_locator::{
    locate_header, DEFAULT_HEADER_SCAN_LIMIT, DEFAULT_HEADER_SENTINEL,
};
use crate::importer::item_importer_trait::ItemImporter;
use crate::importer::row_normalizer::{RowNormalizer, RowOutcome};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ParseOptions - 单次解析参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    pub header_sentinel: String,
    pub header_scan_limit: usize,
    pub rule_table: RuleTable,
    pub item_defaults: ItemDefaults,
    pub clamp_progress: bool,
    pub merge_policy: MergePolicyKind,
    pub merge_separator: String,
    pub divergence_preview_limit: usize,
    pub sheet_name: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            header_sentinel: DEFAULT_HEADER_SENTINEL.to_string(),
            header_scan_limit: DEFAULT_HEADER_SCAN_LIMIT,
            rule_table: RuleTable::default(),
            item_defaults: ItemDefaults::default(),
            clamp_progress: false,
            merge_policy: MergePolicyKind::default(),
            merge_separator: DEFAULT_MERGE_SEPARATOR.to_string(),
            divergence_preview_limit: DEFAULT_DIVERGENCE_PREVIEW,
            sheet_name: None,
        }
    }
}

fn config_read_error(key: &str, err: impl std::fmt::Display) -> ImportError {
    ImportError::ConfigReadError {
        key: key.to_string(),
        message: err.to_string(),
    }
}

impl ParseOptions {
    /// 从配置读取器组装解析参数
    ///
    /// # 规则表
    /// 1. 内置规则表（各版本并集）
    /// 2. rule_overrides 中的规则按字段替换或追加
    /// 3. disabled_fields 中的字段移除
    pub async fn from_reader<C>(reader: &C) -> ImportResult<Self>
    where
        C: ImportConfigReader + ?Sized,
    {
        let header_sentinel = reader
            .get_header_sentinel()
            .await
            .map_err(|e| config_read_error(config_keys::HEADER_SENTINEL, e))?;
        let header_scan_limit = reader
            .get_header_scan_limit()
            .await
            .map_err(|e| config_read_error(config_keys::HEADER_SCAN_LIMIT, e))?;
        let item_defaults = reader
            .get_item_defaults()
            .await
            .map_err(|e| config_read_error(config_keys::ITEM_DEFAULTS, e))?;
        let clamp_progress = reader
            .get_clamp_progress()
            .await
            .map_err(|e| config_read_error(config_keys::CLAMP_PROGRESS, e))?;
        let merge_policy = reader
            .get_merge_policy()
            .await
            .map_err(|e| config_read_error(config_keys::MERGE_POLICY, e))?;
        let merge_separator = reader
            .get_merge_separator()
            .await
            .map_err(|e| config_read_error(config_keys::MERGE_SEPARATOR, e))?;
        let divergence_preview_limit = reader
            .get_divergence_preview_limit()
            .await
            .map_err(|e| config_read_error(config_keys::DIVERGENCE_PREVIEW_LIMIT, e))?;
        let sheet_name = reader
            .get_sheet_name()
            .await
            .map_err(|e| config_read_error(config_keys::SHEET_NAME, e))?;

        // ===== 规则表 =====
        let mut rule_table = RuleTable::default();

        let overrides = reader
            .get_rule_overrides_json()
            .await
            .map_err(|e| config_read_error(config_keys::RULE_OVERRIDES, e))?;
        if let Some(raw) = overrides {
            let rules: Vec<ColumnRule> =
                serde_json::from_str(&raw).map_err(|e| ImportError::ConfigValueError {
                    key: config_keys::RULE_OVERRIDES.to_string(),
                    value: raw.clone(),
                    message: e.to_string(),
                })?;
            for rule in rules {
                rule_table = rule_table.with_rule(rule.field, rule.matcher);
            }
        }

        let disabled = reader
            .get_disabled_fields()
            .await
            .map_err(|e| config_read_error(config_keys::DISABLED_FIELDS, e))?;
        for key in disabled {
            let field = Field::from_key(&key).ok_or_else(|| ImportError::ConfigValueError {
                key: config_keys::DISABLED_FIELDS.to_string(),
                value: key.clone(),
                message: "未知字段".to_string(),
            })?;
            if field == Field::Id {
                warn!("id 字段不可禁用，已忽略");
                continue;
            }
            rule_table = rule_table.without(field);
        }

        Ok(Self {
            header_sentinel,
            header_scan_limit,
            rule_table,
            item_defaults,
            clamp_progress,
            merge_policy,
            merge_separator,
            divergence_preview_limit,
            sheet_name,
        })
    }
}

// ==========================================
// parse_grid - 解析核心
// ==========================================

/// 解析 Grid 为归一化 Item 集合
///
/// # 返回
/// - Ok(ParseOutcome): Item（按首次出现排序）+ 分歧日志 + 统计
/// - Err(HeaderNotFound): 扫描范围内无表头，不返回部分结果
/// - Err(DuplicateConflict): 仅 reject 合并策略
#[instrument(skip_all, fields(rows = grid.len()))]
pub fn parse_grid(grid: &Grid, options: &ParseOptions) -> ImportResult<ParseOutcome> {
    // === 步骤 1: 表头定位 ===
    let header_row = locate_header(grid, &options.header_sentinel, options.header_scan_limit)
        .map_err(|e| {
            warn!(sentinel = %options.header_sentinel, scan_limit = options.header_scan_limit, "未找到表头");
            e
        })?;
    debug!(header_row, "表头定位完成");

    // === 步骤 2: 列解析 ===
    let header = grid.row(header_row).unwrap_or(&[]);
    let field_map = options.rule_table.resolve(header);
    debug!(mapped = field_map.len(), "列解析完成");
    if !field_map.is_mapped(Field::Id) {
        warn!("表头行缺少 id 列，所有数据行将被跳过");
    }

    // === 步骤 3/4: 行归一化 + 去重合并 ===
    let cleaner = DataCleaner;
    let normalizer = RowNormalizer::new(
        &field_map,
        &cleaner,
        &options.item_defaults,
        options.clamp_progress,
    );
    let mut merger = DuplicateMerger::new(options.merge_policy.build(&options.merge_separator));
    let mut stats = ParseStats::default();

    for (index, row) in grid.rows().iter().enumerate().skip(header_row + 1) {
        stats.data_rows += 1;
        let row_number = index + 1;

        match normalizer.normalize(row, row_number) {
            RowOutcome::MissingId => stats.skipped_missing_id += 1,
            RowOutcome::Noise => stats.skipped_noise += 1,
            RowOutcome::Item {
                item,
                out_of_range_progress,
            } => {
                if out_of_range_progress > 0 {
                    warn!(
                        row = row_number,
                        item_id = %item.id,
                        count = out_of_range_progress,
                        clamped = options.clamp_progress,
                        "进度值超出 [0, 1]"
                    );
                    stats.out_of_range_progress += out_of_range_progress;
                }
                merger.push(item)?;
            }
        }
    }

    let MergeOutcome {
        items,
        divergences,
        merged,
    } = merger.finish();
    stats.merged_duplicates = merged;
    stats.emitted = items.len();

    info!(
        header_row,
        data_rows = stats.data_rows,
        emitted = stats.emitted,
        skipped_missing_id = stats.skipped_missing_id,
        skipped_noise = stats.skipped_noise,
        merged = stats.merged_duplicates,
        divergences = divergences.len(),
        "表格解析完成"
    );

    Ok(ParseOutcome {
        header_row,
        field_map,
        items,
        divergences,
        stats,
    })
}

// ==========================================
// ImportOutcome - 单个文件的导入结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub batch_id: String,
    pub file_name: String,
    pub imported_at: DateTime<Utc>,
    pub outcome: ParseOutcome,
    pub preview_limit: usize,
    pub elapsed_ms: u64,
}

impl ImportOutcome {
    /// 分歧批量提示（前 preview_limit 条 + 截断标记）
    pub fn divergence_notice(&self) -> Option<String> {
        self.outcome.divergence_notice(self.preview_limit)
    }
}

// ==========================================
// ItemImporterImpl - 物料项导入器实现
// ==========================================
pub struct ItemImporterImpl<C>
where
    C: ImportConfigReader,
{
    // 配置读取器
    config: C,
}

impl<C> ItemImporterImpl<C>
where
    C: ImportConfigReader,
{
    pub fn new(config: C) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn run(
        &self,
        file_name: &str,
        bytes: &[u8],
        options: &ParseOptions,
        start_time: Instant,
    ) -> ImportResult<ImportOutcome> {
        let batch_id = Uuid::new_v4().to_string();
        info!(batch_id = %batch_id, file = %file_name, size = bytes.len(), "开始导入物料数据");

        // === 步骤 1: 解码文件 ===
        debug!("步骤 1: 解码文件");
        let grid = UniversalFileParser::new(options.sheet_name.clone())
            .parse_named_bytes(file_name, bytes)
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                e
            })?;

        // === 步骤 2: 解析 ===
        debug!(rows = grid.len(), "步骤 2: 解析表格");
        let outcome = parse_grid(&grid, options)?;

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            items = outcome.items.len(),
            divergences = outcome.divergences.len(),
            elapsed_ms,
            "物料数据导入完成"
        );

        Ok(ImportOutcome {
            batch_id,
            file_name: file_name.to_string(),
            imported_at: Utc::now(),
            outcome,
            preview_limit: options.divergence_preview_limit,
            elapsed_ms,
        })
    }
}

#[async_trait::async_trait]
impl<C> ItemImporter for ItemImporterImpl<C>
where
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn import_from_file(&self, file_path: &Path) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();

        if !tokio::fs::try_exists(file_path).await.unwrap_or(false) {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let options = ParseOptions::from_reader(&self.config).await?;
        let bytes = tokio::fs::read(file_path).await?;
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        self.run(&file_name, &bytes, &options, start_time)
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn import_from_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();
        let options = ParseOptions::from_reader(&self.config).await?;
        self.run(file_name, &bytes, &options, start_time)
    }

    /// 批量导入多个文件（并发执行）
    async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<Result<ImportOutcome, String>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        let import_tasks = file_paths.into_iter().map(|path| async move {
            let path_str = path.display().to_string();
            match self.import_from_file(&path).await {
                Ok(result) => {
                    info!(file = %path_str, items = result.outcome.items.len(), "文件导入成功");
                    Ok(result)
                }
                Err(e) => {
                    error!(file = %path_str, error = %e, "文件导入失败");
                    Err(format!("文件 {} 导入失败: {}", path_str, e))
                }
            }
        });

        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}
