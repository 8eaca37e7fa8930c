// ==========================================
// SIV-SITE 装配线 BOM 导入 - 导入结果模型
// ==========================================
// 职责: 分歧记录（Divergence）、解析统计、单次解析结果
// 生命周期: 仅在单次解析调用内产生，由调用方消费
// ==========================================

use crate::domain::field::{Field, FieldMap};
use crate::domain::item::Item;
use crate::i18n::t_with_args;
use serde::{Deserialize, Serialize};

/// 分歧摘要默认展示条数
pub const DEFAULT_DIVERGENCE_PREVIEW: usize = 5;

// ==========================================
// Divergence - 重复行分歧
// ==========================================
// 同一 (id, 阶段) 的两行计划/实际值不一致时产生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    pub row_number: usize, // 触发分歧的行号（后出现的一行）
    pub item_id: String,
    pub phase: String,
    pub existing_plan: Option<String>,
    pub incoming_plan: Option<String>,
    pub existing_actual: Option<String>,
    pub incoming_actual: Option<String>,
}

impl Divergence {
    /// 人类可读的分歧描述（随当前语言）
    pub fn message(&self) -> String {
        let row = self.row_number.to_string();
        t_with_args(
            "import.divergence",
            &[
                ("row", row.as_str()),
                ("id", self.item_id.as_str()),
                ("phase", display_or_dash(Some(self.phase.as_str()))),
                ("plan_old", display_or_dash(self.existing_plan.as_deref())),
                ("plan_new", display_or_dash(self.incoming_plan.as_deref())),
                ("actual_old", display_or_dash(self.existing_actual.as_deref())),
                ("actual_new", display_or_dash(self.incoming_actual.as_deref())),
            ],
        )
    }
}

fn display_or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

// ==========================================
// DivergenceLog - 分歧日志
// ==========================================
// 保持输入顺序；摘要只展示前 N 条 + 截断标记
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergenceLog {
    entries: Vec<Divergence>,
}

impl DivergenceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, divergence: Divergence) {
        self.entries.push(divergence);
    }

    pub fn entries(&self) -> &[Divergence] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(Divergence::message).collect()
    }

    /// 批量提示文本
    ///
    /// # 返回
    /// - None: 无分歧
    /// - Some: 前 limit 条消息（输入顺序），超出部分以截断标记结尾
    pub fn notice(&self, limit: usize) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        let total = self.entries.len().to_string();
        let mut lines = vec![t_with_args("import.divergence_header", &[("count", total.as_str())])];
        lines.extend(self.entries.iter().take(limit).map(Divergence::message));

        if self.entries.len() > limit {
            let remaining = (self.entries.len() - limit).to_string();
            lines.push(t_with_args(
                "import.divergence_truncated",
                &[("remaining", remaining.as_str())],
            ));
        }

        Some(lines.join("\n"))
    }
}

// ==========================================
// ParseStats - 解析统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub data_rows: usize,              // 表头之后的行数
    pub skipped_missing_id: usize,     // 缺少 id 跳过
    pub skipped_noise: usize,          // 噪声行跳过
    pub merged_duplicates: usize,      // 合并入已有项的重复行
    pub out_of_range_progress: usize,  // 超出 [0,1] 的进度值个数
    pub emitted: usize,                // 最终输出的 Item 数
}

// ==========================================
// ParseOutcome - 单次解析结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub header_row: usize, // 表头行（0 基）
    pub field_map: FieldMap,
    pub items: Vec<Item>,
    pub divergences: DivergenceLog,
    pub stats: ParseStats,
}

impl ParseOutcome {
    pub fn unmapped_fields(&self) -> Vec<Field> {
        self.field_map.unmapped()
    }

    pub fn divergence_notice(&self, limit: usize) -> Option<String> {
        self.divergences.notice(limit)
    }
}
