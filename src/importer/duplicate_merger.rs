// ==========================================
// SIV-SITE 装配线 BOM 导入 - 去重合并器
// ==========================================
// 职责: 按 (id, 阶段名) 合并重复行，记录计划/实际值分歧；无阶段的行不合并
// 规则: 首次出现决定位置及其余字段；计划/实际相同则无操作
// 策略: MergePolicy 可替换（拼接 / 后者覆盖 / 累积 / 冲突报错）
// ==========================================

use crate::domain::import::{Divergence, DivergenceLog};
use crate::domain::item::Item;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// 默认拼接分隔符
pub const DEFAULT_MERGE_SEPARATOR: &str = " | ";

/// 拼接时缺失值的占位
const ABSENT_PLACEHOLDER: &str = "-";

// ==========================================
// MergeContext - 合并上下文（用于诊断）
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct MergeContext<'a> {
    pub row_number: usize,
    pub item_id: &'a str,
    pub phase: &'a str,
    pub field: &'static str, // "plan" / "actual"
}

// ==========================================
// MergePolicy Trait
// ==========================================
// 仅在计划或实际值不一致时调用；两个字段各调用一次
pub trait MergePolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// 合并单个字段
    ///
    /// # 返回
    /// - Ok(Some/None): 合并后的字段值
    /// - Err(DuplicateConflict): 策略拒绝合并
    fn merge(
        &self,
        existing: Option<&str>,
        incoming: Option<&str>,
        ctx: &MergeContext<'_>,
    ) -> ImportResult<Option<String>>;
}

// ==========================================
// ConcatPolicy - 拼接（默认）
// ==========================================
// "a" + "b" → "a | b"；多次合并左到右链式拼接
#[derive(Debug, Clone)]
pub struct ConcatPolicy {
    separator: String,
}

impl ConcatPolicy {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for ConcatPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_SEPARATOR)
    }
}

impl MergePolicy for ConcatPolicy {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn merge(
        &self,
        existing: Option<&str>,
        incoming: Option<&str>,
        _ctx: &MergeContext<'_>,
    ) -> ImportResult<Option<String>> {
        Ok(Some(format!(
            "{}{}{}",
            existing.unwrap_or(ABSENT_PLACEHOLDER),
            self.separator,
            incoming.unwrap_or(ABSENT_PLACEHOLDER)
        )))
    }
}

// ==========================================
// LastWinsPolicy - 后者覆盖
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWinsPolicy;

impl MergePolicy for LastWinsPolicy {
    fn name(&self) -> &'static str {
        "last_wins"
    }

    fn merge(
        &self,
        _existing: Option<&str>,
        incoming: Option<&str>,
        _ctx: &MergeContext<'_>,
    ) -> ImportResult<Option<String>> {
        Ok(incoming.map(str::to_string))
    }
}

// ==========================================
// AccumulatePolicy - 累积（去重追加）
// ==========================================
// 只追加尚未出现过的值；缺失值不追加
#[derive(Debug, Clone)]
pub struct AccumulatePolicy {
    separator: String,
}

impl AccumulatePolicy {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for AccumulatePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_SEPARATOR)
    }
}

impl MergePolicy for AccumulatePolicy {
    fn name(&self) -> &'static str {
        "accumulate"
    }

    fn merge(
        &self,
        existing: Option<&str>,
        incoming: Option<&str>,
        _ctx: &MergeContext<'_>,
    ) -> ImportResult<Option<String>> {
        match (existing, incoming) {
            (None, None) => Ok(None),
            (Some(old), None) => Ok(Some(old.to_string())),
            (None, Some(new)) => Ok(Some(new.to_string())),
            (Some(old), Some(new)) => {
                if old.split(self.separator.as_str()).any(|v| v == new) {
                    Ok(Some(old.to_string()))
                } else {
                    Ok(Some(format!("{}{}{}", old, self.separator, new)))
                }
            }
        }
    }
}

// ==========================================
// RejectConflictPolicy - 冲突即报错
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectConflictPolicy;

impl MergePolicy for RejectConflictPolicy {
    fn name(&self) -> &'static str {
        "reject"
    }

    fn merge(
        &self,
        existing: Option<&str>,
        incoming: Option<&str>,
        ctx: &MergeContext<'_>,
    ) -> ImportResult<Option<String>> {
        if existing == incoming {
            return Ok(existing.map(str::to_string));
        }
        Err(ImportError::DuplicateConflict {
            row: ctx.row_number,
            item_id: ctx.item_id.to_string(),
            phase: ctx.phase.to_string(),
            message: format!(
                "{}: {} ≠ {}",
                ctx.field,
                existing.unwrap_or(ABSENT_PLACEHOLDER),
                incoming.unwrap_or(ABSENT_PLACEHOLDER)
            ),
        })
    }
}

// ==========================================
// MergePolicyKind - 策略选择（配置用）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicyKind {
    #[default]
    Concat,
    LastWins,
    Accumulate,
    Reject,
}

impl MergePolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicyKind::Concat => "concat",
            MergePolicyKind::LastWins => "last_wins",
            MergePolicyKind::Accumulate => "accumulate",
            MergePolicyKind::Reject => "reject",
        }
    }

    /// 构造策略实例
    pub fn build(&self, separator: &str) -> Box<dyn MergePolicy> {
        match self {
            MergePolicyKind::Concat => Box::new(ConcatPolicy::new(separator)),
            MergePolicyKind::LastWins => Box::new(LastWinsPolicy),
            MergePolicyKind::Accumulate => Box::new(AccumulatePolicy::new(separator)),
            MergePolicyKind::Reject => Box::new(RejectConflictPolicy),
        }
    }
}

impl fmt::Display for MergePolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MergePolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "concat" => Ok(MergePolicyKind::Concat),
            "last_wins" | "last-wins" => Ok(MergePolicyKind::LastWins),
            "accumulate" => Ok(MergePolicyKind::Accumulate),
            "reject" => Ok(MergePolicyKind::Reject),
            other => Err(format!("未知合并策略: {}", other)),
        }
    }
}

// ==========================================
// DuplicateMerger - 去重合并器
// ==========================================
// 生命周期: 单次解析调用内独占
pub struct DuplicateMerger {
    policy: Box<dyn MergePolicy>,
    items: Vec<Item>,
    index: HashMap<(String, String), usize>,
    divergences: DivergenceLog,
    merged: usize,
}

impl Default for DuplicateMerger {
    fn default() -> Self {
        Self::new(Box::new(ConcatPolicy::default()))
    }
}

impl DuplicateMerger {
    pub fn new(policy: Box<dyn MergePolicy>) -> Self {
        Self {
            policy,
            items: Vec::new(),
            index: HashMap::new(),
            divergences: DivergenceLog::new(),
            merged: 0,
        }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// 加入一条归一化后的 Item
    ///
    /// # 返回
    /// - Ok(false): 新键或无阶段，已追加
    /// - Ok(true): 重复键，已合并入首次出现的 Item
    pub fn push(&mut self, item: Item) -> ImportResult<bool> {
        let Some(key) = item.merge_key() else {
            self.items.push(item);
            return Ok(false);
        };

        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(item);
                return Ok(false);
            }
        };

        self.merged += 1;
        let existing = &mut self.items[slot];

        if existing.plan == item.plan && existing.actual == item.actual {
            return Ok(true);
        }

        let (item_id, phase) = key;
        let ctx = |field| MergeContext {
            row_number: item.row_number,
            item_id: &item_id,
            phase: &phase,
            field,
        };

        let plan = self.policy.merge(
            existing.plan.as_deref(),
            item.plan.as_deref(),
            &ctx("plan"),
        )?;
        let actual = self.policy.merge(
            existing.actual.as_deref(),
            item.actual.as_deref(),
            &ctx("actual"),
        )?;

        let divergence = Divergence {
            row_number: item.row_number,
            item_id: item_id.clone(),
            phase: phase.clone(),
            existing_plan: existing.plan.clone(),
            incoming_plan: item.plan.clone(),
            existing_actual: existing.actual.clone(),
            incoming_actual: item.actual.clone(),
        };
        warn!(
            row = item.row_number,
            item_id = %item_id,
            phase = %phase,
            policy = self.policy.name(),
            "重复项计划/实际值不一致，已合并"
        );

        existing.plan = plan;
        existing.actual = actual;
        self.divergences.push(divergence);

        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 结束合并
    pub fn finish(self) -> MergeOutcome {
        MergeOutcome {
            items: self.items,
            divergences: self.divergences,
            merged: self.merged,
        }
    }
}

// ==========================================
// MergeOutcome - 合并结果
// ==========================================
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub items: Vec<Item>, // 按首次出现排序
    pub divergences: DivergenceLog,
    pub merged: usize, // 合并入已有项的重复行数
}
