// ==========================================
// SIV-SITE 装配线 BOM 导入 - 列解析器
// ==========================================
// 职责: 表头文本 → 语义字段列号（FieldMap）
// 规则: 显式的有序规则表；每条规则取第一个匹配的列
// 红线: 纯函数，无副作用，结果只由表头行决定
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::field::{Field, FieldMap, ProgressStage};
use serde::{Deserialize, Serialize};

// ==========================================
// HeaderMatcher - 表头匹配谓词
// ==========================================
// 表头先做 TRIM + 小写归一化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "patterns", rename_all = "snake_case")]
pub enum HeaderMatcher {
    /// 与任一写法全等
    Exact(Vec<String>),
    /// 合取范式: 每组至少包含一个子串，所有组都满足
    Contains(Vec<Vec<String>>),
}

impl HeaderMatcher {
    pub fn exact(spellings: &[&str]) -> Self {
        HeaderMatcher::Exact(spellings.iter().map(|s| s.to_lowercase()).collect())
    }

    /// 包含任一子串
    pub fn contains_any(needles: &[&str]) -> Self {
        HeaderMatcher::Contains(vec![needles.iter().map(|s| s.to_lowercase()).collect()])
    }

    /// 每组包含任一子串（组之间为"且"）
    pub fn contains_all(groups: &[&[&str]]) -> Self {
        HeaderMatcher::Contains(
            groups
                .iter()
                .map(|g| g.iter().map(|s| s.to_lowercase()).collect())
                .collect(),
        )
    }

    /// header 必须已归一化
    pub fn matches(&self, header: &str) -> bool {
        if header.is_empty() {
            return false;
        }
        match self {
            HeaderMatcher::Exact(spellings) => spellings.iter().any(|s| s == header),
            HeaderMatcher::Contains(groups) => {
                !groups.is_empty()
                    && groups
                        .iter()
                        .all(|group| group.iter().any(|needle| header.contains(needle.as_str())))
            }
        }
    }
}

// ==========================================
// ColumnRule / RuleTable - 列匹配规则表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub field: Field,
    pub matcher: HeaderMatcher,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<ColumnRule>,
}

impl Default for RuleTable {
    /// 合并各版本解析器的匹配规则（并集）
    fn default() -> Self {
        use HeaderMatcher as M;
        use ProgressStage as P;

        let rules = vec![
            // ===== 全等匹配 =====
            (Field::Id, M::exact(&["id"])),
            (Field::Client, M::exact(&["cliente"])),
            (Field::Project, M::exact(&["projeto"])),
            (Field::Operation, M::exact(&["operação", "operacao"])),
            (Field::Description, M::exact(&["descrição", "descricao"])),
            (Field::Supplier, M::exact(&["fornecedor"])),
            (Field::Transmission, M::exact(&["transmissão", "transmissao"])),
            // ===== 子串匹配 =====
            (Field::MakeBuy, M::contains_any(&["make"])),
            (
                Field::SupplierDeliveryDate,
                M::contains_all(&[&["entrega"], &["fornecedor"]]),
            ),
            (
                Field::FinalDeliveryDate,
                M::contains_all(&[&["entrega"], &["final"]]),
            ),
            (Field::Hours, M::contains_any(&["quantd", "horas"])),
            (Field::LaborValue, M::contains_any(&["valor mo"])),
            // ===== 进度子字段 =====
            (
                Field::Progress(P::Design3d),
                M::contains_any(&["3d", "matematica", "matemática"]),
            ),
            (
                Field::Progress(P::Materials),
                M::contains_all(&[&["material"], &["construtivo"]]),
            ),
            (Field::Progress(P::Minuteria), M::contains_any(&["minuteria"])),
            (Field::Progress(P::Bordo), M::contains_any(&["bordo"])),
            (
                Field::Progress(P::MechanicalAssembly),
                M::contains_all(&[&["montagem"], &["mecanica", "mecânica"]]),
            ),
            (
                Field::Progress(P::QualityInspection),
                M::contains_any(&["inspeção", "inspecao", "qualidade"]),
            ),
            // ===== 工位/阶段表 =====
            (Field::Phase, M::contains_any(&["fase", "etapa"])),
            (Field::Plan, M::contains_any(&["planejad", "previst"])),
            (Field::Actual, M::contains_any(&["realizad", "executad"])),
        ];

        Self {
            rules: rules
                .into_iter()
                .map(|(field, matcher)| ColumnRule { field, matcher })
                .collect(),
        }
    }
}

impl RuleTable {
    pub fn new(rules: Vec<ColumnRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ColumnRule] {
        &self.rules
    }

    pub fn rule(&self, field: Field) -> Option<&ColumnRule> {
        self.rules.iter().find(|r| r.field == field)
    }

    /// 替换（或追加）某字段的匹配规则
    pub fn with_rule(mut self, field: Field, matcher: HeaderMatcher) -> Self {
        match self.rules.iter_mut().find(|r| r.field == field) {
            Some(rule) => rule.matcher = matcher,
            None => self.rules.push(ColumnRule { field, matcher }),
        }
        self
    }

    /// 移除某字段（该版本表格无此列）
    pub fn without(mut self, field: Field) -> Self {
        self.rules.retain(|r| r.field != field);
        self
    }

    /// 解析表头行
    ///
    /// 同一列可同时满足多个字段的规则；每个字段独立取首个匹配列。
    pub fn resolve(&self, header_row: &[CellValue]) -> FieldMap {
        let headers: Vec<String> = header_row.iter().map(normalize_header).collect();
        let mut map = FieldMap::new();

        for rule in &self.rules {
            if map.is_mapped(rule.field) {
                continue;
            }
            if let Some(col) = headers.iter().position(|h| rule.matcher.matches(h)) {
                map.insert(rule.field, col);
            }
        }

        map
    }
}

/// 表头归一化: TRIM + 小写
pub fn normalize_header(cell: &CellValue) -> String {
    cell.display_text().trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(labels: &[&str]) -> Vec<CellValue> {
        labels.iter().map(|l| CellValue::from(*l)).collect()
    }

    #[test]
    fn test_exact_and_accent_variants() {
        let table = RuleTable::default();
        let map = table.resolve(&header(&["ID", "Cliente", "Operacao", "Descrição", " PROJETO "]));

        assert_eq!(map.column(Field::Id), Some(0));
        assert_eq!(map.column(Field::Client), Some(1));
        assert_eq!(map.column(Field::Operation), Some(2));
        assert_eq!(map.column(Field::Description), Some(3));
        assert_eq!(map.column(Field::Project), Some(4));
    }

    #[test]
    fn test_exact_rejects_substring() {
        let table = RuleTable::default();
        let map = table.resolve(&header(&["ID", "Cliente Final"]));
        assert_eq!(map.column(Field::Client), None);
    }

    #[test]
    fn test_substring_rules() {
        let table = RuleTable::default();
        let map = table.resolve(&header(&[
            "ID",
            "Make or Buy",
            "Quantd. Horas",
            "Valor MO (R$)",
            "Data Entrega Fornecedor",
            "Entrega Final",
            "Fornecedor",
        ]));

        assert_eq!(map.column(Field::MakeBuy), Some(1));
        assert_eq!(map.column(Field::Hours), Some(2));
        assert_eq!(map.column(Field::LaborValue), Some(3));
        assert_eq!(map.column(Field::SupplierDeliveryDate), Some(4));
        assert_eq!(map.column(Field::FinalDeliveryDate), Some(5));
        assert_eq!(map.column(Field::Supplier), Some(6));
    }

    #[test]
    fn test_date_requires_both_terms() {
        let table = RuleTable::default();
        let map = table.resolve(&header(&["ID", "Entrega", "Data Final"]));
        assert_eq!(map.column(Field::SupplierDeliveryDate), None);
        assert_eq!(map.column(Field::FinalDeliveryDate), None);
    }

    #[test]
    fn test_progress_rules() {
        let table = RuleTable::default();
        let map = table.resolve(&header(&[
            "ID",
            "Matemática",
            "Material Construtivo",
            "Minuteria",
            "Bordo",
            "Montagem Mecânica",
            "Inspeção",
            "Material",
        ]));

        assert_eq!(map.column(Field::Progress(ProgressStage::Design3d)), Some(1));
        assert_eq!(map.column(Field::Progress(ProgressStage::Materials)), Some(2));
        assert_eq!(map.column(Field::Progress(ProgressStage::Minuteria)), Some(3));
        assert_eq!(map.column(Field::Progress(ProgressStage::Bordo)), Some(4));
        assert_eq!(map.column(Field::Progress(ProgressStage::MechanicalAssembly)), Some(5));
        assert_eq!(map.column(Field::Progress(ProgressStage::QualityInspection)), Some(6));
    }

    #[test]
    fn test_assembly_requires_qualifier() {
        let table = RuleTable::default();
        let map = table.resolve(&header(&["ID", "Montagem Elétrica", "Montagem Mecanica"]));
        assert_eq!(map.column(Field::Progress(ProgressStage::MechanicalAssembly)), Some(2));
    }

    #[test]
    fn test_first_matching_column_wins() {
        let table = RuleTable::default();
        let map = table.resolve(&header(&["ID", "Horas Previstas", "Horas Reais"]));
        assert_eq!(map.column(Field::Hours), Some(1));
    }

    #[test]
    fn test_non_text_headers_tolerated() {
        let table = RuleTable::default();
        let row = vec![CellValue::Number(2024.0), CellValue::Empty, CellValue::text("ID")];
        let map = table.resolve(&row);
        assert_eq!(map.column(Field::Id), Some(2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_without_and_with_rule() {
        let table = RuleTable::default()
            .without(Field::Transmission)
            .with_rule(Field::Client, HeaderMatcher::exact(&["cliente", "customer"]));

        let map = table.resolve(&header(&["ID", "Customer", "Transmissão"]));
        assert_eq!(map.column(Field::Client), Some(1));
        assert_eq!(map.column(Field::Transmission), None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let table = RuleTable::default();
        let row = header(&["ID", "Cliente", "Horas", "Bordo"]);
        assert_eq!(table.resolve(&row), table.resolve(&row));
    }

    #[test]
    fn test_rule_table_serde_roundtrip() {
        let table = RuleTable::default().without(Field::Phase);
        let json = serde_json::to_string(&table).unwrap();
        let parsed: RuleTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, table);
    }
}
