// ==========================================
// SIV-SITE 装配线 BOM 导入 - 语义字段定义
// ==========================================
// 职责: 固定的语义字段集合 + 字段 → 列号映射表（FieldMap）
// 红线: 字段集合编译期固定；列号为 0 基，未映射为 None
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// ProgressStage - 进度子字段
// ==========================================
// 六个命名完成率（3D 设计 / 结构材料 / 小五金 / 边缘处理 / 机械装配 / 质量检验）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Design3d,
    Materials,
    Minuteria,
    Bordo,
    MechanicalAssembly,
    QualityInspection,
}

impl ProgressStage {
    pub const ALL: [ProgressStage; 6] = [
        ProgressStage::Design3d,
        ProgressStage::Materials,
        ProgressStage::Minuteria,
        ProgressStage::Bordo,
        ProgressStage::MechanicalAssembly,
        ProgressStage::QualityInspection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStage::Design3d => "design_3d",
            ProgressStage::Materials => "materials",
            ProgressStage::Minuteria => "minuteria",
            ProgressStage::Bordo => "bordo",
            ProgressStage::MechanicalAssembly => "mechanical_assembly",
            ProgressStage::QualityInspection => "quality_inspection",
        }
    }
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Field - 语义字段
// ==========================================
// 序列化格式: snake_case（与配置文件键名一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Client,
    Project,
    Operation,
    Description,
    MakeBuy,
    Supplier,
    Transmission,
    SupplierDeliveryDate,
    FinalDeliveryDate,
    Hours,
    LaborValue,
    Progress(ProgressStage),
    // 工位/阶段表（Stations → Items → Phases）专用
    Phase,
    Plan,
    Actual,
}

impl Field {
    /// 全部字段（固定顺序，亦为噪声过滤的遍历顺序）
    pub const ALL: [Field; 21] = [
        Field::Id,
        Field::Client,
        Field::Project,
        Field::Operation,
        Field::Description,
        Field::MakeBuy,
        Field::Supplier,
        Field::Transmission,
        Field::SupplierDeliveryDate,
        Field::FinalDeliveryDate,
        Field::Hours,
        Field::LaborValue,
        Field::Progress(ProgressStage::Design3d),
        Field::Progress(ProgressStage::Materials),
        Field::Progress(ProgressStage::Minuteria),
        Field::Progress(ProgressStage::Bordo),
        Field::Progress(ProgressStage::MechanicalAssembly),
        Field::Progress(ProgressStage::QualityInspection),
        Field::Phase,
        Field::Plan,
        Field::Actual,
    ];

    /// 配置键名（如 "supplier_delivery_date" / "progress.bordo"）
    pub fn key(&self) -> String {
        match self {
            Field::Id => "id".to_string(),
            Field::Client => "client".to_string(),
            Field::Project => "project".to_string(),
            Field::Operation => "operation".to_string(),
            Field::Description => "description".to_string(),
            Field::MakeBuy => "make_buy".to_string(),
            Field::Supplier => "supplier".to_string(),
            Field::Transmission => "transmission".to_string(),
            Field::SupplierDeliveryDate => "supplier_delivery_date".to_string(),
            Field::FinalDeliveryDate => "final_delivery_date".to_string(),
            Field::Hours => "hours".to_string(),
            Field::LaborValue => "labor_value".to_string(),
            Field::Progress(stage) => format!("progress.{}", stage.as_str()),
            Field::Phase => "phase".to_string(),
            Field::Plan => "plan".to_string(),
            Field::Actual => "actual".to_string(),
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        let key = key.trim().to_lowercase();
        Field::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ==========================================
// FieldMap - 字段 → 列号映射
// ==========================================
// 生命周期: 每次解析由表头行构建一次，之后只读
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    columns: BTreeMap<Field, usize>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, field: Field, column: usize) {
        self.columns.insert(field, column);
    }

    /// 未映射返回 None
    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn is_mapped(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    /// 已映射字段（按 Field::ALL 顺序）
    pub fn mapped(&self) -> impl Iterator<Item = (Field, usize)> + '_ {
        Field::ALL
            .iter()
            .filter_map(move |f| self.column(*f).map(|c| (*f, c)))
    }

    pub fn unmapped(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| !self.is_mapped(*f))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
