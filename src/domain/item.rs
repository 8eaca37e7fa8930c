// ==========================================
// SIV-SITE 装配线 BOM 导入 - 物料项领域模型
// ==========================================
// 职责: 归一化后的业务实体（Item）及其进度子记录
// 用途: 导入层写入，看板/表格/层级树只读
// ==========================================

use crate::domain::field::ProgressStage;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Progress - 进度子记录
// ==========================================
// 语义为 [0,1] 完成率；是否截断由导入配置决定
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub design_3d: f64,           // 3D 设计 / 数模
    pub materials: f64,           // 结构材料
    pub minuteria: f64,           // 小五金
    pub bordo: f64,               // 边缘处理
    pub mechanical_assembly: f64, // 机械装配
    pub quality_inspection: f64,  // 质量检验
}

impl Progress {
    pub fn get(&self, stage: ProgressStage) -> f64 {
        match stage {
            ProgressStage::Design3d => self.design_3d,
            ProgressStage::Materials => self.materials,
            ProgressStage::Minuteria => self.minuteria,
            ProgressStage::Bordo => self.bordo,
            ProgressStage::MechanicalAssembly => self.mechanical_assembly,
            ProgressStage::QualityInspection => self.quality_inspection,
        }
    }

    pub fn set(&mut self, stage: ProgressStage, value: f64) {
        let slot = match stage {
            ProgressStage::Design3d => &mut self.design_3d,
            ProgressStage::Materials => &mut self.materials,
            ProgressStage::Minuteria => &mut self.minuteria,
            ProgressStage::Bordo => &mut self.bordo,
            ProgressStage::MechanicalAssembly => &mut self.mechanical_assembly,
            ProgressStage::QualityInspection => &mut self.quality_inspection,
        };
        *slot = value;
    }

    pub fn status(&self, stage: ProgressStage) -> ProgressStatus {
        ProgressStatus::from_ratio(self.get(stage))
    }

    /// 全部阶段均完成
    pub fn is_complete(&self) -> bool {
        ProgressStage::ALL
            .iter()
            .all(|s| self.status(*s) == ProgressStatus::Complete)
    }

    /// 六个阶段的平均完成率
    pub fn overall(&self) -> f64 {
        let sum: f64 = ProgressStage::ALL.iter().map(|s| self.get(*s)).sum();
        sum / ProgressStage::ALL.len() as f64
    }
}

// ==========================================
// ProgressStatus - 阶段状态
// ==========================================
// >= 1 完成；> 0 进行中；其余未开始
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    Complete,
    Partial,
    Pending,
}

impl ProgressStatus {
    pub fn from_ratio(value: f64) -> Self {
        if value >= 1.0 {
            ProgressStatus::Complete
        } else if value > 0.0 {
            ProgressStatus::Partial
        } else {
            ProgressStatus::Pending
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressStatus::Complete => write!(f, "COMPLETE"),
            ProgressStatus::Partial => write!(f, "PARTIAL"),
            ProgressStatus::Pending => write!(f, "PENDING"),
        }
    }
}

// ==========================================
// Item - 归一化物料项
// ==========================================
// 红线: id 必填非空；除 id 外全部为空/零的行不会生成 Item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    // ===== 主键 =====
    pub id: String,

    // ===== 描述信息 =====
    pub client: String,      // 客户（默认 "Geral"）
    pub project: String,     // 项目
    pub operation: String,   // 工序代码
    pub description: String, // 描述（默认 "Sem descrição"）
    pub supplier: String,    // 供应商（默认 "Interno"）

    // ===== 分类 =====
    pub make_buy: String,     // 自制/外购（大写，通常 MAKE / BUY）
    pub transmission: String, // 跟踪码（默认 "-"）

    // ===== 日期 =====
    pub supplier_delivery_date: Option<NaiveDate>,
    pub final_delivery_date: Option<NaiveDate>,

    // ===== 数值 =====
    pub hours: f64,
    pub labor_value: f64,

    // ===== 进度 =====
    pub progress: Progress,

    // ===== 阶段计划/实际（工位表）=====
    pub phase: Option<String>,
    pub plan: Option<String>,
    pub actual: Option<String>,

    // 元信息
    pub row_number: usize, // 原始工作表行号（1 基）
}

impl Item {
    /// 去重键: (id, 阶段名)
    ///
    /// 无阶段的行（普通 BOM 表）没有去重键，每行独立输出
    pub fn merge_key(&self) -> Option<(String, String)> {
        self.phase
            .as_ref()
            .map(|phase| (self.id.clone(), phase.clone()))
    }

    pub fn is_make(&self) -> bool {
        self.make_buy == "MAKE"
    }

    pub fn is_buy(&self) -> bool {
        self.make_buy == "BUY"
    }
}

// ==========================================
// ItemDefaults - 字符串字段默认值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDefaults {
    pub client: String,
    pub project: String,
    pub operation: String,
    pub description: String,
    pub supplier: String,
    pub make_buy: String,
    pub transmission: String,
}

impl Default for ItemDefaults {
    fn default() -> Self {
        Self {
            client: "Geral".to_string(),
            project: String::new(),
            operation: String::new(),
            description: "Sem descrição".to_string(),
            supplier: "Interno".to_string(),
            make_buy: "Make".to_string(),
            transmission: "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_status_thresholds() {
        assert_eq!(ProgressStatus::from_ratio(1.0), ProgressStatus::Complete);
        assert_eq!(ProgressStatus::from_ratio(1.7), ProgressStatus::Complete);
        assert_eq!(ProgressStatus::from_ratio(0.01), ProgressStatus::Partial);
        assert_eq!(ProgressStatus::from_ratio(0.0), ProgressStatus::Pending);
        assert_eq!(ProgressStatus::from_ratio(-0.5), ProgressStatus::Pending);
    }

    #[test]
    fn test_progress_get_set() {
        let mut progress = Progress::default();
        progress.set(ProgressStage::Bordo, 0.5);
        assert_eq!(progress.get(ProgressStage::Bordo), 0.5);
        assert_eq!(progress.status(ProgressStage::Bordo), ProgressStatus::Partial);
        assert!(!progress.is_complete());

        for stage in ProgressStage::ALL {
            progress.set(stage, 1.0);
        }
        assert!(progress.is_complete());
        assert_eq!(progress.overall(), 1.0);
    }
}
