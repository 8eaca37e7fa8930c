// ==========================================
// SIV-SITE 装配线 BOM 导入 - 行归一化器
// ==========================================
// 职责: 单行原始单元格 → 0 或 1 个 Item
// 步骤: 主键检查 → 噪声过滤 → 日期/数值/进度/文本转换
// 红线: 任何畸形单元格都不中断导入，统一回退默认值
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::field::{Field, FieldMap, ProgressStage};
use crate::domain::item::{Item, ItemDefaults, Progress};
use crate::importer::item_importer_trait::DataCleaner;

// ==========================================
// RowOutcome - 单行处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// 生成 Item；附带超出 [0,1] 的进度值个数
    Item { item: Item, out_of_range_progress: usize },
    /// id 未映射或为空
    MissingId,
    /// 除 id 外全部为空/零
    Noise,
}

// ==========================================
// RowNormalizer - 行归一化器
// ==========================================
pub struct RowNormalizer<'a> {
    field_map: &'a FieldMap,
    cleaner: &'a dyn DataCleaner,
    defaults: &'a ItemDefaults,
    clamp_progress: bool,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(
        field_map: &'a FieldMap,
        cleaner: &'a dyn DataCleaner,
        defaults: &'a ItemDefaults,
        clamp_progress: bool,
    ) -> Self {
        Self {
            field_map,
            cleaner,
            defaults,
            clamp_progress,
        }
    }

    /// 读取字段对应单元格；未映射或短行返回 None
    fn cell<'r>(&self, row: &'r [CellValue], field: Field) -> Option<&'r CellValue> {
        self.field_map.column(field).and_then(|col| row.get(col))
    }

    /// 噪声判定: 除 id 外所有已映射且存在的单元格均为空白/零
    pub fn is_noise(&self, row: &[CellValue]) -> bool {
        self.field_map
            .mapped()
            .filter(|(field, _)| *field != Field::Id)
            .filter_map(|(_, col)| row.get(col))
            .all(CellValue::is_blank_or_zero)
    }

    fn text_or(&self, row: &[CellValue], field: Field, default: &str) -> String {
        self.cleaner
            .coerce_text(self.cell(row, field))
            .unwrap_or_else(|| default.to_string())
    }

    /// 归一化单行
    ///
    /// # 参数
    /// - row: 原始行
    /// - row_number: 工作表行号（1 基，用于诊断）
    pub fn normalize(&self, row: &[CellValue], row_number: usize) -> RowOutcome {
        // 1. 主键
        let id = match self.cell(row, Field::Id) {
            Some(cell) if !cell.is_falsy() => cell.display_text(),
            _ => return RowOutcome::MissingId,
        };

        // 2. 噪声过滤
        if self.is_noise(row) {
            return RowOutcome::Noise;
        }

        // 3. 进度
        let mut progress = Progress::default();
        let mut out_of_range_progress = 0;
        for stage in ProgressStage::ALL {
            let raw = self.cleaner.coerce_f64(self.cell(row, Field::Progress(stage)));
            let value = if (0.0..=1.0).contains(&raw) {
                raw
            } else {
                out_of_range_progress += 1;
                if self.clamp_progress {
                    raw.clamp(0.0, 1.0)
                } else {
                    raw
                }
            };
            progress.set(stage, value);
        }

        // 4. 文本 / 日期 / 数值
        let make_buy = self.text_or(row, Field::MakeBuy, &self.defaults.make_buy);

        let item = Item {
            id,
            client: self.text_or(row, Field::Client, &self.defaults.client),
            project: self.text_or(row, Field::Project, &self.defaults.project),
            operation: self.text_or(row, Field::Operation, &self.defaults.operation),
            description: self.text_or(row, Field::Description, &self.defaults.description),
            supplier: self.text_or(row, Field::Supplier, &self.defaults.supplier),
            make_buy: self.cleaner.clean_text(&make_buy, true),
            transmission: self.text_or(row, Field::Transmission, &self.defaults.transmission),
            supplier_delivery_date: self
                .cleaner
                .coerce_date(self.cell(row, Field::SupplierDeliveryDate)),
            final_delivery_date: self
                .cleaner
                .coerce_date(self.cell(row, Field::FinalDeliveryDate)),
            hours: self.cleaner.coerce_f64(self.cell(row, Field::Hours)),
            labor_value: self.cleaner.coerce_f64(self.cell(row, Field::LaborValue)),
            progress,
            phase: self.cleaner.coerce_text(self.cell(row, Field::Phase)),
            plan: self.cleaner.coerce_text(self.cell(row, Field::Plan)),
            actual: self.cleaner.coerce_text(self.cell(row, Field::Actual)),
            row_number,
        };

        RowOutcome::Item {
            item,
            out_of_range_progress,
        }
    }
}
