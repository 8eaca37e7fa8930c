// ==========================================
// SIV-SITE 装配线 BOM 导入 - 项目导入 API
// ==========================================
// 职责: 调用导入器，将结果注册为项目并设为当前项目
// 说明: 表头未找到时不注册任何项目
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::app::state::AppState;
use crate::config::ConfigManager;
use crate::domain::project::Project;
use crate::i18n::t_with_args;
use crate::importer::{ImportOutcome, ItemImporter, ItemImporterImpl};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument, warn};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 注册后的项目ID
    pub project_id: String,
    pub project_name: String,
    /// 导入批次ID
    pub batch_id: String,
    pub file_name: String,
    /// 输出的物料项数量
    pub imported: usize,
    /// 表头之后的数据行数
    pub data_rows: usize,
    pub skipped_missing_id: usize,
    pub skipped_noise: usize,
    pub merged_duplicates: usize,
    pub out_of_range_progress: usize,
    pub divergence_count: usize,
    /// 分歧批量提示（已本地化；无分歧时为空）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divergence_notice: Option<String>,
    /// 未找到表头的字段键
    pub unmapped_fields: Vec<String>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: u64,
    /// 导入摘要（已本地化）
    pub message: String,
}

/// 导入API
pub struct ImportApi {
    importer: ItemImporterImpl<ConfigManager>,
}

impl ImportApi {
    /// 创建新的ImportApi实例（配置共享同一存储）
    pub fn new(config: ConfigManager) -> Self {
        Self {
            importer: ItemImporterImpl::new(config),
        }
    }

    /// 从文件导入项目
    ///
    /// # 参数
    /// - state: 应用状态（注册项目并激活）
    /// - file_path: 文件路径（.xlsx/.xlsm/.xls/.ods/.csv）
    /// - name: 项目名称（None = 文件名去扩展名）
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(ApiError::HeaderNotFound): 表头未找到
    /// - Err(ApiError::FileError): 文件不存在 / 格式不支持
    #[instrument(skip(self, state, file_path), fields(file = %file_path.display()))]
    pub async fn import_project(
        &self,
        state: &mut AppState,
        file_path: &Path,
        name: Option<&str>,
    ) -> ApiResult<ImportApiResponse> {
        let outcome = self.importer.import_from_file(file_path).await.map_err(|e| {
            warn!(error = %e, "项目导入失败");
            ApiError::from(e)
        })?;

        let default_name = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(register(state, outcome, name, default_name))
    }

    /// 从内存字节导入项目（扩展名取自 file_name）
    #[instrument(skip(self, state, bytes), fields(file = %file_name, size = bytes.len()))]
    pub async fn import_project_bytes(
        &self,
        state: &mut AppState,
        file_name: &str,
        bytes: Vec<u8>,
        name: Option<&str>,
    ) -> ApiResult<ImportApiResponse> {
        let outcome = self
            .importer
            .import_from_bytes(file_name, bytes)
            .await
            .map_err(|e| {
                warn!(error = %e, "项目导入失败");
                ApiError::from(e)
            })?;

        let default_name = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string();

        Ok(register(state, outcome, name, default_name))
    }
}

fn register(
    state: &mut AppState,
    result: ImportOutcome,
    name: Option<&str>,
    default_name: String,
) -> ImportApiResponse {
    let project_name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or(default_name);

    let divergence_notice = result.divergence_notice();
    let ImportOutcome {
        batch_id,
        file_name,
        elapsed_ms,
        outcome,
        ..
    } = result;

    let unmapped_fields = outcome
        .unmapped_fields()
        .iter()
        .map(|f| f.key())
        .collect();
    let stats = outcome.stats.clone();
    let divergence_count = outcome.divergences.len();

    let project = Project::new(
        project_name.clone(),
        Some(file_name.clone()),
        outcome.items,
        outcome.divergences,
        outcome.stats,
    );
    let project_id = state.register(project);

    let skipped = (stats.skipped_missing_id + stats.skipped_noise).to_string();
    let message = t_with_args(
        "import.summary",
        &[
            ("items", stats.emitted.to_string().as_str()),
            ("skipped", skipped.as_str()),
            ("merged", stats.merged_duplicates.to_string().as_str()),
        ],
    );

    info!(
        project_id = %project_id,
        project = %project_name,
        items = stats.emitted,
        "项目已注册并激活"
    );

    ImportApiResponse {
        project_id,
        project_name,
        batch_id,
        file_name,
        imported: stats.emitted,
        data_rows: stats.data_rows,
        skipped_missing_id: stats.skipped_missing_id,
        skipped_noise: stats.skipped_noise,
        merged_duplicates: stats.merged_duplicates,
        out_of_range_progress: stats.out_of_range_progress,
        divergence_count,
        divergence_notice,
        unmapped_fields,
        elapsed_ms,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Planilha SIV\nID,Cliente,Projeto,Horas\nA1,ACME,Linha 1,12\nA1,ACME,Linha 1,12\n,,,\n";

    #[tokio::test]
    async fn test_import_bytes_registers_active_project() {
        let config = ConfigManager::new();
        let api = ImportApi::new(config.clone());
        let mut state = AppState::new(config);

        let response = api
            .import_project_bytes(&mut state, "linha.csv", CSV.as_bytes().to_vec(), None)
            .await
            .unwrap();

        assert_eq!(response.project_name, "linha");
        // 无阶段列: 重复 id 各自输出
        assert_eq!(response.imported, 2);
        assert_eq!(response.merged_duplicates, 0);
        assert_eq!(response.divergence_count, 0);
        assert!(response.divergence_notice.is_none());
        assert!(response.unmapped_fields.contains(&"description".to_string()));

        let active = state.active().unwrap();
        assert_eq!(active.project_id, response.project_id);
        assert_eq!(active.items().len(), 2);
    }

    #[tokio::test]
    async fn test_explicit_name_wins() {
        let config = ConfigManager::new();
        let api = ImportApi::new(config.clone());
        let mut state = AppState::new(config);

        let response = api
            .import_project_bytes(&mut state, "x.csv", CSV.as_bytes().to_vec(), Some("  Obra 7 "))
            .await
            .unwrap();
        assert_eq!(response.project_name, "Obra 7");
        assert!(state.projects.find_by_name("obra 7").is_some());
    }

    #[tokio::test]
    async fn test_header_not_found_registers_nothing() {
        let config = ConfigManager::new();
        let api = ImportApi::new(config.clone());
        let mut state = AppState::new(config);

        let err = api
            .import_project_bytes(&mut state, "x.csv", b"a,b\n1,2\n".to_vec(), None)
            .await
            .unwrap_err();

        assert!(err.is_header_not_found());
        assert!(state.projects.is_empty());
        assert!(state.active().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_file_error() {
        let config = ConfigManager::new();
        let api = ImportApi::new(config.clone());
        let mut state = AppState::new(config);

        let err = api
            .import_project(&mut state, Path::new("/nao/existe.xlsx"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::FileError(_)));
    }
}
