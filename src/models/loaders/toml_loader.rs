use std::path::Path;

use anyhow::Result;
use tokio::fs;

use crate::error::AppError;
use crate::models::plan::LessonPlanParameters;

/// 从 TOML 文件加载课程计划参数
///
/// 读取失败和解析失败分别报 `FileError::ReadFailed` / `FileError::TomlParseFailed`，
/// 均携带文件路径
pub async fn load_params_from_toml(toml_file_path: &Path) -> Result<LessonPlanParameters> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(toml_file_path.display().to_string(), e))?;

    let params: LessonPlanParameters = toml::from_str(&content)
        .map_err(|e| AppError::toml_parse_failed(toml_file_path.display().to_string(), e))?;

    Ok(params)
}
