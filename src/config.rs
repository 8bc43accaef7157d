use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// LLM API 密钥（必填，缺失时 validate 会报错）
    pub llm_api_key: String,
    /// LLM API 基础地址
    pub llm_api_base_url: String,
    /// 文本模型候选列表（逗号分隔，按顺序尝试）
    pub llm_model_candidates: String,
    /// 图片生成模型名称
    pub image_model_name: String,
    /// 正文生成温度
    pub generation_temperature: f32,
    /// 练习题重写温度（更低，更确定性）
    pub rewrite_temperature: f32,
    /// 是否在生成正文后调用图片生成
    pub generate_images: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 生成结果输出文件
    pub output_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "http://menshen.xdf.cn/v1".to_string(),
            llm_model_candidates:
                "gemini-3.0-pro-preview,gemini-2.5-pro,gemini-2.5-flash".to_string(),
            image_model_name: "gemini-2.5-flash-image".to_string(),
            generation_temperature: 0.7,
            rewrite_temperature: 0.2,
            generate_images: false,
            verbose_logging: false,
            output_file: "lesson_plan.md".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_candidates: std::env::var("LLM_MODEL_CANDIDATES").unwrap_or(default.llm_model_candidates),
            image_model_name: std::env::var("IMAGE_MODEL_NAME").unwrap_or(default.image_model_name),
            generation_temperature: std::env::var("GENERATION_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.generation_temperature),
            rewrite_temperature: std::env::var("REWRITE_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.rewrite_temperature),
            generate_images: std::env::var("GENERATE_IMAGES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.generate_images),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_file: std::env::var("OUTPUT_FILE").unwrap_or(default.output_file),
        }
    }

    /// 校验配置
    ///
    /// API 密钥缺失属于致命配置错误，立即返回，不做任何重试
    pub fn validate(&self) -> AppResult<()> {
        if self.llm_api_key.trim().is_empty() {
            return Err(AppError::Config(ConfigError::EnvVarNotFound {
                var_name: "LLM_API_KEY".to_string(),
            }));
        }
        Ok(())
    }

    /// 解析模型候选列表（去重，保持顺序）
    pub fn model_candidates(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.llm_model_candidates
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.to_string()))
            .map(|s| s.to_string())
            .collect()
    }
}
