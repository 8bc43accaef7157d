//! 图片生成服务 - 业务能力层
//!
//! 只负责"根据提示词生成一张插图"能力
//!
//! 与练习题重写不同，这一步没有静默兜底：
//! 响应里没有内联图片数据就是硬失败，由调用方决定是否仍返回纯文本计划

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::images::{CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat, ImageSize},
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, ImageError};

/// 所有插图提示词统一追加的风格后缀
pub const STYLE_SUFFIX: &str =
    "beautiful, illustrative, educational style, vibrant colors, suitable for a K-12 classroom";

/// 图片生成服务
pub struct ImageService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl ImageService {
    /// 创建新的图片生成服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.image_model_name.clone(),
        }
    }

    /// 生成插图
    ///
    /// # 参数
    /// - `prompt`: 插图描述（通常来自归一化器提取的 IMAGE_PROMPT）
    ///
    /// # 返回
    /// 返回 `data:image/png;base64,...` 形式的数据 URI
    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        let full_prompt = build_image_prompt(prompt);
        debug!("调用图片 API，模型: {}", self.model_name);
        debug!("插图提示词: {}", full_prompt);

        // 16:9 横版，固定分辨率档位
        let request = CreateImageRequestArgs::default()
            .model(ImageModel::Other(self.model_name.clone()))
            .prompt(&full_prompt)
            .n(1)
            .size(ImageSize::S1792x1024)
            .response_format(ImageResponseFormat::B64Json)
            .build()?;

        let response = self.client.images().generate(request).await.map_err(|e| {
            warn!("图片 API 调用失败 (模型: {}): {}", self.model_name, e);
            AppError::image_api_failed(&self.model_name, e)
        })?;

        // 取第一个内联图片负载；没有内联数据就是硬失败
        let image = response.data.first().ok_or_else(|| {
            AppError::Image(ImageError::NoInlineData {
                model: self.model_name.clone(),
            })
        })?;

        match image.as_ref() {
            Image::B64Json { b64_json, .. } => {
                debug!("图片 API 调用成功 (模型: {})", self.model_name);
                Ok(format!("data:image/png;base64,{}", b64_json))
            }
            _ => Err(AppError::Image(ImageError::NoInlineData {
                model: self.model_name.clone(),
            })
            .into()),
        }
    }
}

/// 拼装完整插图提示词（追加固定风格后缀）
fn build_image_prompt(prompt: &str) -> String {
    format!("{}, {}", prompt.trim(), STYLE_SUFFIX)
}
