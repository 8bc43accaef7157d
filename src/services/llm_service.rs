//! LLM 生成服务 - 业务能力层
//!
//! 只负责"调用文本生成模型"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）
//!
//! ## 模型回退
//! 正文生成和练习题重写共用同一个回退例程 `generate_with_fallback`：
//! 按候选顺序调用，仅在错误被归类为"模型不可用"且还有后续候选时才继续，
//! 其余错误（配额、参数非法、最后一个候选失败）立即向上抛出

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, LlmError};

/// 文本生成调用接口
///
/// 单次 (模型, 提示词, 温度) 调用的缝隙，
/// 集成测试通过桩实现注入固定响应，不触发任何网络
#[allow(async_fn_in_trait)]
pub trait ModelInvoker {
    /// 调用指定模型生成一次文本
    async fn invoke(&self, model: &str, prompt: &str, temperature: f32) -> Result<String>;
}

// 引用也实现调用接口，流程可以只借用服务（测试里借用桩实现做断言）
impl<T: ModelInvoker> ModelInvoker for &T {
    async fn invoke(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        (**self).invoke(model, prompt, temperature).await
    }
}

/// LLM 生成服务
///
/// 职责：
/// - 封装 async-openai 客户端
/// - 只处理单次调用，候选回退由 `generate_with_fallback` 负责
/// - 不关心流程顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
}

impl LlmService {
    /// 创建新的 LLM 生成服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self { client }
    }
}

impl ModelInvoker for LlmService {
    async fn invoke(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        debug!("调用 LLM API，模型: {}, 温度: {}", model, temperature);
        debug!("提示词长度: {} 字符", prompt.len());

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(temperature)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败 (模型: {}): {}", model, e);
            AppError::llm_api_failed(model, e)
        })?;

        debug!("LLM API 调用成功 (模型: {})", model);

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::Llm(LlmError::EmptyContent {
                    model: model.to_string(),
                })
            })?;

        Ok(content.trim().to_string())
    }
}

/// 构建候选模型顺序
///
/// 首选模型（如果给定）放在最前，之后是配置的候选列表；
/// 去重并保持顺序
pub fn candidate_order(candidates: &[String], preferred: Option<&str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ordered = Vec::new();

    for model in preferred
        .into_iter()
        .map(str::to_string)
        .chain(candidates.iter().cloned())
    {
        let trimmed = model.trim().to_string();
        if !trimmed.is_empty() && seen.insert(trimmed.clone()) {
            ordered.push(trimmed);
        }
    }

    ordered
}

/// 判断错误消息是否属于"模型不可用"类错误
///
/// 命中关键字说明换一个候选模型可能成功；
/// 配额、参数非法等错误不在此列，不应换模型重试
pub fn is_model_unavailable(message: &str) -> bool {
    const KEYWORDS: [&str; 7] = [
        "model",
        "not found",
        "unsupported",
        "permission",
        "access denied",
        "403",
        "404",
    ];
    let lower = message.to_lowercase();
    KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// 按候选顺序调用模型，直到某个候选成功
///
/// # 保证
/// - 要么返回恰好一个成功响应，要么返回最后遇到的错误
/// - 不会合并多个模型的部分结果
/// - 非"模型不可用"类错误立即抛出，即使还有候选
pub async fn generate_with_fallback<M: ModelInvoker>(
    invoker: &M,
    candidates: &[String],
    prompt: &str,
    temperature: f32,
) -> Result<String> {
    if candidates.is_empty() {
        return Err(AppError::Llm(LlmError::NoCandidates).into());
    }

    for (index, model) in candidates.iter().enumerate() {
        match invoker.invoke(model, prompt, temperature).await {
            Ok(text) => {
                debug!("模型 {} 调用成功", model);
                return Ok(text);
            }
            Err(e) => {
                let has_next = index + 1 < candidates.len();
                // {:#} 带上整条错误链，分类时一并检查
                let message = format!("{:#}", e);
                if has_next && is_model_unavailable(&message) {
                    warn!("模型 {} 不可用，切换下一个候选: {}", model, message);
                    continue;
                }
                return Err(e);
            }
        }
    }

    // 理论上不可达：最后一个候选的失败会在循环内抛出
    Err(AppError::Llm(LlmError::AllCandidatesFailed {
        attempted: candidates.len(),
    })
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 测试桩：按模型名返回预设结果并记录调用顺序
    struct StubInvoker {
        calls: Mutex<Vec<String>>,
        outcomes: Vec<(String, std::result::Result<String, String>)>,
    }

    impl StubInvoker {
        fn new(outcomes: Vec<(&str, std::result::Result<&str, &str>)>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                outcomes: outcomes
                    .into_iter()
                    .map(|(m, r)| {
                        (
                            m.to_string(),
                            r.map(str::to_string).map_err(str::to_string),
                        )
                    })
                    .collect(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ModelInvoker for StubInvoker {
        async fn invoke(&self, model: &str, _prompt: &str, _temperature: f32) -> Result<String> {
            self.calls.lock().unwrap().push(model.to_string());
            let outcome = self
                .outcomes
                .iter()
                .find(|(m, _)| m == model)
                .map(|(_, r)| r.clone())
                .unwrap_or_else(|| Err("unknown stub model".to_string()));
            outcome.map_err(|msg| anyhow::anyhow!(msg))
        }
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_model_unavailable_keywords() {
        assert!(is_model_unavailable("404 Not Found"));
        assert!(is_model_unavailable("The MODEL is deprecated"));
        assert!(is_model_unavailable("unsupported endpoint"));
        assert!(is_model_unavailable("Access Denied"));
        assert!(is_model_unavailable("permission error"));
        assert!(is_model_unavailable("HTTP 403"));

        assert!(!is_model_unavailable("quota exceeded"));
        assert!(!is_model_unavailable("invalid request body"));
        assert!(!is_model_unavailable("timeout"));
    }

    #[test]
    fn test_candidate_order_preferred_first_and_dedup() {
        let configured = models(&["a", "b", "c"]);
        assert_eq!(candidate_order(&configured, None), models(&["a", "b", "c"]));
        assert_eq!(
            candidate_order(&configured, Some("b")),
            models(&["b", "a", "c"])
        );
        assert_eq!(
            candidate_order(&configured, Some("x")),
            models(&["x", "a", "b", "c"])
        );
    }

    #[tokio::test]
    async fn test_fallback_advances_on_model_unavailable() {
        let stub = StubInvoker::new(vec![
            ("A", Err("404 model not found")),
            ("B", Ok("response from B")),
            ("C", Ok("response from C")),
        ]);
        let candidates = models(&["A", "B", "C"]);

        let result = generate_with_fallback(&stub, &candidates, "prompt", 0.7)
            .await
            .unwrap();

        assert_eq!(result, "response from B");
        // C 不应被调用
        assert_eq!(stub.calls(), models(&["A", "B"]));
    }

    #[tokio::test]
    async fn test_fallback_propagates_non_retryable_error_immediately() {
        let stub = StubInvoker::new(vec![
            ("A", Err("quota exceeded for project")),
            ("B", Ok("response from B")),
        ]);
        let candidates = models(&["A", "B"]);

        let result = generate_with_fallback(&stub, &candidates, "prompt", 0.7).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("quota"));
        assert_eq!(stub.calls(), models(&["A"]));
    }

    #[tokio::test]
    async fn test_fallback_last_candidate_error_propagates() {
        let stub = StubInvoker::new(vec![
            ("A", Err("404 not found")),
            ("B", Err("model unsupported")),
        ]);
        let candidates = models(&["A", "B"]);

        let result = generate_with_fallback(&stub, &candidates, "prompt", 0.7).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unsupported"));
        assert_eq!(stub.calls(), models(&["A", "B"]));
    }

    #[tokio::test]
    async fn test_fallback_empty_candidate_list() {
        let stub = StubInvoker::new(vec![]);
        let result = generate_with_fallback(&stub, &[], "prompt", 0.7).await;
        assert!(result.is_err());
        assert!(stub.calls().is_empty());
    }
}
