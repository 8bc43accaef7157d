//! 课程计划生成流程 - 流程层
//!
//! 核心职责：定义"一次生成请求"的完整处理流程
//!
//! 流程顺序：
//! 1. 构建提示词 → 候选模型回退生成
//! 2. 练习题占位短语扫描 →（条件触发）一次定向重写往返
//! 3. 输出归一化 → 返回结果
//!
//! 图片生成不在本流程内：调用方拿到 image_prompt 后自行决定是否调用
//! `ImageService`（图片失败不应影响文本计划的返回）

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{GeneratedLessonResult, LessonPlanParameters};
use crate::services::llm_service::{candidate_order, generate_with_fallback, ModelInvoker};
use crate::services::{LlmService, OutputNormalizer, PromptBuilder, WorksheetService};
use crate::utils::logging::truncate_text;

/// 课程计划生成流程
///
/// - 编排完整的生成流程
/// - 决定何时生成、何时重写、何时归一化
/// - 只依赖业务能力（services）
/// - 对调用接口泛型化，测试注入桩实现
pub struct LessonPlanFlow<M: ModelInvoker> {
    invoker: M,
    candidates: Vec<String>,
    prompt_builder: PromptBuilder,
    worksheet_service: WorksheetService,
    normalizer: OutputNormalizer,
    generation_temperature: f32,
    rewrite_temperature: f32,
    verbose_logging: bool,
}

impl LessonPlanFlow<LlmService> {
    /// 创建新的生成流程（真实 LLM 服务）
    pub fn new(config: &Config) -> Self {
        Self {
            invoker: LlmService::new(config),
            candidates: config.model_candidates(),
            prompt_builder: PromptBuilder::new(),
            worksheet_service: WorksheetService::new(),
            normalizer: OutputNormalizer::new(),
            generation_temperature: config.generation_temperature,
            rewrite_temperature: config.rewrite_temperature,
            verbose_logging: config.verbose_logging,
        }
    }
}

impl<M: ModelInvoker> LessonPlanFlow<M> {
    /// 用自定义调用实现创建流程（测试用）
    pub fn with_invoker(invoker: M, candidates: Vec<String>) -> Self {
        Self {
            invoker,
            candidates,
            prompt_builder: PromptBuilder::new(),
            worksheet_service: WorksheetService::new(),
            normalizer: OutputNormalizer::new(),
            generation_temperature: 0.7,
            rewrite_temperature: 0.2,
            verbose_logging: false,
        }
    }

    /// 生成一份课程计划
    pub async fn generate_plan(
        &self,
        params: &LessonPlanParameters,
    ) -> Result<GeneratedLessonResult> {
        self.generate_plan_with_model(params, None).await
    }

    /// 生成一份课程计划（可指定首选模型）
    pub async fn generate_plan_with_model(
        &self,
        params: &LessonPlanParameters,
        preferred_model: Option<&str>,
    ) -> Result<GeneratedLessonResult> {
        let candidates = candidate_order(&self.candidates, preferred_model);

        info!(
            "开始生成课程计划: {} / {} / {} ({} 天)",
            params.grade_level,
            params.subject,
            params.plan_length,
            params.day_count()
        );

        // 1. 构建提示词
        let prompt = self.prompt_builder.build(params);
        if self.verbose_logging {
            debug!("提示词预览: {}", truncate_text(&prompt, 200));
        }

        // 2. 候选回退生成
        let raw = generate_with_fallback(
            &self.invoker,
            &candidates,
            &prompt,
            self.generation_temperature,
        )
        .await?;
        info!("✓ 正文生成完成，长度 {} 字符", raw.len());

        // 3. 练习题修复（只在请求了练习题时扫描；重写失败保留原文）
        let text = if params.worksheet_types.is_empty() {
            raw
        } else {
            self.worksheet_service
                .repair_worksheets(&self.invoker, &candidates, &raw, self.rewrite_temperature)
                .await
        };

        // 4. 归一化
        let result = self.normalizer.normalize(&text)?;

        info!(
            "✓ 归一化完成: 幻灯片 {} 张, 插图提示词: {}, 课程概述: {}",
            result.slides.len(),
            if result.image_prompt.is_some() { "有" } else { "无" },
            if result.lesson_overview.is_some() { "有" } else { "无" },
        );

        Ok(result)
    }
}
