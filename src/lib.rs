//! # Generate Lesson Plan
//!
//! 一个用于 AI 辅助生成 K-12 差异化课程计划的 Rust 核心库
//!
//! ## 架构设计
//!
//! 本系统采用严格的三层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 请求范围内的临时值对象
//! - `PlanLength` - 计划时长与天数的唯一映射表
//! - `LessonPlanParameters` / `GeneratedLessonResult` / `CalendarEvent`
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，互不感知流程顺序
//! - `PromptBuilder` - 参数渲染成提示词（纯函数）
//! - `LlmService` + `generate_with_fallback` - 候选模型回退调用
//! - `WorksheetService` - 练习题占位短语检测与定向重写
//! - `OutputNormalizer` - 标签提取、表格压平、空行折叠（幂等）
//! - `ImageService` - 插图生成（base64 数据 URI）
//! - `calendar_service` - 工作日日历展开（纯函数）
//! - `RateLimiter` - 显式注入的按键限流计数器
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次生成请求"的完整处理流程
//! - `LessonPlanFlow` - 流程编排（提示词 → 生成 → 重写 → 归一化）
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    CalendarEvent, GeneratedLessonResult, LessonPlanParameters, PlanLength, Slide,
};
pub use services::{
    ImageService, LlmService, ModelInvoker, OutputNormalizer, PromptBuilder, RateLimiter,
    WorksheetService,
};
pub use workflow::LessonPlanFlow;
