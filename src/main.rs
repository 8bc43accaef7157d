use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use generate_lesson_plan::models::load_params_from_toml;
use generate_lesson_plan::services::calendar_service;
use generate_lesson_plan::utils::logging;
use generate_lesson_plan::{AppError, Config, ImageService, LessonPlanFlow};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();
    config.validate()?;
    logging::log_startup(&config.model_candidates());

    // 参数文件路径来自命令行
    let params_path = std::env::args()
        .nth(1)
        .context("用法: generate_lesson_plan <参数文件.toml>")?;
    let params = load_params_from_toml(Path::new(&params_path)).await?;

    // 生成课程计划
    let flow = LessonPlanFlow::new(&config);
    let result = flow.generate_plan(&params).await?;

    // 写出归一化后的正文
    tokio::fs::write(&config.output_file, &result.text)
        .await
        .map_err(|e| AppError::file_write_failed(&config.output_file, e))?;
    info!("✅ 课程计划已写入: {}", config.output_file);

    // 输出结构化摘要（幻灯片、概述、插图提示词）
    let summary = serde_json::json!({
        "lesson_overview": result.lesson_overview,
        "image_prompt": result.image_prompt,
        "slides": result.slides,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    // 展开工作日排期，供日历渲染参考
    let plan_title = format!("{} ({})", params.subject, params.plan_length);
    let schedule = calendar_service::layout_plan(
        "local-run",
        &plan_title,
        &params.subject,
        calendar_service::today_local(),
        &params.plan_length,
    );
    info!("📅 排期共 {} 个上课日", schedule.len());
    for event in &schedule {
        info!("  第 {}/{} 天: {}", event.day_index, event.total_days, event.date);
    }

    // 按需生成插图
    if config.generate_images {
        match &result.image_prompt {
            Some(prompt) => {
                let image_service = ImageService::new(&config);
                let data_uri = image_service.generate_image(prompt).await?;
                let image_file = format!("{}.image.txt", config.output_file);
                tokio::fs::write(&image_file, &data_uri)
                    .await
                    .map_err(|e| AppError::file_write_failed(&image_file, e))?;
                info!("✅ 插图数据 URI 已写入: {}", image_file);
            }
            None => {
                warn!("⚠️ 未从生成结果中提取到插图提示词，跳过图片生成");
            }
        }
    }

    Ok(())
}
