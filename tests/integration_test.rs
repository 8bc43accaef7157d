//! 端到端集成测试
//!
//! 用桩模型驱动完整流程：提示词 → 生成 → 练习题重写 → 归一化，
//! 不触发任何网络调用

use std::sync::Mutex;

use generate_lesson_plan::{LessonPlanFlow, LessonPlanParameters, ModelInvoker};

/// 桩模型：第一次调用返回完整文档，第二次返回重写结果，并记录每次的提示词
struct ScriptedInvoker {
    prompts: Mutex<Vec<String>>,
    responses: Vec<String>,
}

impl ScriptedInvoker {
    fn new(responses: Vec<&str>) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            responses: responses.into_iter().map(str::to_string).collect(),
        }
    }

    fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

impl ModelInvoker for ScriptedInvoker {
    async fn invoke(&self, _model: &str, prompt: &str, _temperature: f32) -> anyhow::Result<String> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        let index = prompts.len() - 1;
        self.responses
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("桩模型没有第 {} 次响应", index + 1))
    }
}

/// 桩模型返回的"一周计划"文档：
/// 5 个 Day 标题、1 个含占位短语的练习题块、1 个规范的 SLIDE 块
const GENERATED_DOC: &str = "\
# Plants and Their Parts

## Core Lesson Details
Grade: 3rd Grade, Subject: Science, Duration: 45 minutes

## Learning Objectives
Students will identify the parts of a plant.

## Materials Needed
Paper, pencils.

## Day 1: What Is a Plant?
Warm-up and instruction.

## Day 2: Roots and Stems
Guided practice.

## Day 3: Leaves
Independent practice.

## Day 4: Flowers
Review games.

## Day 5: Plant Parts Review
Assessment.

## Optional Generated Add-ons

### Worksheet: Multiple Choice
#### Student Copy
Name: ________________  Date: ________________
Standard Alignment: 3-LS1-1
Directions: Circle the best answer.
Total Points: 10
1. Look at the (picture of a plant) and name the part that makes food.
A. Root
B. Leaf
C. Stem
D. Flower
#### Answer Key
1. B
#### Differentiation Note
Read questions aloud for emerging readers.

## Presentation Slides
<SLIDE>Title: Photosynthesis
Bullet: Sunlight
Bullet: Chlorophyll
</SLIDE>

<IMAGE_PROMPT>a colorful garden with labeled plant parts</IMAGE_PROMPT>
<LESSON_OVERVIEW>Students explore the parts of a plant over one week.</LESSON_OVERVIEW>
";

/// 重写响应：0 号块去掉占位短语后原位返回
const REWRITE_RESPONSE: &str = "\
<WORKSHEET_BLOCK index=\"0\">
### Worksheet: Multiple Choice
#### Student Copy
Name: ________________  Date: ________________
Standard Alignment: 3-LS1-1
Directions: Circle the best answer.
Total Points: 10
1. Which part of a plant makes food?
A. Root
B. Leaf
C. Stem
D. Flower
#### Answer Key
1. B
#### Differentiation Note
Read questions aloud for emerging readers.
</WORKSHEET_BLOCK>
";

fn one_week_params() -> LessonPlanParameters {
    LessonPlanParameters {
        plan_length: "One Week".to_string(),
        grade_level: "3rd Grade".to_string(),
        subject: "Science".to_string(),
        duration_minutes: "45".to_string(),
        english_proficiency_levels: vec![],
        academic_levels: vec![],
        auto_generate_objectives: true,
        manual_objectives: String::new(),
        worksheet_types: vec!["Multiple Choice".to_string()],
        include_slides: true,
        roster_summary: None,
    }
}

#[tokio::test]
async fn test_end_to_end_one_week_plan() {
    let invoker = ScriptedInvoker::new(vec![GENERATED_DOC, REWRITE_RESPONSE]);
    let flow = LessonPlanFlow::with_invoker(&invoker, vec!["stub-model".to_string()]);

    let result = flow.generate_plan(&one_week_params()).await.unwrap();

    // (a) 检测到占位短语，恰好发起一次重写调用（共 2 次模型调用）
    assert_eq!(invoker.call_count(), 2);
    let rewrite_prompt = invoker.prompt(1);
    assert!(rewrite_prompt.contains("<WORKSHEET_BLOCK index=\"0\">"));

    // (b) 恰好提取到 1 张幻灯片
    assert_eq!(result.slides.len(), 1);
    assert_eq!(result.slides[0].title, "Photosynthesis");
    assert_eq!(result.slides[0].bullets, vec!["Sunlight", "Chlorophyll"]);

    // (c) 正文中不再残留任何控制标签
    assert!(!result.text.contains("<SLIDE>"));
    assert!(!result.text.contains("<IMAGE_PROMPT>"));
    assert!(!result.text.contains("<LESSON_OVERVIEW>"));

    // 附带的结构化数据齐全
    assert_eq!(
        result.image_prompt.as_deref(),
        Some("a colorful garden with labeled plant parts")
    );
    assert_eq!(
        result.lesson_overview.as_deref(),
        Some("Students explore the parts of a plant over one week.")
    );

    // (d) 5 个 Day 标题逐字保留
    for heading in [
        "## Day 1: What Is a Plant?",
        "## Day 2: Roots and Stems",
        "## Day 3: Leaves",
        "## Day 4: Flowers",
        "## Day 5: Plant Parts Review",
    ] {
        assert!(result.text.contains(heading), "缺少标题: {}", heading);
    }

    // 占位短语被重写掉，练习题结构保留
    assert!(!result.text.contains("(picture of a plant)"));
    assert!(result.text.contains("Which part of a plant makes food?"));
    assert!(result.text.contains("#### Answer Key"));
}

#[tokio::test]
async fn test_no_rewrite_when_worksheets_not_requested() {
    // 文档中虽然有占位短语，但未请求练习题，不应触发重写
    let invoker = ScriptedInvoker::new(vec![GENERATED_DOC]);
    let flow = LessonPlanFlow::with_invoker(&invoker, vec!["stub-model".to_string()]);

    let params = LessonPlanParameters {
        worksheet_types: vec![],
        ..one_week_params()
    };
    let result = flow.generate_plan(&params).await.unwrap();

    assert_eq!(invoker.call_count(), 1);
    // 原占位短语保留（未做修复）
    assert!(result.text.contains("(picture of a plant)"));
}

#[tokio::test]
async fn test_rewrite_failure_keeps_original_worksheet() {
    // 第二次调用（重写）没有脚本响应，视为失败：保留原文，整体仍成功
    let invoker = ScriptedInvoker::new(vec![GENERATED_DOC]);
    let flow = LessonPlanFlow::with_invoker(&invoker, vec!["stub-model".to_string()]);

    let result = flow.generate_plan(&one_week_params()).await.unwrap();

    assert_eq!(invoker.call_count(), 2);
    assert!(result.text.contains("(picture of a plant)"));
    assert_eq!(result.slides.len(), 1);
}
