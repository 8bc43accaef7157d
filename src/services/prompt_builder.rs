//! 提示词构建服务 - 业务能力层
//!
//! 把结构化的课程计划参数渲染成完整的生成提示词
//!
//! 纯函数，无任何 I/O：同样的参数永远产出同样的提示词。
//! 提示词里的标题文本（"## Day X:"、"### Worksheet:" 等）是与
//! 后处理环节的契约，改动措辞前先确认提取正则

use crate::models::LessonPlanParameters;

/// 提示词构建服务
///
/// 职责：
/// - 渲染班级上下文、教学目标、文档结构模板
/// - 按请求追加练习题、幻灯片、控制标签指令
/// - 单日计划和多日单元计划用不同的结构模板
pub struct PromptBuilder;

impl PromptBuilder {
    /// 创建新的提示词构建服务
    pub fn new() -> Self {
        Self
    }

    /// 构建完整生成提示词
    pub fn build(&self, params: &LessonPlanParameters) -> String {
        let day_count = params.day_count();

        let mut prompt = String::from(
            "You are an experienced K-12 curriculum designer. Create a complete, \
             classroom-ready lesson plan in Markdown for the class described below.\n\n",
        );

        prompt.push_str(&self.context_section(params));
        prompt.push_str(&self.objectives_section(params));

        if day_count <= 1 {
            prompt.push_str(&self.single_day_structure_section());
        } else {
            prompt.push_str(&self.unit_structure_section(day_count));
        }

        if !params.worksheet_types.is_empty() {
            prompt.push_str(&self.worksheet_section(&params.worksheet_types));
        }

        if params.include_slides {
            prompt.push_str(&self.slide_section());
        }

        prompt.push_str(&self.control_tag_section());

        prompt
    }

    /// 班级上下文小节
    fn context_section(&self, params: &LessonPlanParameters) -> String {
        let mut section = String::from("## Class Context\n");
        section.push_str(&format!(
            "- Grade Level: {}\n",
            not_specified(&params.grade_level)
        ));
        section.push_str(&format!("- Subject: {}\n", not_specified(&params.subject)));
        section.push_str(&format!(
            "- Plan Length: {} ({} school day{})\n",
            not_specified(&params.plan_length),
            params.day_count(),
            if params.day_count() == 1 { "" } else { "s" }
        ));
        section.push_str(&format!(
            "- Class Duration: {} minutes\n",
            not_specified(&params.duration_minutes)
        ));
        section.push_str(&format!(
            "- English Proficiency Levels: {}\n",
            list_or_not_specified(&params.english_proficiency_levels)
        ));
        section.push_str(&format!(
            "- Academic Levels: {}\n",
            list_or_not_specified(&params.academic_levels)
        ));
        if let Some(roster) = params.roster_summary.as_deref().filter(|r| !r.trim().is_empty()) {
            section.push_str(&format!("- Roster Summary: {}\n", roster.trim()));
        }
        section.push('\n');
        section
    }

    /// 教学目标小节
    ///
    /// 自动生成时让模型自己写目标；否则逐字引用教师手填的目标
    fn objectives_section(&self, params: &LessonPlanParameters) -> String {
        if params.auto_generate_objectives {
            String::from(
                "## Learning Objectives\n\
                 Write 2-4 measurable, standards-aligned learning objectives appropriate \
                 for this grade level and subject.\n\n",
            )
        } else {
            format!(
                "## Learning Objectives\n\
                 Use exactly these teacher-provided objectives, verbatim:\n{}\n\n",
                params.manual_objectives.trim()
            )
        }
    }

    /// 单日计划的文档结构模板
    fn single_day_structure_section(&self) -> String {
        String::from(
            "## Required Document Structure\n\
             Produce the lesson plan with exactly this Markdown skeleton:\n\n\
             # <Lesson Title>\n\
             ## Core Lesson Details\n\
             ## Learning Objectives\n\
             ## Materials Needed\n\
             ## Lesson Flow\n\
             ### Warm-Up\n\
             ### Direct Instruction\n\
             ### Guided Practice\n\
             ### Independent Practice\n\
             ### Closure\n\
             ## Differentiation Strategies\n\
             ## Assessment\n\
             ## Optional Generated Add-ons\n\n\
             Fill in every section with concrete, actionable content. Do not use \
             Markdown tables or horizontal rules anywhere in the document.\n\n",
        )
    }

    /// 多日单元计划的文档结构模板
    fn unit_structure_section(&self, day_count: u32) -> String {
        format!(
            "## Required Document Structure\n\
             This is a multi-day unit spanning exactly {day_count} school days. \
             Produce the plan with exactly this Markdown skeleton:\n\n\
             # <Unit Title>\n\
             ## Core Lesson Details\n\
             ## Learning Objectives\n\
             ## Materials Needed\n\
             <one section per day>\n\
             ## Differentiation Strategies\n\
             ## Assessment\n\
             ## Optional Generated Add-ons\n\n\
             Produce exactly {day_count} daily sections, one per school day, each with a \
             heading of the form \"## Day X: <Topic>\" (X from 1 to {day_count}). Each \
             daily section must contain its own warm-up, instruction, practice, and \
             closure activities. Do not use Markdown tables or horizontal rules anywhere \
             in the document.\n\n"
        )
    }

    /// 练习题小节
    ///
    /// 每种请求的类型一个块，结构逐字固定（后处理按这些标题提取）
    fn worksheet_section(&self, worksheet_types: &[String]) -> String {
        let mut section = String::from(
            "## Worksheets\n\
             Inside \"## Optional Generated Add-ons\", generate one worksheet per \
             requested type. Every worksheet must be printable as plain text: never \
             reference, describe, or leave space for any picture, image, photo, diagram, \
             or chart.\n\n\
             Each worksheet must follow exactly this structure:\n\n\
             ### Worksheet: <Type>\n\
             #### Student Copy\n\
             Name: ________________  Date: ________________\n\
             Standard Alignment: <standard code>\n\
             Directions: <student-facing directions>\n\
             Total Points: <number>\n\
             <the exercise items>\n\
             #### Answer Key\n\
             <complete answers>\n\
             #### Differentiation Note\n\
             <one support note for emerging learners>\n\n\
             Requested worksheet types:\n",
        );

        for ws_type in worksheet_types {
            section.push_str(&format!("- {}: {}\n", ws_type, worksheet_guidance(ws_type)));
        }
        section.push('\n');
        section
    }

    /// 幻灯片小节
    fn slide_section(&self) -> String {
        String::from(
            "## Presentation Slides\n\
             After the main plan, output 6-8 presentation slide outlines. Each slide \
             must be wrapped in its own tag pair, in exactly this line format:\n\n\
             <SLIDE>\n\
             Title: <slide title>\n\
             Bullet: <first bullet>\n\
             Bullet: <second bullet>\n\
             </SLIDE>\n\n\
             Use 2-4 bullets per slide. Do not put any other text inside the tags.\n\n",
        )
    }

    /// 控制标签小节
    ///
    /// IMAGE_PROMPT / LESSON_OVERVIEW 由归一化器提取后从正文剥离
    fn control_tag_section(&self) -> String {
        String::from(
            "## Control Tags\n\
             At the very end of your output, append exactly one of each tag pair:\n\n\
             <IMAGE_PROMPT>a one-sentence description of a single cover illustration \
             for this lesson</IMAGE_PROMPT>\n\
             <LESSON_OVERVIEW>a 1-2 sentence plain-language summary of the whole \
             plan</LESSON_OVERVIEW>\n",
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 按练习题类型返回出题指引
///
/// 六种已知类型小写匹配，未知类型给通用指引
pub fn worksheet_guidance(ws_type: &str) -> &'static str {
    match ws_type.trim().to_lowercase().as_str() {
        "matching" => {
            "two columns of 6-10 items; answers pair each left item with a right item"
        }
        "fill in the blank" => {
            "8-12 sentences each missing one key term; provide a word bank above the items"
        }
        "multiple choice" => {
            "6-10 questions with exactly four options labeled A-D and one correct answer each"
        }
        "short answer" => {
            "4-6 open questions answerable in 1-3 written sentences; include sample answers"
        }
        "true/false" => {
            "8-12 statements; for each false statement the answer key explains the correction"
        }
        "sorting/categorizing" => {
            "2-4 labeled categories and 8-12 items to sort; list the correct category per item"
        }
        _ => "an age-appropriate set of 6-10 exercise items with a complete answer key",
    }
}

/// 空白字段的展示兜底
fn not_specified(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "Not specified"
    } else {
        trimmed
    }
}

/// 列表字段的展示兜底
fn list_or_not_specified(values: &[String]) -> String {
    let items: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if items.is_empty() {
        "Not specified".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params() -> LessonPlanParameters {
        LessonPlanParameters {
            plan_length: "Single Lesson".to_string(),
            grade_level: "3rd Grade".to_string(),
            subject: "Science".to_string(),
            duration_minutes: "45".to_string(),
            english_proficiency_levels: vec!["Intermediate".to_string()],
            academic_levels: vec![],
            auto_generate_objectives: true,
            manual_objectives: String::new(),
            worksheet_types: vec![],
            include_slides: false,
            roster_summary: None,
        }
    }

    #[test]
    fn test_single_day_uses_lesson_skeleton() {
        let prompt = PromptBuilder::new().build(&base_params());

        assert!(prompt.contains("# <Lesson Title>"));
        assert!(prompt.contains("### Warm-Up"));
        assert!(!prompt.contains("## Day X:"));
    }

    #[test]
    fn test_multi_day_uses_unit_skeleton_with_exact_day_count() {
        let params = LessonPlanParameters {
            plan_length: "Two Weeks".to_string(),
            ..base_params()
        };
        let prompt = PromptBuilder::new().build(&params);

        assert!(prompt.contains("# <Unit Title>"));
        assert!(prompt.contains("exactly 10 school days"));
        assert!(prompt.contains("Produce exactly 10 daily sections"));
        assert!(prompt.contains("\"## Day X: <Topic>\""));
        assert!(!prompt.contains("# <Lesson Title>"));
    }

    #[test]
    fn test_unknown_plan_length_falls_back_to_single_day() {
        let params = LessonPlanParameters {
            plan_length: "Forever".to_string(),
            ..base_params()
        };
        let prompt = PromptBuilder::new().build(&params);
        assert!(prompt.contains("# <Lesson Title>"));
    }

    #[test]
    fn test_context_section_renders_fields_and_fallbacks() {
        let params = LessonPlanParameters {
            duration_minutes: String::new(),
            academic_levels: vec![],
            ..base_params()
        };
        let prompt = PromptBuilder::new().build(&params);

        assert!(prompt.contains("- Grade Level: 3rd Grade"));
        assert!(prompt.contains("- Subject: Science"));
        assert!(prompt.contains("- Class Duration: Not specified minutes"));
        assert!(prompt.contains("- Academic Levels: Not specified"));
        assert!(prompt.contains("- English Proficiency Levels: Intermediate"));
    }

    #[test]
    fn test_roster_summary_included_only_when_present() {
        let without = PromptBuilder::new().build(&base_params());
        assert!(!without.contains("Roster Summary"));

        let params = LessonPlanParameters {
            roster_summary: Some("18 students, 3 with IEPs".to_string()),
            ..base_params()
        };
        let with = PromptBuilder::new().build(&params);
        assert!(with.contains("- Roster Summary: 18 students, 3 with IEPs"));
    }

    #[test]
    fn test_manual_objectives_quoted_verbatim() {
        let params = LessonPlanParameters {
            auto_generate_objectives: false,
            manual_objectives: "Students will label plant parts.".to_string(),
            ..base_params()
        };
        let prompt = PromptBuilder::new().build(&params);

        assert!(prompt.contains("Use exactly these teacher-provided objectives"));
        assert!(prompt.contains("Students will label plant parts."));
        assert!(!prompt.contains("Write 2-4 measurable"));
    }

    #[test]
    fn test_worksheet_section_present_only_when_requested() {
        let without = PromptBuilder::new().build(&base_params());
        assert!(!without.contains("### Worksheet: <Type>"));

        let params = LessonPlanParameters {
            worksheet_types: vec!["Matching".to_string(), "True/False".to_string()],
            ..base_params()
        };
        let with = PromptBuilder::new().build(&params);

        assert!(with.contains("### Worksheet: <Type>"));
        assert!(with.contains("#### Student Copy"));
        assert!(with.contains("#### Answer Key"));
        assert!(with.contains("#### Differentiation Note"));
        assert!(with.contains("- Matching: two columns"));
        assert!(with.contains("- True/False: 8-12 statements"));
    }

    #[test]
    fn test_worksheet_guidance_known_types_and_fallback() {
        assert!(worksheet_guidance("Multiple Choice").contains("four options"));
        assert!(worksheet_guidance("fill in the blank").contains("word bank"));
        assert!(worksheet_guidance("Short Answer").contains("1-3 written sentences"));
        assert!(worksheet_guidance("Sorting/Categorizing").contains("categories"));
        // 未知类型走通用指引
        assert!(worksheet_guidance("Crossword").contains("age-appropriate"));
    }

    #[test]
    fn test_slide_section_present_only_when_requested() {
        let without = PromptBuilder::new().build(&base_params());
        assert!(!without.contains("<SLIDE>"));

        let params = LessonPlanParameters {
            include_slides: true,
            ..base_params()
        };
        let with = PromptBuilder::new().build(&params);
        assert!(with.contains("6-8 presentation slide outlines"));
        assert!(with.contains("<SLIDE>"));
        assert!(with.contains("Title: <slide title>"));
    }

    #[test]
    fn test_control_tags_always_requested() {
        let prompt = PromptBuilder::new().build(&base_params());
        assert!(prompt.contains("<IMAGE_PROMPT>"));
        assert!(prompt.contains("<LESSON_OVERVIEW>"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::new();
        let params = base_params();
        assert_eq!(builder.build(&params), builder.build(&params));
    }
}
