//! 课程计划核心数据模型
//!
//! 本模块中的所有类型都是请求范围内的临时值，
//! 持久化由外部系统负责

use serde::{Deserialize, Serialize};

/// 计划时长枚举
///
/// 七种可识别的计划时长，各自映射到固定的上课天数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanLength {
    /// 单节课（1 天）
    SingleLesson,
    /// 一周（5 天）
    OneWeek,
    /// 两周（10 天）
    TwoWeeks,
    /// 三周（15 天）
    ThreeWeeks,
    /// 四周（20 天）
    FourWeeks,
    /// 一学季（45 天）
    OneQuarter,
    /// 一学期（90 天）
    OneSemester,
}

impl PlanLength {
    /// 获取对应的上课天数
    pub fn day_count(self) -> u32 {
        match self {
            PlanLength::SingleLesson => 1,
            PlanLength::OneWeek => 5,
            PlanLength::TwoWeeks => 10,
            PlanLength::ThreeWeeks => 15,
            PlanLength::FourWeeks => 20,
            PlanLength::OneQuarter => 45,
            PlanLength::OneSemester => 90,
        }
    }

    /// 获取标准标签
    pub fn label(self) -> &'static str {
        match self {
            PlanLength::SingleLesson => "Single Lesson",
            PlanLength::OneWeek => "One Week",
            PlanLength::TwoWeeks => "Two Weeks",
            PlanLength::ThreeWeeks => "Three Weeks",
            PlanLength::FourWeeks => "Four Weeks",
            PlanLength::OneQuarter => "One Quarter",
            PlanLength::OneSemester => "One Semester",
        }
    }

    /// 从标签解析计划时长（精确匹配）
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Single Lesson" => Some(PlanLength::SingleLesson),
            "One Week" => Some(PlanLength::OneWeek),
            "Two Weeks" => Some(PlanLength::TwoWeeks),
            "Three Weeks" => Some(PlanLength::ThreeWeeks),
            "Four Weeks" => Some(PlanLength::FourWeeks),
            "One Quarter" => Some(PlanLength::OneQuarter),
            "One Semester" => Some(PlanLength::OneSemester),
            _ => None,
        }
    }

    /// 从标签获取天数，无法识别的标签按 1 天处理
    ///
    /// 提示词构建和日历展开共用这张映射表
    pub fn day_count_for_label(label: &str) -> u32 {
        Self::from_label(label).map(Self::day_count).unwrap_or(1)
    }
}

impl std::fmt::Display for PlanLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 课程计划生成参数
///
/// 来自前端表单（或 TOML 参数文件）的完整输入集合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPlanParameters {
    /// 计划时长标签（如 "One Week"）
    pub plan_length: String,
    /// 年级（如 "3rd Grade"）
    pub grade_level: String,
    /// 科目（如 "Science"）
    pub subject: String,
    /// 每节课时长（分钟，字符串形式）
    #[serde(default)]
    pub duration_minutes: String,
    /// 英语水平列表（可为空）
    #[serde(default)]
    pub english_proficiency_levels: Vec<String>,
    /// 学业水平列表（可为空）
    #[serde(default)]
    pub academic_levels: Vec<String>,
    /// 是否自动生成教学目标
    #[serde(default = "default_true")]
    pub auto_generate_objectives: bool,
    /// 手动填写的教学目标（仅在 auto_generate_objectives 为 false 时使用）
    #[serde(default)]
    pub manual_objectives: String,
    /// 选中的练习题类型（有序）
    #[serde(default)]
    pub worksheet_types: Vec<String>,
    /// 是否生成幻灯片大纲
    #[serde(default)]
    pub include_slides: bool,
    /// 班级名册摘要（可选自由文本）
    #[serde(default)]
    pub roster_summary: Option<String>,
}

fn default_true() -> bool {
    true
}

impl LessonPlanParameters {
    /// 获取映射后的上课天数
    pub fn day_count(&self) -> u32 {
        PlanLength::day_count_for_label(&self.plan_length)
    }
}

/// 幻灯片
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// 标题
    pub title: String,
    /// 要点列表（有序）
    pub bullets: Vec<String>,
}

/// 生成结果
///
/// 归一化后的正文加上从内联标签提取的结构化数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedLessonResult {
    /// 归一化后的 Markdown 正文
    pub text: String,
    /// 提取到的插图提示词（可选）
    pub image_prompt: Option<String>,
    /// 提取到的课程概述（可选）
    pub lesson_overview: Option<String>,
    /// 幻灯片列表（有序，可为空）
    pub slides: Vec<Slide>,
}
