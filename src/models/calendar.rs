//! 日历事件模型
//!
//! 由计划展开派生，仅用于前端日历渲染，不做持久化

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 日历事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// 计划 ID
    pub plan_id: String,
    /// 计划标题
    pub title: String,
    /// 科目
    pub subject: String,
    /// 上课日期（仅工作日）
    pub date: NaiveDate,
    /// 计划内的第几天（从 1 开始）
    pub day_index: u32,
    /// 计划总天数
    pub total_days: u32,
}
