//! 日历排布服务 - 业务能力层
//!
//! 纯函数：把计划展开成一串工作日日期，供前端日历渲染
//!
//! 天数映射与提示词构建共用 `PlanLength` 的同一张表，
//! 两边必须保持一致（跨组件不变量）

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};

use crate::models::{CalendarEvent, PlanLength};

/// 判断是否为周末
fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 取下一个工作日（传入的日期本身是工作日则原样返回）
pub fn next_weekday(mut date: NaiveDate) -> NaiveDate {
    while is_weekend(date) {
        date = date + Days::new(1);
    }
    date
}

/// 从起始日期展开指定数量的工作日
///
/// 起始日期落在周末时先推进到下一个工作日；
/// 之后每天都取下一个工作日（跳过周六、周日），直到凑满 day_count 个
pub fn expand_weekdays(start: NaiveDate, day_count: u32) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(day_count as usize);
    let mut date = next_weekday(start);

    for _ in 0..day_count {
        dates.push(date);
        date = next_weekday(date + Days::new(1));
    }

    dates
}

/// 计算"今天"的日期
///
/// 这是唯一的时区归一化点：统一用本地时区取当天日期
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// 把一个计划展开成日历事件列表
pub fn layout_plan(
    plan_id: &str,
    title: &str,
    subject: &str,
    start: NaiveDate,
    plan_length_label: &str,
) -> Vec<CalendarEvent> {
    let total_days = PlanLength::day_count_for_label(plan_length_label);

    expand_weekdays(start, total_days)
        .into_iter()
        .enumerate()
        .map(|(i, date)| CalendarEvent {
            plan_id: plan_id.to_string(),
            title: title.to_string(),
            subject: subject.to_string(),
            date,
            day_index: i as u32 + 1,
            total_days,
        })
        .collect()
}
