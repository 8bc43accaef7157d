pub mod plan_flow;

pub use plan_flow::LessonPlanFlow;
