pub mod calendar;
pub mod loaders;
pub mod plan;

pub use calendar::CalendarEvent;
pub use loaders::load_params_from_toml;
pub use plan::{GeneratedLessonResult, LessonPlanParameters, PlanLength, Slide};
