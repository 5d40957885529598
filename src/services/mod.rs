pub mod conversion_scheduler;
pub mod conversion_service;
pub mod pipeline_resolver;
pub mod project_layout;
pub mod task_table;

pub use conversion_scheduler::ConversionScheduler;
pub use conversion_service::ConversionService;
pub use pipeline_resolver::PipelineResolver;
pub use project_layout::{BytecodeRoot, LayoutProbe, ProjectLayout};
pub use task_table::{ConversionTask, TaskTable};
