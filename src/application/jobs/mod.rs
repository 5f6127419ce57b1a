mod context;
mod export;
mod queue;

pub use context::{ExportJobContext, job_failed};
pub use export::{
    ExportMenusJobPayload, enqueue_export_menus_job, process_export_menus_job, run_export,
};
pub use queue::{QueuedJob, enqueue};
