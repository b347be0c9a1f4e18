use std::sync::Arc;

use crate::app_context::AppContext;

mod monitor;

pub use monitor::MonitorHandle;

pub fn start_background_jobs(app_context: &AppContext) -> MonitorHandle {
    monitor::start_monitor_job(
        Arc::clone(&app_context.pipeline),
        app_context.monitor_interval(),
    )
}
