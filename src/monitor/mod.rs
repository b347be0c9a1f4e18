mod aggregator;
mod evaluator;
mod model;
mod pipeline;
mod severity;

pub use evaluator::simulate_alert;
pub use model::CycleReport;
#[cfg(test)]
pub use model::{AggregateSample, PublishedAlert};
pub use pipeline::MonitorPipeline;
pub use severity::SeverityBand;
