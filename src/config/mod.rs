mod defaults;
mod io;
mod schema;
mod validate;

pub use defaults::MAX_CLAIM_TTL_SECS;
pub use io::load_config;
#[allow(unused_imports)]
pub use schema::{
    AlertFeedConfig, AlertStateBackend, AlertStateConfig, AlertTitles, Config, PointConfig,
    Simulation, Thresholds, Weather,
};
#[allow(unused_imports)]
pub use validate::ConfigError;
