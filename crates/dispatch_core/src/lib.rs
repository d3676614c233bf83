pub mod clock;
pub mod dispatch;
pub mod emergency;
pub mod error;
pub mod fleet;
pub mod hospital;
pub mod intake;
pub mod network;
pub mod priority;
pub mod queue;
pub mod routing;
pub mod runner;
pub mod scenario;
pub mod simulation;
pub mod systems;
pub mod telemetry;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use error::{ConfigError, DispatchError};
pub use simulation::DispatchSimulation;
