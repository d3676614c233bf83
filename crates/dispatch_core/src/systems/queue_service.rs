use tracing::debug;

use crate::dispatch::Dispatcher;

/// Try to dispatch the most urgent pending emergency.
pub fn queue_service_system(mut dispatcher: Dispatcher) {
    if let Some(Err(err)) = dispatcher.service_nearest_pending() {
        debug!(error = %err, "pending emergency not dispatched this tick");
    }
}
