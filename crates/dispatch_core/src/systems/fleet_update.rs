use crate::dispatch::Dispatcher;

/// Advance ambulances whose current leg has ended.
pub fn fleet_update_system(mut dispatcher: Dispatcher) {
    dispatcher.update_fleet();
}
