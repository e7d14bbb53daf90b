use crate::simulation::event::Event;
use crate::model::truck::TruckId;
use chrono::NaiveDateTime;

/// Observer hook invoked by the Simulator at well-defined points, so
/// instrumentation and tests can watch a run without threading extra state
/// through the core loop.
pub trait SimulationCallback {
    fn on_tick(&mut self, _clock: NaiveDateTime) {}
    fn on_dispatch(&mut self, _truck_id: TruckId, _parcel_count: usize, _clock: NaiveDateTime) {}
    fn on_event(&mut self, _event: &Event) {}
}

/// Forwards every callback invocation into `tracing`, replacing the
/// original Python's bare `print` calls.
#[derive(Default)]
pub struct TracingCallback;

impl SimulationCallback for TracingCallback {
    fn on_tick(&mut self, clock: NaiveDateTime) {
        tracing::debug!(%clock, "tick");
    }

    fn on_dispatch(&mut self, truck_id: TruckId, parcel_count: usize, clock: NaiveDateTime) {
        tracing::info!(truck = %truck_id, parcel_count, %clock, "dispatched truck");
    }

    fn on_event(&mut self, event: &Event) {
        tracing::info!("{}", event.render());
    }
}
