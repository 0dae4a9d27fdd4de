use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::ValidatedCoordinate;

/// Camera and layer commands for the shell's map widget.
///
/// Clicks travel the other way as `Event::MapClicked`; the core never reads
/// tile or rendering state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MapOperation {
    /// Animated recentre. `zoom: None` keeps the current zoom level.
    FlyTo {
        lat: f64,
        lon: f64,
        zoom: Option<f64>,
        duration_ms: u64,
    },
    SetView {
        lat: f64,
        lon: f64,
        zoom: f64,
    },
    /// Replaces the incident layer with a GeoJSON `FeatureCollection`.
    ShowIncidents { geojson: String },
}

impl Operation for MapOperation {
    type Output = ();
}

pub struct MapView<Ev> {
    context: CapabilityContext<MapOperation, Ev>,
}

impl<Ev> Capability<Ev> for MapView<Ev> {
    type Operation = MapOperation;
    type MappedSelf<MappedEv> = MapView<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        MapView::new(self.context.map_event(f))
    }
}

impl<Ev> MapView<Ev> {
    pub fn new(context: CapabilityContext<MapOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> MapView<Ev>
where
    Ev: Send + 'static,
{
    pub fn fly_to(&self, target: ValidatedCoordinate, duration_ms: u64) {
        self.notify(MapOperation::FlyTo {
            lat: target.lat(),
            lon: target.lon(),
            zoom: None,
            duration_ms,
        });
    }

    pub fn set_view(&self, (lat, lon): (f64, f64), zoom: f64) {
        self.notify(MapOperation::SetView { lat, lon, zoom });
    }

    pub fn show_incidents(&self, geojson: String) {
        self.notify(MapOperation::ShowIncidents { geojson });
    }

    fn notify(&self, operation: MapOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}
