use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use tracing::{debug, warn};

use crate::capabilities::ApiError;
use crate::model::{IncidentRecord, TimerId};
use crate::DASHBOARD_FAILED_MESSAGE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    Fetch,
    SchedulePoll { id: TimerId, millis: u64 },
    CancelTimer(TimerId),
}

/// Recent reports page.
///
/// Polls the incident list while visible. At most one poll timer is live and
/// it is cancelled as soon as the page is left.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    poll_ms: u64,
    visible: bool,
    poll_timer: Option<TimerId>,
    loading: bool,
    incidents: Vec<IncidentRecord>,
    error: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(crate::DASHBOARD_POLL_MS)
    }
}

impl DashboardState {
    #[must_use]
    pub const fn new(poll_ms: u64) -> Self {
        Self {
            poll_ms,
            visible: false,
            poll_timer: None,
            loading: true,
            incidents: Vec::new(),
            error: None,
        }
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// True until the first response arrives.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn incidents(&self) -> &[IncidentRecord] {
        &self.incidents
    }

    /// The first `limit` records in server order.
    #[must_use]
    pub fn recent(&self, limit: usize) -> &[IncidentRecord] {
        &self.incidents[..self.incidents.len().min(limit)]
    }

    /// Takes effect from the next scheduled poll.
    pub fn set_poll_interval(&mut self, poll_ms: u64) {
        self.poll_ms = poll_ms;
    }

    pub fn enter(&mut self) -> Vec<DashboardCommand> {
        if self.visible {
            return Vec::new();
        }
        self.visible = true;
        debug!(poll_ms = self.poll_ms, "dashboard polling started");
        vec![DashboardCommand::Fetch, self.schedule_poll()]
    }

    pub fn leave(&mut self) -> Vec<DashboardCommand> {
        self.visible = false;
        self.poll_timer
            .take()
            .map(DashboardCommand::CancelTimer)
            .into_iter()
            .collect()
    }

    pub fn on_poll(&mut self, id: &TimerId) -> Vec<DashboardCommand> {
        if !self.visible || self.poll_timer.as_ref() != Some(id) {
            return Vec::new();
        }
        vec![DashboardCommand::Fetch, self.schedule_poll()]
    }

    /// Manual refresh; only while the page is shown.
    pub fn refresh(&self) -> Vec<DashboardCommand> {
        if self.visible {
            vec![DashboardCommand::Fetch]
        } else {
            Vec::new()
        }
    }

    /// A failed load keeps the records from the previous successful one.
    pub fn loaded(&mut self, result: Result<Vec<IncidentRecord>, ApiError>) {
        self.loading = false;
        match result {
            Ok(records) => {
                debug!(count = records.len(), "incidents loaded");
                self.incidents = records;
                self.error = None;
            }
            Err(e) => {
                warn!(error = %e, "incident list failed");
                self.error = Some(DASHBOARD_FAILED_MESSAGE.to_string());
            }
        }
    }

    /// Every loaded incident as a GeoJSON `FeatureCollection` of points,
    /// ready for the shell's map layer.
    #[must_use]
    pub fn incident_layer(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.incidents.iter().map(incident_feature).collect(),
            foreign_members: None,
        }
    }

    fn schedule_poll(&mut self) -> DashboardCommand {
        let id = TimerId::generate();
        self.poll_timer = Some(id.clone());
        DashboardCommand::SchedulePoll {
            id,
            millis: self.poll_ms,
        }
    }
}

fn incident_feature(record: &IncidentRecord) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("heading".into(), record.heading().into());
    properties.insert("description".into(), record.description.clone().into());
    if let Some(timestamp) = &record.timestamp {
        properties.insert("timestamp".into(), timestamp.clone().into());
    }

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            record.longitude,
            record.latitude,
        ]))),
        id: record
            .id
            .map(|id| geojson::feature::Id::Number(serde_json::Number::from(id))),
        properties: Some(properties),
        foreign_members: None,
    }
}
