use serde::{Deserialize, Serialize};

use crate::emergency::ActivationPhase;
use crate::model::{
    Helpline, IncidentCategory, Model, Route, EMERGENCY_DIRECTORY, QUICK_CONTACTS,
};
use crate::registration::REGISTRATION_SUCCESS_MESSAGE;
use crate::report::ReportPhase;
use crate::{AppError, ErrorSeverity, DASHBOARD_CENTER, DASHBOARD_ZOOM};

pub const REPORT_QUOTE: &str =
    "The near miss reported today is the accident that doesn't happen tomorrow";
pub const LOCATION_HINT: &str =
    "Mark the location on the map by clicking where the incident occurred";
pub const LOCATION_CONFIRMED: &str =
    "✓ Location marked successfully! You can click elsewhere on the map to change the location.";
pub const THANK_YOU_HEADING: &str = "Thank You for Your Report";
pub const THANK_YOU_MESSAGE: &str = "Your incident has been successfully reported. We take every report seriously and will take appropriate action.";
pub const REGISTRATION_WELCOME: &str =
    "Thank you for joining SafeSphere! Your account has been created successfully.";
pub const NO_INCIDENTS_TEXT: &str = "No incidents reported yet";
pub const HOTSPOTS_PLACEHOLDER: &str = "Coming soon...";
pub const EMERGENCY_WARNING: &str = "Only use this button in genuine emergency situations. False alarms may result in unnecessary deployment of emergency services and could affect response times for real emergencies.";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NavItem {
    pub route: Route,
    pub label: String,
    pub path: String,
    pub active: bool,
    /// The emergency link is drawn as a red call-to-action.
    pub highlighted: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelplineView {
    pub number: String,
    pub description: String,
    pub dial_uri: String,
}

impl From<&Helpline> for HelplineView {
    fn from(h: &Helpline) -> Self {
        let digits: String = h
            .number
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        Self {
            number: h.number.to_string(),
            description: h.description.to_string(),
            dial_uri: format!("tel:{digits}"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelplineGroupView {
    pub category: String,
    pub contacts: Vec<HelplineView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MapViewState {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub marker: Option<(f64, f64)>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncidentListItem {
    pub heading: String,
    pub description: String,
    pub timestamp: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactRowView {
    pub name: String,
    pub phone: String,
    pub removable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum PageView {
    Home {
        name: String,
        phone: String,
        email: String,
        contacts: Vec<ContactRowView>,
        is_submitting: bool,
        error: Option<String>,
        success: Option<String>,
        success_detail: Option<String>,
        login_phone: String,
        login_is_submitting: bool,
        login_error: Option<String>,
        signed_in_as: Option<String>,
    },
    ReportEditing {
        quote: String,
        categories: Vec<CategoryOption>,
        show_custom_category: bool,
        custom_category: String,
        description: String,
        location_hint: String,
        location_confirmation: Option<String>,
        map: MapViewState,
        is_submitting: bool,
        error: Option<String>,
    },
    ReportThankYou {
        heading: String,
        message: String,
        quick_contacts: Vec<HelplineView>,
    },
    Dashboard {
        is_loading: bool,
        map: MapViewState,
        recent: Vec<IncidentListItem>,
        empty_text: Option<String>,
        error: Option<String>,
        hotspots_text: String,
    },
    EmergencyContacts {
        groups: Vec<HelplineGroupView>,
    },
    EmergencyHelp {
        button_label: String,
        is_armed: bool,
        presses_remaining: Option<u8>,
        countdown: Option<u8>,
        status_text: Option<String>,
        can_cancel: bool,
        warning: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub route: Route,
    pub title: String,
    pub nav: Vec<NavItem>,
    pub page: PageView,
    pub error: Option<UserFacingError>,
    pub is_signed_in: bool,
}

impl ViewModel {
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        Self {
            route: model.route,
            title: model.route.title().to_string(),
            nav: nav_items(model.route),
            page: page_view(model),
            error: model.active_error.as_ref().map(UserFacingError::from),
            is_signed_in: model.is_signed_in(),
        }
    }
}

fn nav_items(current: Route) -> Vec<NavItem> {
    Route::ALL
        .into_iter()
        .map(|route| NavItem {
            route,
            label: route.title().to_string(),
            path: route.path().to_string(),
            active: route == current,
            highlighted: route == Route::EmergencyHelp,
        })
        .collect()
}

/// Centred on the marker when there is one, so a rebuilt view keeps the
/// camera where the last fly-to left it.
fn map_state(marker: Option<(f64, f64)>) -> MapViewState {
    let (center_lat, center_lon) = marker.unwrap_or(DASHBOARD_CENTER);
    MapViewState {
        center_lat,
        center_lon,
        zoom: DASHBOARD_ZOOM,
        marker,
    }
}

fn page_view(model: &Model) -> PageView {
    match model.route {
        Route::Home => home_view(model),
        Route::Report => report_view(model),
        Route::Dashboard => dashboard_view(model),
        Route::EmergencyContacts => PageView::EmergencyContacts {
            groups: EMERGENCY_DIRECTORY
                .iter()
                .map(|group| HelplineGroupView {
                    category: group.category.to_string(),
                    contacts: group.contacts.iter().map(HelplineView::from).collect(),
                })
                .collect(),
        },
        Route::EmergencyHelp => emergency_view(model),
    }
}

fn home_view(model: &Model) -> PageView {
    let form = &model.registration;
    let success = form.success().map(str::to_string);
    PageView::Home {
        name: form.name.clone(),
        phone: form.phone.clone(),
        email: form.email.clone(),
        contacts: form
            .contacts()
            .iter()
            .enumerate()
            .map(|(index, contact)| ContactRowView {
                name: contact.name.clone(),
                phone: contact.phone.clone(),
                removable: form.can_remove_contact(index),
            })
            .collect(),
        is_submitting: form.is_submitting(),
        error: form.error().map(str::to_string),
        success_detail: success
            .as_deref()
            .filter(|s| *s == REGISTRATION_SUCCESS_MESSAGE)
            .map(|_| REGISTRATION_WELCOME.to_string()),
        success,
        login_phone: model.login.phone.clone(),
        login_is_submitting: model.login.is_submitting(),
        login_error: model.login.error().map(str::to_string),
        signed_in_as: model.account.as_ref().map(|a| a.name.clone()),
    }
}

fn report_view(model: &Model) -> PageView {
    let flow = &model.report;
    if flow.phase() == ReportPhase::ThankYou {
        return PageView::ReportThankYou {
            heading: THANK_YOU_HEADING.to_string(),
            message: THANK_YOU_MESSAGE.to_string(),
            quick_contacts: QUICK_CONTACTS.iter().map(HelplineView::from).collect(),
        };
    }

    let draft = flow.draft();
    PageView::ReportEditing {
        quote: REPORT_QUOTE.to_string(),
        categories: IncidentCategory::ALL
            .into_iter()
            .map(|category| CategoryOption {
                value: category.as_str().to_string(),
                label: if category.needs_custom_text() {
                    format!("{} (Specify)", category.label())
                } else {
                    category.label().to_string()
                },
                selected: category == draft.category,
            })
            .collect(),
        show_custom_category: flow.shows_custom_category(),
        custom_category: draft.custom_category.clone(),
        description: draft.description.clone(),
        location_hint: LOCATION_HINT.to_string(),
        location_confirmation: draft.location.map(|_| LOCATION_CONFIRMED.to_string()),
        map: map_state(draft.location.map(|c| c.as_tuple())),
        is_submitting: flow.phase() == ReportPhase::Submitting,
        error: flow.error().map(str::to_string),
    }
}

fn dashboard_view(model: &Model) -> PageView {
    let dashboard = &model.dashboard;
    let recent: Vec<IncidentListItem> = dashboard
        .recent(model.config.dashboard_recent_limit)
        .iter()
        .map(|record| IncidentListItem {
            heading: record.heading(),
            description: record.description.clone(),
            timestamp: record.timestamp.clone(),
        })
        .collect();

    PageView::Dashboard {
        is_loading: dashboard.is_loading(),
        map: map_state(None),
        empty_text: recent.is_empty().then(|| NO_INCIDENTS_TEXT.to_string()),
        recent,
        error: dashboard.error().map(str::to_string),
        hotspots_text: HOTSPOTS_PLACEHOLDER.to_string(),
    }
}

fn emergency_view(model: &Model) -> PageView {
    let flow = &model.emergency;
    let required = flow.config().required_presses;

    let (button_label, presses_remaining, status_text) = match flow.phase() {
        ActivationPhase::Idle => ("EMERGENCY", None, None),
        ActivationPhase::Counting { presses } => {
            let remaining = required.saturating_sub(presses);
            (
                "EMERGENCY",
                Some(remaining),
                Some(format!(
                    "Press {remaining} more times quickly to activate emergency response"
                )),
            )
        }
        ActivationPhase::Armed { remaining } => (
            "ACTIVATED",
            None,
            Some(format!("Sending alert in {remaining} seconds...")),
        ),
        ActivationPhase::Dispatched => ("ACTIVATED", None, None),
    };

    PageView::EmergencyHelp {
        button_label: button_label.to_string(),
        is_armed: flow.is_armed(),
        presses_remaining,
        countdown: flow.countdown(),
        status_text,
        can_cancel: matches!(flow.phase(), ActivationPhase::Armed { .. }),
        warning: EMERGENCY_WARNING.to_string(),
    }
}
