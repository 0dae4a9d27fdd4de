use serde::{Deserialize, Serialize};

use crate::capabilities::{ApiError, TimerOutput};
use crate::config::ClientConfig;
use crate::model::{Account, IdempotencyKey, IncidentCategory, IncidentRecord, Route, TimerId};
use crate::registration::ContactField;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    Noop,

    // Shell lifecycle
    Configure(ClientConfig),
    Navigate(Route),
    DismissError,

    // Report page
    CategorySelected(IncidentCategory),
    CustomCategoryChanged(String),
    DescriptionChanged(String),
    MapClicked { lat: f64, lng: f64 },
    SubmitReport,
    ReportAnother,
    #[serde(skip)]
    IncidentSubmitted {
        key: IdempotencyKey,
        result: Result<Option<IncidentRecord>, ApiError>,
    },

    // Emergency help page
    EmergencyPressed,
    CancelEmergency,
    #[serde(skip)]
    PressWindowElapsed { timer: TimerId, output: TimerOutput },
    #[serde(skip)]
    CountdownTick { timer: TimerId, output: TimerOutput },

    // Dashboard
    RefreshDashboard,
    #[serde(skip)]
    DashboardPoll { timer: TimerId, output: TimerOutput },
    #[serde(skip)]
    IncidentsLoaded(Result<Vec<IncidentRecord>, ApiError>),

    // Registration
    RegistrationNameChanged(String),
    RegistrationPhoneChanged(String),
    RegistrationPasswordChanged(String),
    RegistrationEmailChanged(String),
    AddContact,
    RemoveContact(usize),
    ContactChanged {
        index: usize,
        field: ContactField,
        value: String,
    },
    SubmitRegistration,
    #[serde(skip)]
    Registered(Result<(), ApiError>),

    // Login
    LoginPhoneChanged(String),
    LoginPasswordChanged(String),
    SubmitLogin,
    #[serde(skip)]
    LoggedIn(Result<Account, ApiError>),
}

impl Event {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::Navigate(_) => "navigate",
            Self::DismissError => "dismiss_error",
            Self::CategorySelected(_) => "category_selected",
            Self::CustomCategoryChanged(_) => "custom_category_changed",
            Self::DescriptionChanged(_) => "description_changed",
            Self::MapClicked { .. } => "map_clicked",
            Self::SubmitReport => "submit_report",
            Self::ReportAnother => "report_another",
            Self::IncidentSubmitted { .. } => "incident_submitted",
            Self::EmergencyPressed => "emergency_pressed",
            Self::CancelEmergency => "cancel_emergency",
            Self::PressWindowElapsed { .. } => "press_window_elapsed",
            Self::CountdownTick { .. } => "countdown_tick",
            Self::RefreshDashboard => "refresh_dashboard",
            Self::DashboardPoll { .. } => "dashboard_poll",
            Self::IncidentsLoaded(_) => "incidents_loaded",
            Self::RegistrationNameChanged(_) => "registration_name_changed",
            Self::RegistrationPhoneChanged(_) => "registration_phone_changed",
            Self::RegistrationPasswordChanged(_) => "registration_password_changed",
            Self::RegistrationEmailChanged(_) => "registration_email_changed",
            Self::AddContact => "add_contact",
            Self::RemoveContact(_) => "remove_contact",
            Self::ContactChanged { .. } => "contact_changed",
            Self::SubmitRegistration => "submit_registration",
            Self::Registered(_) => "registered",
            Self::LoginPhoneChanged(_) => "login_phone_changed",
            Self::LoginPasswordChanged(_) => "login_password_changed",
            Self::SubmitLogin => "submit_login",
            Self::LoggedIn(_) => "logged_in",
        }
    }

    /// Taps and keystrokes, as opposed to capability callbacks.
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::Navigate(_)
                | Self::DismissError
                | Self::CategorySelected(_)
                | Self::CustomCategoryChanged(_)
                | Self::DescriptionChanged(_)
                | Self::MapClicked { .. }
                | Self::SubmitReport
                | Self::ReportAnother
                | Self::EmergencyPressed
                | Self::CancelEmergency
                | Self::RefreshDashboard
                | Self::RegistrationNameChanged(_)
                | Self::RegistrationPhoneChanged(_)
                | Self::RegistrationPasswordChanged(_)
                | Self::RegistrationEmailChanged(_)
                | Self::AddContact
                | Self::RemoveContact(_)
                | Self::ContactChanged { .. }
                | Self::SubmitRegistration
                | Self::LoginPhoneChanged(_)
                | Self::LoginPasswordChanged(_)
                | Self::SubmitLogin
        )
    }

    /// Events whose payload may carry a password.
    pub const fn is_sensitive(&self) -> bool {
        matches!(
            self,
            Self::RegistrationPasswordChanged(_) | Self::LoginPasswordChanged(_)
        )
    }
}
