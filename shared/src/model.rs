use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::dashboard::DashboardState;
use crate::emergency::EmergencyActivationFlow;
use crate::registration::{LoginForm, RegistrationForm};
use crate::report::IncidentReportFlow;
use crate::{AppError, ValidatedCoordinate};

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(TimerId);
typed_id!(IdempotencyKey);

// --- Incidents ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    #[default]
    Harassment,
    Fire,
    Accident,
    Theft,
    Vandalism,
    SuspiciousActivity,
    MedicalEmergency,
    TrafficViolation,
    NoiseComplaint,
    Other,
}

impl IncidentCategory {
    pub const ALL: [Self; 10] = [
        Self::Harassment,
        Self::Fire,
        Self::Accident,
        Self::Theft,
        Self::Vandalism,
        Self::SuspiciousActivity,
        Self::MedicalEmergency,
        Self::TrafficViolation,
        Self::NoiseComplaint,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Harassment => "harassment",
            Self::Fire => "fire",
            Self::Accident => "accident",
            Self::Theft => "theft",
            Self::Vandalism => "vandalism",
            Self::SuspiciousActivity => "suspicious_activity",
            Self::MedicalEmergency => "medical_emergency",
            Self::TrafficViolation => "traffic_violation",
            Self::NoiseComplaint => "noise_complaint",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Harassment => "Harassment",
            Self::Fire => "Fire",
            Self::Accident => "Accident",
            Self::Theft => "Theft",
            Self::Vandalism => "Vandalism",
            Self::SuspiciousActivity => "Suspicious Activity",
            Self::MedicalEmergency => "Medical Emergency",
            Self::TrafficViolation => "Traffic Violation",
            Self::NoiseComplaint => "Noise Complaint",
            Self::Other => "Other",
        }
    }

    #[must_use]
    pub const fn needs_custom_text(self) -> bool {
        matches!(self, Self::Other)
    }
}

impl fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The report form being edited.
///
/// `custom_category` is only meaningful while `category` is `Other`; the
/// report flow clears it on every other category change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IncidentDraft {
    pub category: IncidentCategory,
    pub custom_category: String,
    pub description: String,
    pub location: Option<ValidatedCoordinate>,
}

impl IncidentDraft {
    /// The category string sent to the server.
    #[must_use]
    pub fn effective_category(&self) -> String {
        if self.category.needs_custom_text() {
            self.custom_category.trim().to_string()
        } else {
            self.category.as_str().to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentSubmission {
    pub category: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// An incident as returned by the API.
///
/// Decoding is lenient: older servers send `type` instead of `category` and
/// `created_at` instead of `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(alias = "type", default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(alias = "created_at", default)]
    pub timestamp: Option<String>,
}

impl IncidentRecord {
    /// Heading shown in the dashboard list.
    #[must_use]
    pub fn heading(&self) -> String {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty())
            .or(self.title.as_deref())
            .map_or_else(|| "Incident".to_string(), str::to_string)
    }
}

/// Either a bare array or the paged list envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IncidentListPayload {
    Bare(Vec<IncidentRecord>),
    Paged {
        incidents: Vec<IncidentRecord>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl IncidentListPayload {
    #[must_use]
    pub fn into_records(self) -> Vec<IncidentRecord> {
        match self {
            Self::Bare(records) | Self::Paged { incidents: records, .. } => records,
        }
    }
}

// --- Users ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationProfile {
    pub name: String,
    pub phone: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub emergency_contacts: Vec<EmergencyContact>,
}

// Redact debug output; the password must never reach the logs.
impl fmt::Debug for RegistrationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationProfile")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .field("email_present", &self.email.is_some())
            .field("emergency_contacts", &self.emergency_contacts.len())
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub phone: String,
    pub password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

/// Login answers either the bare account or `{ "user": {..}, .. }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LoginPayload {
    Wrapped { user: Account },
    Bare(Account),
}

impl LoginPayload {
    #[must_use]
    pub fn into_account(self) -> Account {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

// --- Navigation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    #[default]
    Home,
    Report,
    Dashboard,
    EmergencyContacts,
    EmergencyHelp,
}

impl Route {
    pub const ALL: [Self; 5] = [
        Self::Home,
        Self::Report,
        Self::Dashboard,
        Self::EmergencyContacts,
        Self::EmergencyHelp,
    ];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Report => "/report",
            Self::Dashboard => "/dashboard",
            Self::EmergencyContacts => "/emergency-contacts",
            Self::EmergencyHelp => "/help",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Report => "Report Incident",
            Self::Dashboard => "Dashboard",
            Self::EmergencyContacts => "Emergency Contacts",
            Self::EmergencyHelp => "EMERGENCY HELP",
        }
    }
}

// --- Emergency contact directory ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Helpline {
    pub number: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HelplineGroup {
    pub category: &'static str,
    pub contacts: &'static [Helpline],
}

const fn line(number: &'static str, description: &'static str) -> Helpline {
    Helpline {
        number,
        description,
    }
}

pub const EMERGENCY_DIRECTORY: &[HelplineGroup] = &[
    HelplineGroup {
        category: "Police Emergency",
        contacts: &[
            line("100", "Police Control Room"),
            line("112", "National Emergency Number"),
            line("1091", "Women Helpline"),
        ],
    },
    HelplineGroup {
        category: "Medical Emergency",
        contacts: &[
            line("108", "Ambulance Services"),
            line("102", "Pregnancy Medical Van"),
            line("104", "Health Helpline"),
        ],
    },
    HelplineGroup {
        category: "Fire Emergency",
        contacts: &[line("101", "Fire Control Room")],
    },
    HelplineGroup {
        category: "Disaster Management",
        contacts: &[
            line("1078", "District Emergency Operation Center"),
            line("1070", "State Emergency Operation Center"),
        ],
    },
    HelplineGroup {
        category: "Local Helplines",
        contacts: &[
            line("1098", "Child Helpline"),
            line("181", "Women Helpline"),
            line("1363", "Tourist Helpline"),
        ],
    },
    HelplineGroup {
        category: "Patiala Emergency",
        contacts: &[
            line("+91-175-2212223", "Patiala Police Control Room"),
            line("+91-175-2212368", "Rajindra Hospital"),
            line("+91-175-2970349", "Civil Hospital"),
        ],
    },
];

/// Shown on the report thank-you screen.
pub const QUICK_CONTACTS: &[Helpline] = &[
    line("100", "Police"),
    line("108", "Ambulance"),
    line("101", "Fire"),
];

// --- Model ---

pub struct Model {
    pub config: ClientConfig,
    pub route: Route,
    pub report: IncidentReportFlow,
    pub emergency: EmergencyActivationFlow,
    pub dashboard: DashboardState,
    pub registration: RegistrationForm,
    pub login: LoginForm,
    pub account: Option<Account>,
    pub active_error: Option<AppError>,
}

impl Default for Model {
    fn default() -> Self {
        let config = ClientConfig::default();
        Self {
            emergency: EmergencyActivationFlow::new(config.activation.clone()),
            dashboard: DashboardState::new(config.dashboard_poll_ms),
            config,
            route: Route::default(),
            report: IncidentReportFlow::default(),
            registration: RegistrationForm::default(),
            login: LoginForm::default(),
            account: None,
            active_error: None,
        }
    }
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.account.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_name_matches_as_str() {
        for category in IncidentCategory::ALL {
            let wire = format!("\"{}\"", category.as_str());
            let parsed: IncidentCategory = serde_json::from_str(&wire).unwrap();
            assert_eq!(parsed, category);
        }
        assert!(serde_json::from_str::<IncidentCategory>("\"earthquake\"").is_err());
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&IncidentCategory::SuspiciousActivity).unwrap();
        assert_eq!(json, "\"suspicious_activity\"");
    }

    #[test]
    fn test_default_draft() {
        let draft = IncidentDraft::default();
        assert_eq!(draft.category, IncidentCategory::Harassment);
        assert!(draft.custom_category.is_empty());
        assert!(draft.description.is_empty());
        assert!(draft.location.is_none());
    }

    #[test]
    fn test_effective_category() {
        let mut draft = IncidentDraft {
            category: IncidentCategory::Theft,
            custom_category: "ignored".into(),
            ..IncidentDraft::default()
        };
        assert_eq!(draft.effective_category(), "theft");

        draft.category = IncidentCategory::Other;
        draft.custom_category = "  Stray dogs  ".into();
        assert_eq!(draft.effective_category(), "Stray dogs");
    }

    #[test]
    fn test_record_accepts_legacy_field_names() {
        let json = r#"{
            "type": "fire",
            "description": "Smoke from a shop",
            "latitude": 30.34,
            "longitude": 76.38,
            "created_at": "2025-10-13T10:30:00Z"
        }"#;
        let record: IncidentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.category.as_deref(), Some("fire"));
        assert_eq!(record.timestamp.as_deref(), Some("2025-10-13T10:30:00Z"));
        assert_eq!(record.heading(), "fire");
    }

    #[test]
    fn test_record_heading_falls_back_to_title() {
        let record = IncidentRecord {
            id: Some(1),
            category: None,
            title: Some("Broken street light".into()),
            description: String::new(),
            latitude: 30.0,
            longitude: 76.0,
            timestamp: None,
        };
        assert_eq!(record.heading(), "Broken street light");
    }

    #[test]
    fn test_list_payload_bare_and_paged() {
        let bare = r#"[{"category":"theft","description":"x","latitude":1.0,"longitude":2.0}]"#;
        let paged = r#"{"total":1,"page":1,"page_size":20,"incidents":[{"title":"t","description":"x","latitude":1.0,"longitude":2.0}]}"#;

        let bare: IncidentListPayload = serde_json::from_str(bare).unwrap();
        let paged: IncidentListPayload = serde_json::from_str(paged).unwrap();

        assert_eq!(bare.into_records().len(), 1);
        assert_eq!(paged.into_records()[0].title.as_deref(), Some("t"));
    }

    #[test]
    fn test_registration_profile_debug_redacts_password() {
        let profile = RegistrationProfile {
            name: "Priya Sharma".into(),
            phone: "9876543210".into(),
            password: "hunter22".into(),
            email: None,
            emergency_contacts: vec![],
        };
        let debug = format!("{profile:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_registration_profile_omits_missing_email() {
        let profile = RegistrationProfile {
            name: "Priya Sharma".into(),
            phone: "9876543210".into(),
            password: "secret1".into(),
            email: None,
            emergency_contacts: vec![EmergencyContact {
                name: "Mom".into(),
                phone: "9876000001".into(),
            }],
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["emergency_contacts"][0]["name"], "Mom");
    }

    #[test]
    fn test_login_payload_variants() {
        let bare = r#"{"id":7,"name":"Priya","phone":"9876543210"}"#;
        let wrapped = r#"{"message":"ok","user":{"name":"Priya","phone":"9876543210"}}"#;
        let bare: LoginPayload = serde_json::from_str(bare).unwrap();
        let wrapped: LoginPayload = serde_json::from_str(wrapped).unwrap();
        assert_eq!(bare.into_account().id, Some(7));
        assert_eq!(wrapped.into_account().name, "Priya");
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::EmergencyContacts.path(), "/emergency-contacts");
        assert_eq!(Route::EmergencyHelp.path(), "/help");
        assert_eq!(Route::Home.path(), "/");
    }

    #[test]
    fn test_directory_contains_quick_contacts() {
        for quick in QUICK_CONTACTS {
            assert!(EMERGENCY_DIRECTORY
                .iter()
                .flat_map(|g| g.contacts.iter())
                .any(|c| c.number == quick.number));
        }
    }

    #[test]
    fn test_timer_ids_are_unique() {
        assert_ne!(TimerId::generate(), TimerId::generate());
    }
}
