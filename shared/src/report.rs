//! Incident report form.
//!
//! `Editing → Submitting → ThankYou`, with a fallback from `Submitting` to
//! `Editing` when the server rejects the report. The flow never talks to
//! the network itself: `submit` hands back the payload to send and the app
//! reports the outcome through `submission_succeeded` / `submission_failed`.
//! Each submission carries an idempotency key; outcomes for any other key
//! belong to a discarded form and are dropped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::ApiError;
use crate::model::{
    IdempotencyKey, IncidentCategory, IncidentDraft, IncidentRecord, IncidentSubmission,
};
use crate::{AppError, ErrorKind, ValidatedCoordinate, ValidationError, REPORT_FAILED_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportPhase {
    #[default]
    Editing,
    Submitting,
    ThankYou,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("report cannot be submitted while {0:?}")]
    NotEditing(ReportPhase),
}

impl From<ReportError> for AppError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::Validation(v) => v.into(),
            ReportError::NotEditing(_) => AppError::new(ErrorKind::InvalidState, e.to_string()),
        }
    }
}

/// Where the map camera should go after a pin is dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    pub target: ValidatedCoordinate,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncidentReportFlow {
    phase: ReportPhase,
    draft: IncidentDraft,
    error: Option<String>,
    last_report: Option<IncidentRecord>,
    pending: Option<IdempotencyKey>,
}

impl IncidentReportFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> ReportPhase {
        self.phase
    }

    #[must_use]
    pub const fn draft(&self) -> &IncidentDraft {
        &self.draft
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn last_report(&self) -> Option<&IncidentRecord> {
        self.last_report.as_ref()
    }

    /// Key of the submission in flight, if any.
    #[must_use]
    pub const fn pending_key(&self) -> Option<&IdempotencyKey> {
        self.pending.as_ref()
    }

    #[must_use]
    pub const fn shows_custom_category(&self) -> bool {
        self.draft.category.needs_custom_text()
    }

    pub fn set_category(&mut self, category: IncidentCategory) {
        self.draft.category = category;
        if !category.needs_custom_text() {
            self.draft.custom_category.clear();
        }
    }

    pub fn set_custom_category(&mut self, text: impl Into<String>) {
        self.draft.custom_category = text.into();
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.draft.description = text.into();
    }

    /// Moves the pin. Last write wins.
    pub fn select_location(&mut self, coordinate: ValidatedCoordinate) -> FlyTo {
        self.draft.location = Some(coordinate);
        FlyTo { target: coordinate }
    }

    /// Validates the draft and enters `Submitting`.
    ///
    /// The location check runs first so a report without a pin is rejected
    /// no matter what else is filled in.
    pub fn submit(&mut self) -> Result<IncidentSubmission, ReportError> {
        if self.phase != ReportPhase::Editing {
            return Err(ReportError::NotEditing(self.phase));
        }

        self.error = None;

        let submission = match Self::validate(&self.draft) {
            Ok(submission) => submission,
            Err(e) => {
                self.error = Some(e.user_message());
                return Err(e.into());
            }
        };

        self.phase = ReportPhase::Submitting;
        self.pending = Some(IdempotencyKey::generate());
        Ok(submission)
    }

    fn take_pending(&mut self, key: &IdempotencyKey) -> bool {
        if self.phase != ReportPhase::Submitting || self.pending.as_ref() != Some(key) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Returns `false` when `key` is not the submission in flight.
    pub fn submission_succeeded(
        &mut self,
        key: &IdempotencyKey,
        record: Option<IncidentRecord>,
    ) -> bool {
        if !self.take_pending(key) {
            return false;
        }
        self.phase = ReportPhase::ThankYou;
        self.draft = IncidentDraft::default();
        self.error = None;
        self.last_report = record;
        true
    }

    /// Back to `Editing` with the draft intact; no retry is scheduled.
    pub fn submission_failed(&mut self, key: &IdempotencyKey, error: &ApiError) -> bool {
        if !self.take_pending(key) {
            return false;
        }
        self.phase = ReportPhase::Editing;
        self.error = Some(error.user_message(REPORT_FAILED_MESSAGE));
        true
    }

    /// "Report another incident".
    pub fn reset_to_editing(&mut self) {
        if self.phase == ReportPhase::ThankYou {
            *self = Self::default();
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn validate(draft: &IncidentDraft) -> Result<IncidentSubmission, ValidationError> {
        let location = draft.location.ok_or(ValidationError::LocationRequired)?;

        let category = draft.effective_category();
        if category.is_empty() {
            return Err(ValidationError::CustomCategoryRequired);
        }

        if draft.description.trim().is_empty() {
            return Err(ValidationError::DescriptionRequired);
        }

        Ok(IncidentSubmission {
            category,
            description: draft.description.clone(),
            latitude: location.lat(),
            longitude: location.lon(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coord(lat: f64, lon: f64) -> ValidatedCoordinate {
        ValidatedCoordinate::new(lat, lon).unwrap()
    }

    fn filled_flow(category: IncidentCategory) -> IncidentReportFlow {
        let mut flow = IncidentReportFlow::new();
        flow.set_category(category);
        flow.set_description("Two men following a woman near the bus stand");
        flow.select_location(coord(30.3398, 76.3869));
        flow
    }

    #[test]
    fn test_starts_editing_with_default_draft() {
        let flow = IncidentReportFlow::new();
        assert_eq!(flow.phase(), ReportPhase::Editing);
        assert_eq!(flow.draft(), &IncidentDraft::default());
        assert!(!flow.shows_custom_category());
    }

    #[test]
    fn test_submit_without_location_fails_first() {
        let mut flow = IncidentReportFlow::new();
        flow.set_category(IncidentCategory::Other);

        let result = flow.submit();

        assert_eq!(
            result,
            Err(ReportError::Validation(ValidationError::LocationRequired))
        );
        assert_eq!(flow.phase(), ReportPhase::Editing);
        assert_eq!(flow.error(), Some("Please select a location on the map"));
    }

    #[test]
    fn test_submit_sends_selected_category() {
        let mut flow = filled_flow(IncidentCategory::Fire);
        let submission = flow.submit().unwrap();

        assert_eq!(submission.category, "fire");
        assert_eq!(submission.latitude, 30.3398);
        assert_eq!(submission.longitude, 76.3869);
        assert_eq!(flow.phase(), ReportPhase::Submitting);
    }

    #[test]
    fn test_other_sends_custom_text() {
        let mut flow = filled_flow(IncidentCategory::Other);
        assert!(flow.shows_custom_category());
        flow.set_custom_category("Illegal dumping");

        let submission = flow.submit().unwrap();
        assert_eq!(submission.category, "Illegal dumping");
    }

    #[test]
    fn test_other_without_custom_text_fails() {
        let mut flow = filled_flow(IncidentCategory::Other);
        flow.set_custom_category("   ");

        assert_eq!(
            flow.submit(),
            Err(ReportError::Validation(ValidationError::CustomCategoryRequired))
        );
        assert_eq!(flow.phase(), ReportPhase::Editing);
    }

    #[test]
    fn test_empty_description_fails() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        flow.set_description("  ");

        assert_eq!(
            flow.submit(),
            Err(ReportError::Validation(ValidationError::DescriptionRequired))
        );
    }

    #[test]
    fn test_leaving_other_clears_custom_text() {
        let mut flow = IncidentReportFlow::new();
        flow.set_category(IncidentCategory::Other);
        flow.set_custom_category("Stray cattle");

        flow.set_category(IncidentCategory::Accident);
        assert!(flow.draft().custom_category.is_empty());
        assert!(!flow.shows_custom_category());

        flow.set_category(IncidentCategory::Other);
        assert!(flow.draft().custom_category.is_empty());
    }

    #[test]
    fn test_stale_custom_text_never_leaks() {
        let mut flow = filled_flow(IncidentCategory::Other);
        flow.set_custom_category("Stray cattle");
        flow.set_category(IncidentCategory::Vandalism);

        let submission = flow.submit().unwrap();
        assert_eq!(submission.category, "vandalism");
    }

    #[test]
    fn test_last_location_wins() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        let fly = flow.select_location(coord(30.35, 76.40));
        assert_eq!(fly.target, coord(30.35, 76.40));

        let submission = flow.submit().unwrap();
        assert_eq!((submission.latitude, submission.longitude), (30.35, 76.40));
    }

    #[test]
    fn test_double_submit_is_rejected() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        flow.submit().unwrap();

        assert_eq!(
            flow.submit(),
            Err(ReportError::NotEditing(ReportPhase::Submitting))
        );
    }

    fn submitted(flow: &mut IncidentReportFlow) -> IdempotencyKey {
        flow.submit().unwrap();
        flow.pending_key().cloned().unwrap()
    }

    #[test]
    fn test_success_shows_thank_you_and_resets_draft() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        let key = submitted(&mut flow);

        assert!(flow.submission_succeeded(&key, None));

        assert_eq!(flow.phase(), ReportPhase::ThankYou);
        assert_eq!(flow.draft(), &IncidentDraft::default());
        assert!(flow.error().is_none());
        assert!(flow.pending_key().is_none());
    }

    #[test]
    fn test_success_outside_submitting_is_ignored() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        assert!(!flow.submission_succeeded(&IdempotencyKey::generate(), None));
        assert_eq!(flow.phase(), ReportPhase::Editing);
        assert!(flow.draft().location.is_some());
    }

    #[test]
    fn test_outcome_for_another_submission_is_ignored() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        let key = submitted(&mut flow);
        let other = IdempotencyKey::generate();

        assert!(!flow.submission_failed(
            &other,
            &ApiError::Transport {
                message: "timed out".into(),
            }
        ));
        assert!(!flow.submission_succeeded(&other, None));
        assert_eq!(flow.phase(), ReportPhase::Submitting);
        assert!(flow.error().is_none());

        assert!(flow.submission_succeeded(&key, None));
        assert_eq!(flow.phase(), ReportPhase::ThankYou);
    }

    #[test]
    fn test_each_submission_gets_a_fresh_key() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        let first = submitted(&mut flow);
        flow.submission_failed(
            &first,
            &ApiError::Transport {
                message: "offline".into(),
            },
        );

        let second = submitted(&mut flow);
        assert_ne!(first, second);
        assert!(!flow.submission_succeeded(&first, None));
        assert_eq!(flow.phase(), ReportPhase::Submitting);
    }

    #[test]
    fn test_description_is_sent_as_typed() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        flow.set_description("  Bag snatched near the gate\n");

        let submission = flow.submit().unwrap();
        assert_eq!(submission.description, "  Bag snatched near the gate\n");
    }

    #[test]
    fn test_failure_keeps_draft_and_uses_payload_message() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        let key = submitted(&mut flow);

        flow.submission_failed(
            &key,
            &ApiError::Status {
                status: 400,
                message: Some("Latitude outside service area".into()),
            },
        );

        assert_eq!(flow.phase(), ReportPhase::Editing);
        assert_eq!(flow.error(), Some("Latitude outside service area"));
        assert_eq!(flow.draft().category, IncidentCategory::Theft);
        assert!(flow.draft().location.is_some());
    }

    #[test]
    fn test_failure_without_payload_uses_fallback() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        let key = submitted(&mut flow);

        flow.submission_failed(
            &key,
            &ApiError::Transport {
                message: "connection refused".into(),
            },
        );

        assert_eq!(flow.error(), Some(REPORT_FAILED_MESSAGE));
    }

    #[test]
    fn test_reset_to_editing_from_thank_you() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        let key = submitted(&mut flow);
        flow.submission_succeeded(&key, None);

        flow.reset_to_editing();
        assert_eq!(flow, IncidentReportFlow::new());
    }

    #[test]
    fn test_reset_to_editing_ignored_while_editing() {
        let mut flow = filled_flow(IncidentCategory::Theft);
        flow.reset_to_editing();
        assert!(flow.draft().location.is_some());
    }

    proptest! {
        #[test]
        fn prop_non_other_categories_submit_as_selected(
            category in prop::sample::select(
                IncidentCategory::ALL
                    .into_iter()
                    .filter(|c| *c != IncidentCategory::Other)
                    .collect::<Vec<_>>()
            ),
            description in "[a-zA-Z][a-zA-Z ]{0,40}",
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
        ) {
            let mut flow = IncidentReportFlow::new();
            flow.set_category(category);
            flow.set_description(description);
            flow.select_location(coord(lat, lon));

            let submission = flow.submit().unwrap();
            prop_assert_eq!(submission.category, category.as_str());
        }

        #[test]
        fn prop_missing_location_always_fails(
            category in prop::sample::select(IncidentCategory::ALL.to_vec()),
            custom in ".{0,20}",
            description in ".{0,40}",
        ) {
            let mut flow = IncidentReportFlow::new();
            flow.set_category(category);
            flow.set_custom_category(custom);
            flow.set_description(description);

            prop_assert_eq!(
                flow.submit(),
                Err(ReportError::Validation(ValidationError::LocationRequired))
            );
            prop_assert_eq!(flow.phase(), ReportPhase::Editing);
        }
    }
}
