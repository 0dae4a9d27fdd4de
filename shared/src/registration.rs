//! Sign-up and sign-in forms on the home page.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

use crate::capabilities::ApiError;
use crate::model::{Account, EmergencyContact, LoginCredentials, RegistrationProfile};
use crate::{
    AppError, ErrorKind, ValidationError, LOGIN_FAILED_MESSAGE, REGISTRATION_FAILED_MESSAGE,
};

pub const NAME_LEN: (usize, usize) = (2, 100);
pub const PHONE_LEN: (usize, usize) = (10, 15);
pub const PASSWORD_LEN: (usize, usize) = (6, 128);

pub const REGISTRATION_SUCCESS_MESSAGE: &str = "✓ Registration Successful!";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a request is already in flight")]
    AlreadySubmitting,
}

impl From<FormError> for AppError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::Validation(v) => v.into(),
            FormError::AlreadySubmitting => AppError::new(ErrorKind::InvalidState, e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Phone,
}

fn check_len(field: &'static str, value: &str, (min, max): (usize, usize)) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::FieldLength {
            field,
            min,
            max,
            len,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub phone: String,
    pub password: String,
    pub email: String,
    contacts: Vec<EmergencyContact>,
    submitting: bool,
    error: Option<String>,
    success: Option<String>,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: String::new(),
            password: String::new(),
            email: String::new(),
            contacts: vec![EmergencyContact::default()],
            submitting: false,
            error: None,
            success: None,
        }
    }
}

impl RegistrationForm {
    #[must_use]
    pub fn contacts(&self) -> &[EmergencyContact] {
        &self.contacts
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// The first contact row is mandatory and cannot be removed.
    #[must_use]
    pub fn can_remove_contact(&self, index: usize) -> bool {
        index > 0 && index < self.contacts.len() && self.contacts.len() > 1
    }

    pub fn add_contact(&mut self) {
        self.contacts.push(EmergencyContact::default());
    }

    pub fn remove_contact(&mut self, index: usize) -> bool {
        if !self.can_remove_contact(index) {
            return false;
        }
        self.contacts.remove(index);
        true
    }

    pub fn update_contact(&mut self, index: usize, field: ContactField, value: impl Into<String>) {
        if let Some(contact) = self.contacts.get_mut(index) {
            match field {
                ContactField::Name => contact.name = value.into(),
                ContactField::Phone => contact.phone = value.into(),
            }
        }
    }

    /// Builds the profile to send. Phone numbers go out exactly as typed.
    pub fn submit(&mut self) -> Result<RegistrationProfile, FormError> {
        if self.submitting {
            return Err(FormError::AlreadySubmitting);
        }
        self.error = None;
        self.success = None;

        match self.validate() {
            Ok(profile) => {
                self.submitting = true;
                Ok(profile)
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Err(e.into())
            }
        }
    }

    pub fn succeeded(&mut self) {
        self.password.zeroize();
        *self = Self {
            success: Some(REGISTRATION_SUCCESS_MESSAGE.to_string()),
            ..Self::default()
        };
    }

    pub fn failed(&mut self, error: &ApiError) {
        self.submitting = false;
        self.error = Some(error.user_message(REGISTRATION_FAILED_MESSAGE));
    }

    fn validate(&self) -> Result<RegistrationProfile, ValidationError> {
        let name = self.name.trim();
        check_len("name", name, NAME_LEN)?;
        check_len("phone", &self.phone, PHONE_LEN)?;
        check_len("password", &self.password, PASSWORD_LEN)?;

        if self.contacts.is_empty() {
            return Err(ValidationError::ContactsRequired);
        }
        for contact in &self.contacts {
            check_len("contact name", contact.name.trim(), NAME_LEN)?;
            check_len("contact phone", &contact.phone, PHONE_LEN)?;
        }

        let email = self.email.trim();
        Ok(RegistrationProfile {
            name: name.to_string(),
            phone: self.phone.clone(),
            password: self.password.clone(),
            email: (!email.is_empty()).then(|| email.to_string()),
            emergency_contacts: self
                .contacts
                .iter()
                .map(|c| EmergencyContact {
                    name: c.name.trim().to_string(),
                    phone: c.phone.clone(),
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginForm {
    pub phone: String,
    pub password: String,
    submitting: bool,
    error: Option<String>,
}

impl LoginForm {
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn submit(&mut self) -> Result<LoginCredentials, FormError> {
        if self.submitting {
            return Err(FormError::AlreadySubmitting);
        }
        self.error = None;

        let checked = check_len("phone", &self.phone, PHONE_LEN)
            .and_then(|()| check_len("password", &self.password, PASSWORD_LEN));
        if let Err(e) = checked {
            self.error = Some(e.user_message());
            return Err(e.into());
        }

        self.submitting = true;
        Ok(LoginCredentials {
            phone: self.phone.clone(),
            password: self.password.clone(),
        })
    }

    /// The password is dropped from memory once the server has answered.
    pub fn succeeded(&mut self, _account: &Account) {
        self.password.zeroize();
        *self = Self::default();
    }

    pub fn failed(&mut self, error: &ApiError) {
        self.submitting = false;
        self.password.zeroize();
        self.error = Some(error.user_message(LOGIN_FAILED_MESSAGE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> RegistrationForm {
        let mut form = RegistrationForm {
            name: "Priya Sharma".into(),
            phone: "9876543210".into(),
            password: "secret1".into(),
            ..RegistrationForm::default()
        };
        form.update_contact(0, ContactField::Name, "Mom");
        form.update_contact(0, ContactField::Phone, "9876000001");
        form
    }

    #[test]
    fn test_starts_with_one_contact_row() {
        let form = RegistrationForm::default();
        assert_eq!(form.contacts().len(), 1);
        assert!(!form.can_remove_contact(0));
    }

    #[test]
    fn test_first_contact_cannot_be_removed() {
        let mut form = RegistrationForm::default();
        form.add_contact();
        form.add_contact();

        assert!(!form.remove_contact(0));
        assert!(form.remove_contact(2));
        assert!(form.remove_contact(1));
        assert!(!form.remove_contact(1));
        assert_eq!(form.contacts().len(), 1);
    }

    #[test]
    fn test_update_contact_out_of_range_is_ignored() {
        let mut form = RegistrationForm::default();
        form.update_contact(5, ContactField::Name, "Nobody");
        assert_eq!(form.contacts(), &[EmergencyContact::default()]);
    }

    #[test]
    fn test_submit_builds_profile() {
        let mut form = filled_form();
        form.email = "  ".into();

        let profile = form.submit().unwrap();
        assert_eq!(profile.name, "Priya Sharma");
        assert_eq!(profile.email, None);
        assert_eq!(profile.emergency_contacts.len(), 1);
        assert!(form.is_submitting());
        assert_eq!(form.submit(), Err(FormError::AlreadySubmitting));
    }

    #[test]
    fn test_phone_is_not_normalized() {
        let mut form = filled_form();
        form.phone = "+91 98765 43210".into();
        assert_eq!(form.submit().unwrap().phone, "+91 98765 43210");
    }

    #[test]
    fn test_field_rules() {
        let mut form = filled_form();
        form.name = "P".into();
        assert!(matches!(
            form.submit(),
            Err(FormError::Validation(ValidationError::FieldLength { field: "name", .. }))
        ));
        assert!(form.error().unwrap().starts_with("Name must be between 2 and 100"));

        let mut form = filled_form();
        form.password = "12345".into();
        assert!(matches!(
            form.submit(),
            Err(FormError::Validation(ValidationError::FieldLength { field: "password", .. }))
        ));

        let mut form = filled_form();
        form.add_contact();
        assert!(matches!(
            form.submit(),
            Err(FormError::Validation(ValidationError::FieldLength {
                field: "contact name",
                ..
            }))
        ));
        assert!(!form.is_submitting());
    }

    #[test]
    fn test_success_resets_form() {
        let mut form = filled_form();
        form.add_contact();
        form.update_contact(1, ContactField::Name, "Dad");
        form.update_contact(1, ContactField::Phone, "9876000002");
        form.submit().unwrap();

        form.succeeded();

        assert_eq!(form.success(), Some("✓ Registration Successful!"));
        assert!(form.name.is_empty());
        assert_eq!(form.contacts().len(), 1);
        assert!(!form.is_submitting());
    }

    #[test]
    fn test_failure_keeps_fields() {
        let mut form = filled_form();
        form.submit().unwrap();

        form.failed(&ApiError::Status {
            status: 400,
            message: Some("Phone number already registered".into()),
        });
        assert_eq!(form.error(), Some("Phone number already registered"));
        assert_eq!(form.name, "Priya Sharma");
        assert!(!form.is_submitting());

        form.submit().unwrap();
        form.failed(&ApiError::Transport {
            message: "offline".into(),
        });
        assert_eq!(form.error(), Some(REGISTRATION_FAILED_MESSAGE));
    }

    #[test]
    fn test_login_submit_and_failure() {
        let mut login = LoginForm {
            phone: "9876543210".into(),
            password: "secret1".into(),
            ..LoginForm::default()
        };

        let credentials = login.submit().unwrap();
        assert_eq!(credentials.phone, "9876543210");

        login.failed(&ApiError::Status {
            status: 401,
            message: None,
        });
        assert_eq!(login.error(), Some(LOGIN_FAILED_MESSAGE));
        assert!(login.password.is_empty());
        assert_eq!(login.phone, "9876543210");
    }

    #[test]
    fn test_login_requires_password() {
        let mut login = LoginForm {
            phone: "9876543210".into(),
            ..LoginForm::default()
        };
        assert!(login.submit().is_err());
        assert!(!login.is_submitting());
    }
}
