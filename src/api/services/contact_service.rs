//! Contact form validation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

const MAX_NAME_LEN: usize = 120;
const MAX_EMAIL_LEN: usize = 254;
const MAX_COMPANY_LEN: usize = 120;
const MIN_MESSAGE_LEN: usize = 10;
const MAX_MESSAGE_LEN: usize = 5_000;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@<>]+@[^\s@<>]+\.[A-Za-z]{2,}$").expect("email pattern is valid")
});

/// Raw contact form body; every field optional so validation can report
/// which one is wrong.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub company: Option<String>,
}

/// A validated, trimmed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
    pub company: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContactError {
    #[error("Name is required")]
    MissingName,
    #[error("Name must be at most 120 characters")]
    NameTooLong,
    #[error("A valid email address is required")]
    InvalidEmail,
    #[error("Message must be between 10 and 5000 characters")]
    InvalidMessage,
    #[error("Company must be at most 120 characters")]
    CompanyTooLong,
}

impl ContactSubmission {
    pub fn validate(request: ContactRequest) -> Result<Self, ContactError> {
        let name = trimmed(request.name).ok_or(ContactError::MissingName)?;
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ContactError::NameTooLong);
        }

        let email = trimmed(request.email).ok_or(ContactError::InvalidEmail)?;
        if email.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(&email) {
            return Err(ContactError::InvalidEmail);
        }

        let message = trimmed(request.message).ok_or(ContactError::InvalidMessage)?;
        let message_len = message.chars().count();
        if !(MIN_MESSAGE_LEN..=MAX_MESSAGE_LEN).contains(&message_len) {
            return Err(ContactError::InvalidMessage);
        }

        let company = trimmed(request.company);
        if company
            .as_ref()
            .is_some_and(|c| c.chars().count() > MAX_COMPANY_LEN)
        {
            return Err(ContactError::CompanyTooLong);
        }

        Ok(Self {
            name,
            email,
            message,
            company,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
