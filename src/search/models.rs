//! Search types and validated search requests

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Kind of data being searched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Email,
    Password,
    Username,
    FullName,
    IpAddress,
    PhoneNumber,
    Hash,
    Domain,
}

impl SearchType {
    /// Every search type, in the order the picker shows them
    pub const ALL: [SearchType; 8] = [
        SearchType::Email,
        SearchType::Password,
        SearchType::Username,
        SearchType::FullName,
        SearchType::IpAddress,
        SearchType::PhoneNumber,
        SearchType::Hash,
        SearchType::Domain,
    ];

    /// Human label, e.g. `IP Address`
    pub fn label(&self) -> &'static str {
        match self {
            SearchType::Email => "Email",
            SearchType::Password => "Password",
            SearchType::Username => "Username",
            SearchType::FullName => "Full Name",
            SearchType::IpAddress => "IP Address",
            SearchType::PhoneNumber => "Phone Number",
            SearchType::Hash => "Hash",
            SearchType::Domain => "Domain",
        }
    }

    /// Lowercase name used in messages, e.g. `ip address`
    pub fn name(&self) -> String {
        self.label().to_lowercase()
    }

    /// Segment used in the API path: spaces become underscores
    pub fn path_segment(&self) -> String {
        self.name().replace(' ', "_")
    }

    /// Picker button text
    pub fn prompt(&self) -> String {
        format!("Search by {}", self.label())
    }

    /// Label for the term input field
    pub fn input_label(&self) -> String {
        format!("Enter {}", self.name())
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown search type '{0}' (expected one of: email, password, username, full_name, ip_address, phone_number, hash, domain)")]
pub struct ParseSearchTypeError(String);

impl FromStr for SearchType {
    type Err = ParseSearchTypeError;

    /// Accepts labels, lowercase names and snake_case names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        SearchType::ALL
            .into_iter()
            .find(|t| t.name() == normalized)
            .ok_or_else(|| ParseSearchTypeError(s.to_string()))
    }
}

/// Why a term was rejected before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The {0} to search for cannot be empty.")]
    EmptyTerm(SearchType),
    #[error("The provided email is invalid. Please enter a valid email address.")]
    InvalidEmail,
}

/// A search type and term that passed validation.
///
/// The term is interpolated into the request path unescaped, so only
/// requests built through [`SearchRequest::new`] reach the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    search_type: SearchType,
    term: String,
}

impl SearchRequest {
    pub fn new(search_type: SearchType, term: impl Into<String>) -> Result<Self, ValidationError> {
        let term = term.into();
        if term.trim().is_empty() {
            return Err(ValidationError::EmptyTerm(search_type));
        }
        if search_type == SearchType::Email && !is_valid_email(&term) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(Self { search_type, term })
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

/// Structural email check applied to email searches
pub fn is_valid_email(term: &str) -> bool {
    EMAIL_RE.is_match(term)
}
