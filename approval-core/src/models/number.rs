use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    static ref APPLICATION_NUMBER_PATTERN: Regex = Regex::new(r"^([A-Z]{2})-(\d{4})-(\d{6})$")
        .expect("application number pattern is a valid regex");
}

const MIN_YEAR: i32 = 2020;
const MAX_SEQUENCE: u32 = 999_999;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplicationNumberError {
    #[error("application number is required")]
    Empty,
    #[error("malformed application number '{0}', expected XX-YYYY-NNNNNN")]
    Malformed(String),
    #[error("type code '{0}' must be two upper-case letters")]
    InvalidPrefix(String),
    #[error("year {0} is outside the supported range")]
    InvalidYear(i32),
    #[error("sequence {0} is outside 1..=999999")]
    InvalidSequence(u32),
}

/// Human-facing application identifier, e.g. `EX-2024-000042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationNumber {
    prefix: String,
    year: i32,
    sequence: u32,
}

impl ApplicationNumber {
    pub fn new(prefix: &str, year: i32, sequence: u32) -> Result<Self, ApplicationNumberError> {
        if prefix.len() != 2 || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ApplicationNumberError::InvalidPrefix(prefix.to_string()));
        }
        if !(MIN_YEAR..=9999).contains(&year) {
            return Err(ApplicationNumberError::InvalidYear(year));
        }
        if sequence == 0 || sequence > MAX_SEQUENCE {
            return Err(ApplicationNumberError::InvalidSequence(sequence));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            year,
            sequence,
        })
    }

    /// Two-letter prefix derived from an application type code:
    /// the first two ASCII letters, upper-cased.
    pub fn prefix_for(type_code: &str) -> Result<String, ApplicationNumberError> {
        let prefix: String = type_code
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .take(2)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if prefix.len() != 2 {
            return Err(ApplicationNumberError::InvalidPrefix(type_code.to_string()));
        }
        Ok(prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for ApplicationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}-{:06}", self.prefix, self.year, self.sequence)
    }
}

impl FromStr for ApplicationNumber {
    type Err = ApplicationNumberError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ApplicationNumberError::Empty);
        }
        let captures = APPLICATION_NUMBER_PATTERN
            .captures(value)
            .ok_or_else(|| ApplicationNumberError::Malformed(value.to_string()))?;
        let year = captures[2]
            .parse()
            .map_err(|_| ApplicationNumberError::Malformed(value.to_string()))?;
        let sequence = captures[3]
            .parse()
            .map_err(|_| ApplicationNumberError::Malformed(value.to_string()))?;
        Self::new(&captures[1], year, sequence)
    }
}

impl TryFrom<String> for ApplicationNumber {
    type Error = ApplicationNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApplicationNumber> for String {
    fn from(number: ApplicationNumber) -> Self {
        number.to_string()
    }
}
