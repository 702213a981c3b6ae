//! Repository names.
//!
//! The base name is derived from the calendar date, so two runs on the same day ask for
//! the same name and the second one collides. That is how a repeated run is detected.
//! Only after a collision does [`RepositoryNamer::unique_name`] add a random suffix.

use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryNamer {
    prefix: String,
    suffix_len: usize,
}

impl RepositoryNamer {
    pub fn new(prefix: impl Into<String>, suffix_len: usize) -> Self {
        Self {
            prefix: prefix.into(),
            // A v4 uuid in simple form has 32 hex digits.
            suffix_len: suffix_len.clamp(1, 32),
        }
    }

    /// `<prefix>-YYYYMMDD` for `date`.
    pub fn base_name(&self, date: NaiveDate) -> String {
        format!("{}-{}", self.prefix, date.format("%Y%m%d"))
    }

    /// `<base>-<suffix>`; the suffix uses only lowercase letters and digits.
    pub fn unique_name(&self, base: &str) -> String {
        let random = Uuid::new_v4().simple().to_string();
        format!("{}-{}", base, &random[..self.suffix_len])
    }
}

impl Default for RepositoryNamer {
    fn default() -> Self {
        Self::new("site", 6)
    }
}
