//! Admin allow-list authorization

use std::collections::HashSet;

/// Fixed set of admin emails, loaded once at process start.
///
/// Emails are normalized to lowercase at construction so membership checks
/// are a single hash lookup with no allocation beyond the probe key. The
/// list is never mutated at runtime.
#[derive(Debug, Clone)]
pub struct AdminAllowList {
    emails: HashSet<String>,
}

impl AdminAllowList {
    /// Build the allow-list from configured emails
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Check whether an email belongs to an administrator.
    ///
    /// Case-insensitive. Missing or empty emails are never admins.
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim();
        if email.is_empty() {
            return false;
        }
        self.emails.contains(&email.to_lowercase())
    }

    /// Number of configured admins
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Iterate the normalized admin emails
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }
}
