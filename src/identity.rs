//! The queried identity and the matching rules every scorer shares.
//!
//! A [`TargetIdentity`] is the anchor of a resolution run: relevance,
//! clustering, feature extraction and confidence all ask the same questions
//! of it ("is this the target's email?", "does this name name the target?").
//! Keeping those rules here makes sure the components agree.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// Lowercases, trims and collapses internal whitespace.
#[must_use]
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercased words of `text`.
///
/// Splits on anything but alphanumerics, `+` and `.`, so `c++`, `node.js`
/// and `ph.d` survive as single words. Trailing periods are dropped.
#[must_use]
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '.'))
        .map(|w| w.trim_end_matches('.').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// True when `phrase` occurs in `haystack` as a run of whole words.
#[must_use]
pub fn contains_phrase(haystack: &[String], phrase: &str) -> bool {
    let needle = words(phrase);
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle.as_slice())
}

/// True when `text` contains any of `keywords` as whole words.
#[must_use]
pub fn has_keyword(text: &str, keywords: &[&str]) -> bool {
    let haystack = words(text);
    keywords.iter().any(|kw| contains_phrase(&haystack, kw))
}

/// Normalizes a phone number down to its digits.
#[must_use]
pub fn normalize_phone(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Returns true if `value` looks like an email address.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value.trim())
}

/// Case-insensitive email equality. Empty values never match.
#[must_use]
pub fn emails_equal(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    !a.is_empty() && a.eq_ignore_ascii_case(b)
}

/// Phone equality on digits only. Empty values never match.
#[must_use]
pub fn phones_equal(a: &str, b: &str) -> bool {
    let a = normalize_phone(a);
    !a.is_empty() && a == normalize_phone(b)
}

/// Loose string similarity: the same words, or one run of words inside the other.
///
/// Used for company, job-title and name comparisons.
#[must_use]
pub fn loosely_similar(a: &str, b: &str) -> bool {
    let a = words(a);
    let b = words(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    long.windows(short.len()).any(|window| window == short.as_slice())
}

/// The person being resolved.
///
/// # Examples
///
/// ```
/// use personlink::TargetIdentity;
///
/// let target = TargetIdentity::new("Jane", "Doe", "jane@acme.com").unwrap();
/// assert_eq!(target.full_name(), "Jane Doe");
/// assert!(target.matches_email("JANE@acme.com"));
/// assert!(target.matches_name("Dr. Jane Doe"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetIdentity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl TargetIdentity {
    /// Creates a validated target identity.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyTargetName` if either name is blank and
    /// `ValidationError::InvalidEmail` if the email is malformed.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();
        let email = email.into().trim().to_string();

        if first_name.is_empty() {
            return Err(ValidationError::EmptyTargetName { field: "first_name" });
        }
        if last_name.is_empty() {
            return Err(ValidationError::EmptyTargetName { field: "last_name" });
        }
        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail { value: email });
        }

        Ok(Self {
            first_name,
            last_name,
            email,
        })
    }

    /// "First Last" as queried.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// True when `text` contains the full name verbatim (case-insensitive).
    #[must_use]
    pub fn full_name_in(&self, text: &str) -> bool {
        normalize(text).contains(&normalize(&self.full_name()))
    }

    /// True when `text` contains the target email verbatim (case-insensitive).
    #[must_use]
    pub fn email_in(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.email.to_lowercase())
    }

    /// True when an extracted email is the target's email.
    #[must_use]
    pub fn matches_email(&self, candidate: &str) -> bool {
        emails_equal(&self.email, candidate)
    }

    /// True when an extracted name contains the first and last name as whole words.
    #[must_use]
    pub fn matches_name(&self, candidate: &str) -> bool {
        let candidate = words(candidate);
        let present = |part: &str| {
            let part = words(part);
            !part.is_empty() && part.iter().all(|w| candidate.contains(w))
        };
        present(&self.first_name) && present(&self.last_name)
    }

    /// Name similarity between two extracted names relative to this target.
    ///
    /// Similar when both name the target, or one contains the other.
    #[must_use]
    pub fn names_similar(&self, a: &str, b: &str) -> bool {
        if a.trim().is_empty() || b.trim().is_empty() {
            return false;
        }
        (self.matches_name(a) && self.matches_name(b)) || loosely_similar(a, b)
    }

    /// Local part of the target email (before `@`), lowercased.
    #[must_use]
    pub fn email_local_part(&self) -> String {
        self.email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// First label of the email domain, e.g. `acme` for `jane@acme.com`.
    #[must_use]
    pub fn email_domain_stem(&self) -> String {
        self.email
            .split('@')
            .nth(1)
            .and_then(|domain| domain.split('.').next())
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Lowercased tokens describing the target, used by content features.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        let candidates = [
            normalize(&self.first_name),
            normalize(&self.last_name),
            self.email_local_part(),
            self.email_domain_stem(),
        ];
        let mut tokens: Vec<String> = Vec::with_capacity(candidates.len());
        for token in candidates {
            if !token.is_empty() && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }
}

impl fmt::Display for TargetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.full_name(), self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> TargetIdentity {
        TargetIdentity::new("Jane", "Doe", "jane@acme.com").unwrap()
    }

    #[test]
    fn test_target_validation() {
        assert!(matches!(
            TargetIdentity::new(" ", "Doe", "jane@acme.com"),
            Err(ValidationError::EmptyTargetName { field: "first_name" })
        ));
        assert!(matches!(
            TargetIdentity::new("Jane", "", "jane@acme.com"),
            Err(ValidationError::EmptyTargetName { field: "last_name" })
        ));
        assert!(matches!(
            TargetIdentity::new("Jane", "Doe", "not-an-email"),
            Err(ValidationError::InvalidEmail { .. })
        ));
    }

    #[test]
    fn test_name_matching() {
        let t = jane();
        assert!(t.matches_name("jane   DOE"));
        assert!(t.matches_name("Dr. Jane A. Doe"));
        assert!(!t.matches_name("Jane Smith"));
        assert!(t.full_name_in("Profile of Jane Doe, engineer"));
        assert!(!t.full_name_in("Jane, a Doe"));
    }

    #[test]
    fn test_name_matching_requires_whole_words() {
        let t = TargetIdentity::new("Li", "Wu", "li@wu.net").unwrap();
        assert!(!t.matches_name("William Wuest"));
        assert!(!t.matches_name("Lily Wuhan"));
        assert!(t.matches_name("Wu, Li"));
        assert!(t.matches_name("Dr. Li Wu."));
        assert!(!t.names_similar("William Wuest", "Lily Wuhan"));

        let hyphenated = TargetIdentity::new("Mary-Jane", "O'Neil", "mj@acme.com").unwrap();
        assert!(hyphenated.matches_name("Mary-Jane O'Neil"));
        assert!(!hyphenated.matches_name("Mary O'Neil"));
    }

    #[test]
    fn test_keyword_matching_on_word_boundaries() {
        assert!(has_keyword("Internship program", &["internship"]));
        assert!(!has_keyword("Internal Audit Director", &["intern"]));
        assert!(has_keyword("Ph.D. in Physics", &["ph.d"]));
        assert!(has_keyword("Head of Platform", &["head of"]));
        assert!(!has_keyword("ahead of schedule", &["head of"]));
        assert!(has_keyword("C++ and Rust", &["c++"]));
    }

    #[test]
    fn test_names_similar() {
        let t = jane();
        assert!(t.names_similar("Jane Doe", "Dr. Jane Doe"));
        assert!(t.names_similar("J. Smith", "J. Smith"));
        assert!(!t.names_similar("Jane Doe", "John Roe"));
        assert!(!t.names_similar("", "Jane Doe"));
    }

    #[test]
    fn test_email_helpers() {
        let t = jane();
        assert!(t.matches_email(" Jane@ACME.com "));
        assert!(!t.matches_email(""));
        assert!(t.email_in("contact: JANE@acme.com"));
        assert_eq!(t.email_local_part(), "jane");
        assert_eq!(t.email_domain_stem(), "acme");
    }

    #[test]
    fn test_phone_and_loose_similarity() {
        assert!(phones_equal("+1 (555) 010-2000", "15550102000"));
        assert!(!phones_equal("", ""));
        assert!(loosely_similar("Acme", "Acme Corp"));
        assert!(!loosely_similar("Acme", "Globex"));
        assert!(!loosely_similar("", "Globex"));
        assert!(loosely_similar("Senior Engineer", "senior  engineer"));
        assert!(!loosely_similar("Acme", "Acmetech"));
    }

    #[test]
    fn test_tokens() {
        assert_eq!(jane().tokens(), vec!["jane", "doe", "acme"]);
    }
}
