//! Evidence items and the person attributes extracted from them.
//!
//! Evidence arrives already extracted: an upstream collaborator fetched the
//! page and turned its text into [`PersonAttributes`]. Nothing here is
//! trusted to be complete or consistent; every field is optional and
//! absence is the normal case.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A social profile discovered on a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocialProfile {
    pub platform: String,
    pub url: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
}

impl SocialProfile {
    /// Creates a profile without a follower count.
    #[must_use]
    pub fn new(platform: impl Into<String>, url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            url: url.into(),
            username: username.into(),
            followers: None,
        }
    }

    /// Composite identity used for de-duplication during merge.
    #[must_use]
    pub fn merge_key(&self) -> (String, String) {
        (self.platform.to_lowercase(), self.url.trim().to_lowercase())
    }

    /// Composite identity used for cluster matching.
    #[must_use]
    pub fn account_key(&self) -> Option<(String, String)> {
        let username = self.username.trim().trim_start_matches('@').to_lowercase();
        if username.is_empty() {
            return None;
        }
        Some((self.platform.to_lowercase(), username))
    }
}

/// Person attributes extracted from a single source, or merged across many.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub social_profiles: Vec<SocialProfile>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub affiliations: Vec<String>,
    #[serde(default)]
    pub websites: Vec<String>,
}

/// Returns the value only if it is set and not blank.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl PersonAttributes {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        present(&self.name)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }

    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        present(&self.phone)
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        present(&self.title)
    }

    #[must_use]
    pub fn company(&self) -> Option<&str> {
        present(&self.company)
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        present(&self.location)
    }

    /// Number of distinct evidence field types that carry a value.
    ///
    /// Counts the six scalars and the six collections (12 at most).
    #[must_use]
    pub fn populated_field_types(&self) -> usize {
        let scalars = [
            self.name(),
            self.email(),
            self.phone(),
            self.title(),
            self.company(),
            self.location(),
        ]
        .iter()
        .filter(|v| v.is_some())
        .count();
        let collections = [
            !self.social_profiles.is_empty(),
            !self.skills.is_empty(),
            !self.education.is_empty(),
            !self.achievements.is_empty(),
            !self.affiliations.is_empty(),
            !self.websites.is_empty(),
        ]
        .iter()
        .filter(|v| **v)
        .count();
        scalars + collections
    }

    /// True when nothing at all was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.populated_field_types() == 0
    }

    /// `field:value` strings describing what this record contributes.
    #[must_use]
    pub fn contributions(&self) -> Vec<String> {
        let mut out = Vec::new();
        let scalars = [
            ("name", self.name()),
            ("email", self.email()),
            ("phone", self.phone()),
            ("title", self.title()),
            ("company", self.company()),
            ("location", self.location()),
        ];
        for (field, value) in scalars {
            if let Some(value) = value {
                out.push(format!("{field}:{value}"));
            }
        }
        for profile in &self.social_profiles {
            out.push(format!("social:{}/{}", profile.platform, profile.username));
        }
        let collections = [
            ("skill", &self.skills),
            ("education", &self.education),
            ("achievement", &self.achievements),
            ("affiliation", &self.affiliations),
            ("website", &self.websites),
        ];
        for (field, values) in collections {
            for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
                out.push(format!("{field}:{value}"));
            }
        }
        out
    }
}

/// Stable content fingerprint of an evidence item (blake3 over url/title/snippet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvidenceFingerprint([u8; 32]);

impl EvidenceFingerprint {
    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for EvidenceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Extracts the host of a source URL, lowercased with any `www.` prefix removed.
///
/// Invalid or host-less URLs yield an empty string, which is still a usable
/// (lowest-trust) grouping key.
#[must_use]
pub fn extract_domain(source_url: &str) -> String {
    url::Url::parse(source_url.trim())
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_lowercase))
        .map(|host| host.trim_start_matches("www.").to_string())
        .unwrap_or_default()
}

/// One source-derived record of candidate attributes about a person.
///
/// # Examples
///
/// ```
/// use personlink::{EvidenceItem, PersonAttributes};
///
/// let item = EvidenceItem::new(
///     "https://www.example.org/team/jane",
///     "Jane Doe - Team",
///     "Jane Doe leads platform engineering.",
///     PersonAttributes::default(),
/// );
/// assert_eq!(item.domain, "example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub attributes: PersonAttributes,
    /// Publication time reported by the source, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl EvidenceItem {
    /// Creates an evidence item, deriving `domain` from `url`.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        snippet: impl Into<String>,
        attributes: PersonAttributes,
    ) -> Self {
        let url = url.into();
        let domain = extract_domain(&url);
        Self {
            url,
            title: title.into(),
            snippet: snippet.into(),
            domain,
            attributes,
            published_at: None,
        }
    }

    /// Sets the publication time.
    #[must_use]
    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Domain used for trust and grouping; re-derived from the URL if unset.
    #[must_use]
    pub fn effective_domain(&self) -> String {
        if self.domain.trim().is_empty() {
            extract_domain(&self.url)
        } else {
            self.domain.trim().to_lowercase()
        }
    }

    /// Title and snippet joined for text matching.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.snippet)
    }

    /// Content fingerprint used for stable identifiers and tie-breaks.
    #[must_use]
    pub fn fingerprint(&self) -> EvidenceFingerprint {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.url.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.title.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.snippet.as_bytes());
        EvidenceFingerprint(*hasher.finalize().as_bytes())
    }
}
