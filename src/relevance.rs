//! Source relevance scoring.
//!
//! Relevance answers one question per evidence item, independent of
//! clustering: how strongly does this source's content point at the
//! queried identity? The score is an integer in [0, 100].

use crate::evidence::EvidenceItem;
use crate::identity::TargetIdentity;
use crate::trust::TrustModel;

const BASE: u32 = 10;
const NAME_IN_TITLE: u32 = 30;
const NAME_IN_SNIPPET: u32 = 20;
const EMAIL_IN_TITLE: u32 = 40;
const EMAIL_IN_SNIPPET: u32 = 30;
const EXTRACTED_EMAIL_MATCH: u32 = 25;
const EXTRACTED_NAME_MATCH: u32 = 20;
const EXTRACTED_SECONDARY: u32 = 10;
const EXTRACTED_SOCIAL: u32 = 15;

/// Scores evidence items against a target identity.
pub struct RelevanceScorer<'a> {
    target: &'a TargetIdentity,
    trust: &'a dyn TrustModel,
}

impl<'a> RelevanceScorer<'a> {
    #[must_use]
    pub fn new(target: &'a TargetIdentity, trust: &'a dyn TrustModel) -> Self {
        Self { target, trust }
    }

    /// Relevance of one item, clamped to 100.
    #[must_use]
    pub fn score(&self, item: &EvidenceItem) -> u8 {
        let mut score = BASE;

        if self.target.full_name_in(&item.title) {
            score += NAME_IN_TITLE;
        }
        if self.target.full_name_in(&item.snippet) {
            score += NAME_IN_SNIPPET;
        }
        if self.target.email_in(&item.title) {
            score += EMAIL_IN_TITLE;
        }
        if self.target.email_in(&item.snippet) {
            score += EMAIL_IN_SNIPPET;
        }

        score += self.trust.bonus(&item.effective_domain());

        let attrs = &item.attributes;
        if attrs.email().is_some_and(|e| self.target.matches_email(e)) {
            score += EXTRACTED_EMAIL_MATCH;
        }
        if attrs.name().is_some_and(|n| self.target.matches_name(n)) {
            score += EXTRACTED_NAME_MATCH;
        }
        for field in [attrs.phone(), attrs.company(), attrs.title()] {
            if field.is_some() {
                score += EXTRACTED_SECONDARY;
            }
        }
        if !attrs.social_profiles.is_empty() {
            score += EXTRACTED_SOCIAL;
        }

        u8::try_from(score.min(100)).unwrap_or(100)
    }
}
