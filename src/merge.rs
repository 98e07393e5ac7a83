//! Evidence merging.
//!
//! Scalars are first-source-wins: once a cluster has a value for a field, a
//! later source can never overwrite it. That keeps provenance ordering
//! intact. Collections are unioned with de-duplication.

use std::collections::HashSet;

use crate::evidence::{present, PersonAttributes, SocialProfile};

fn adopt_scalar(target: &mut Option<String>, incoming: &Option<String>) {
    if present(target).is_none() {
        if let Some(value) = present(incoming) {
            *target = Some(value.to_string());
        }
    }
}

/// Appends strings not already present (case-insensitive, trimmed).
fn union_strings(target: &mut Vec<String>, incoming: &[String]) {
    let mut seen: HashSet<String> = target.iter().map(|v| v.trim().to_lowercase()).collect();
    for value in incoming {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            target.push(trimmed.to_string());
        }
    }
}

/// Appends profiles whose `(platform, url)` key is new.
fn union_profiles(target: &mut Vec<SocialProfile>, incoming: &[SocialProfile]) {
    let mut seen: HashSet<(String, String)> = target.iter().map(SocialProfile::merge_key).collect();
    for profile in incoming {
        if seen.insert(profile.merge_key()) {
            target.push(profile.clone());
        }
    }
}

/// Merges `incoming` into `target`.
///
/// Re-merging a record that was already merged changes nothing.
pub fn merge(target: &mut PersonAttributes, incoming: &PersonAttributes) {
    adopt_scalar(&mut target.name, &incoming.name);
    adopt_scalar(&mut target.email, &incoming.email);
    adopt_scalar(&mut target.phone, &incoming.phone);
    adopt_scalar(&mut target.title, &incoming.title);
    adopt_scalar(&mut target.company, &incoming.company);
    adopt_scalar(&mut target.location, &incoming.location);

    union_profiles(&mut target.social_profiles, &incoming.social_profiles);
    union_strings(&mut target.skills, &incoming.skills);
    union_strings(&mut target.education, &incoming.education);
    union_strings(&mut target.achievements, &incoming.achievements);
    union_strings(&mut target.affiliations, &incoming.affiliations);
    union_strings(&mut target.websites, &incoming.websites);
}

/// Adds `name` to `variations` unless an equal (case-insensitive) entry exists.
pub fn push_name_variation(variations: &mut Vec<String>, name: &str) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    if !variations.iter().any(|v| v.eq_ignore_ascii_case(name)) {
        variations.push(name.to_string());
    }
}
