//! Optional biographical-profile collaborator.
//!
//! A [`BiographyAnalyzer`] reads a cluster's merged evidence and infers a
//! coarse career picture. The confidence scorer takes the profile as an
//! optional second input; without one the baseline score is untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cluster::PersonCluster;
use crate::identity::{contains_phrase, has_keyword, normalize, words, TargetIdentity};

/// Ceiling of [`BiographicalProfile::confidence_bonus`].
pub const MAX_BIOGRAPHY_BONUS: u8 = 20;

const POINTS_PER_SIGNAL: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerStage {
    Student,
    EarlyCareer,
    MidCareer,
    Established,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Junior,
    MidLevel,
    Senior,
    Lead,
    Executive,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Technology,
    Finance,
    Healthcare,
    Education,
    Government,
    Media,
    Legal,
    Consulting,
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Technology => "technology",
            Self::Finance => "finance",
            Self::Healthcare => "healthcare",
            Self::Education => "education",
            Self::Government => "government",
            Self::Media => "media",
            Self::Legal => "legal",
            Self::Consulting => "consulting",
        };
        f.write_str(s)
    }
}

/// Highest degree evidenced. Ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    Unknown,
    Other,
    Bachelors,
    Masters,
    Doctorate,
}

/// Inferred career picture for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiographicalProfile {
    pub career_stage: CareerStage,
    pub seniority: Seniority,
    pub industry: Option<Industry>,
    pub education_level: EducationLevel,
    /// 0-100, from achievements and public-speaking/publication signals.
    pub thought_leadership: u8,
    /// Human-readable reasons behind the inference.
    pub signals: Vec<String>,
}

impl BiographicalProfile {
    /// Whether career stage and seniority agree with each other.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !matches!(
            (self.career_stage, self.seniority),
            (CareerStage::Student, Seniority::Lead | Seniority::Senior | Seniority::Executive)
                | (CareerStage::EarlyCareer, Seniority::Executive)
        )
    }

    /// Bonus added on top of the baseline confidence, at most
    /// [`MAX_BIOGRAPHY_BONUS`].
    ///
    /// Four points for each known dimension plus up to four for thought
    /// leadership; halved when stage and seniority contradict each other.
    #[must_use]
    pub fn confidence_bonus(&self) -> u8 {
        let mut bonus = 0u8;
        if self.career_stage != CareerStage::Unknown {
            bonus += POINTS_PER_SIGNAL;
        }
        if self.seniority != Seniority::Unknown {
            bonus += POINTS_PER_SIGNAL;
        }
        if self.industry.is_some() {
            bonus += POINTS_PER_SIGNAL;
        }
        if self.education_level != EducationLevel::Unknown {
            bonus += POINTS_PER_SIGNAL;
        }
        bonus += self.thought_leadership.min(100) / 25;
        if !self.is_consistent() {
            bonus /= 2;
        }
        bonus.min(MAX_BIOGRAPHY_BONUS)
    }
}

/// Infers a biographical profile for a cluster.
pub trait BiographyAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns `None` when the cluster carries nothing to analyze.
    fn analyze(&self, target: &TargetIdentity, cluster: &PersonCluster) -> Option<BiographicalProfile>;
}

const SENIORITY_KEYWORDS: &[(&str, Seniority)] = &[
    ("chief", Seniority::Executive),
    ("ceo", Seniority::Executive),
    ("cto", Seniority::Executive),
    ("cfo", Seniority::Executive),
    ("founder", Seniority::Executive),
    ("president", Seniority::Executive),
    ("vice president", Seniority::Executive),
    ("vp", Seniority::Executive),
    ("director", Seniority::Lead),
    ("head of", Seniority::Lead),
    ("principal", Seniority::Lead),
    ("lead", Seniority::Lead),
    ("manager", Seniority::Lead),
    ("staff", Seniority::Senior),
    ("senior", Seniority::Senior),
    ("sr", Seniority::Senior),
    ("junior", Seniority::Junior),
    ("jr", Seniority::Junior),
    ("intern", Seniority::Junior),
    ("associate", Seniority::Junior),
    ("assistant", Seniority::Junior),
];

const STUDENT_KEYWORDS: &[&str] = &["student", "phd candidate", "undergraduate", "graduate student", "intern"];

const INDUSTRY_KEYWORDS: &[(&str, Industry)] = &[
    ("software", Industry::Technology),
    ("engineer", Industry::Technology),
    ("engineering", Industry::Technology),
    ("developer", Industry::Technology),
    ("data", Industry::Technology),
    ("cloud", Industry::Technology),
    ("tech", Industry::Technology),
    ("bank", Industry::Finance),
    ("banking", Industry::Finance),
    ("capital", Industry::Finance),
    ("finance", Industry::Finance),
    ("investment", Industry::Finance),
    ("accounting", Industry::Finance),
    ("hospital", Industry::Healthcare),
    ("health", Industry::Healthcare),
    ("healthcare", Industry::Healthcare),
    ("medical", Industry::Healthcare),
    ("clinic", Industry::Healthcare),
    ("pharma", Industry::Healthcare),
    ("university", Industry::Education),
    ("professor", Industry::Education),
    ("lecturer", Industry::Education),
    ("school", Industry::Education),
    ("ministry", Industry::Government),
    ("department of", Industry::Government),
    ("agency", Industry::Government),
    ("council", Industry::Government),
    ("journalist", Industry::Media),
    ("editor", Industry::Media),
    ("news", Industry::Media),
    ("media", Industry::Media),
    ("law", Industry::Legal),
    ("legal", Industry::Legal),
    ("attorney", Industry::Legal),
    ("lawyer", Industry::Legal),
    ("counsel", Industry::Legal),
    ("consulting", Industry::Consulting),
    ("consultant", Industry::Consulting),
    ("advisory", Industry::Consulting),
];

const DEGREE_KEYWORDS: &[(&str, EducationLevel)] = &[
    ("phd", EducationLevel::Doctorate),
    ("ph.d", EducationLevel::Doctorate),
    ("doctor", EducationLevel::Doctorate),
    ("dphil", EducationLevel::Doctorate),
    ("doctorate", EducationLevel::Doctorate),
    ("master", EducationLevel::Masters),
    ("masters", EducationLevel::Masters),
    ("mba", EducationLevel::Masters),
    ("msc", EducationLevel::Masters),
    ("m.s.", EducationLevel::Masters),
    ("bachelor", EducationLevel::Bachelors),
    ("bachelors", EducationLevel::Bachelors),
    ("bsc", EducationLevel::Bachelors),
    ("b.s.", EducationLevel::Bachelors),
    ("b.a.", EducationLevel::Bachelors),
    ("ba", EducationLevel::Bachelors),
];

const THOUGHT_LEADERSHIP_KEYWORDS: &[&str] = &[
    "keynote",
    "speaker",
    "author",
    "published",
    "publication",
    "patent",
    "award",
    "fellow",
    "board",
    "editor",
];

/// Keyword-table analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicBiographyAnalyzer;

impl HeuristicBiographyAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn seniority(title: &[String]) -> Option<(Seniority, &'static str)> {
        SENIORITY_KEYWORDS
            .iter()
            .find(|(kw, _)| contains_phrase(title, kw))
            .map(|(kw, s)| (*s, *kw))
    }

    fn industry<'t>(texts: impl Iterator<Item = &'t str>) -> Option<Industry> {
        let mut votes: BTreeMap<Industry, usize> = BTreeMap::new();
        for text in texts {
            let text = words(text);
            for (kw, industry) in INDUSTRY_KEYWORDS {
                if contains_phrase(&text, kw) {
                    *votes.entry(*industry).or_default() += 1;
                }
            }
        }
        // Highest vote; BTreeMap order breaks ties.
        let mut best: Option<(Industry, usize)> = None;
        for (industry, count) in votes {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((industry, count));
            }
        }
        best.map(|(industry, _)| industry)
    }

    fn education_level(entries: &[String]) -> EducationLevel {
        if entries.is_empty() {
            return EducationLevel::Unknown;
        }
        entries
            .iter()
            .map(|entry| {
                let text = words(entry);
                DEGREE_KEYWORDS
                    .iter()
                    .filter(|(kw, _)| contains_phrase(&text, kw))
                    .map(|(_, level)| *level)
                    .max()
                    .unwrap_or(EducationLevel::Other)
            })
            .max()
            .unwrap_or(EducationLevel::Unknown)
    }
}

impl BiographyAnalyzer for HeuristicBiographyAnalyzer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn analyze(&self, _target: &TargetIdentity, cluster: &PersonCluster) -> Option<BiographicalProfile> {
        let attrs = &cluster.merged_evidence;
        let title = attrs.title().map(normalize).unwrap_or_default();
        let company = attrs.company().map(normalize).unwrap_or_default();

        if title.is_empty()
            && company.is_empty()
            && attrs.education.is_empty()
            && attrs.achievements.is_empty()
            && attrs.skills.is_empty()
            && attrs.affiliations.is_empty()
        {
            return None;
        }

        let mut signals = Vec::new();

        let title_words = words(&title);
        let seniority = match Self::seniority(&title_words) {
            Some((level, kw)) => {
                signals.push(format!("title keyword '{kw}'"));
                level
            }
            None if !title.is_empty() => Seniority::MidLevel,
            None => Seniority::Unknown,
        };

        let is_student = STUDENT_KEYWORDS.iter().any(|kw| contains_phrase(&title_words, kw));
        let career_stage = if is_student {
            signals.push("student title".to_string());
            CareerStage::Student
        } else {
            match seniority {
                Seniority::Executive | Seniority::Lead => CareerStage::Established,
                Seniority::Senior | Seniority::MidLevel => CareerStage::MidCareer,
                Seniority::Junior => CareerStage::EarlyCareer,
                Seniority::Unknown => CareerStage::Unknown,
            }
        };

        let lowered: Vec<String> = std::iter::once(title.clone())
            .chain(std::iter::once(company))
            .chain(attrs.skills.iter().map(|s| normalize(s)))
            .chain(attrs.affiliations.iter().map(|s| normalize(s)))
            .filter(|s| !s.is_empty())
            .collect();
        let industry = Self::industry(lowered.iter().map(String::as_str));
        if let Some(industry) = industry {
            signals.push(format!("industry {industry}"));
        }

        let education_level = Self::education_level(&attrs.education);

        let leadership_hits = attrs
            .achievements
            .iter()
            .chain(&attrs.affiliations)
            .filter(|s| has_keyword(s, THOUGHT_LEADERSHIP_KEYWORDS))
            .count();
        let raw = attrs.achievements.len() * 15 + leadership_hits * 20;
        let thought_leadership = u8::try_from(raw.min(100)).unwrap_or(100);
        if leadership_hits > 0 {
            signals.push(format!("{leadership_hits} thought-leadership mentions"));
        }

        Some(BiographicalProfile {
            career_stage,
            seniority,
            industry,
            education_level,
            thought_leadership,
            signals,
        })
    }
}

/// Roll-up of the profiles attached to a result's clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiographySummary {
    pub profiled_clusters: usize,
    pub dominant_industry: Option<Industry>,
    pub highest_education: EducationLevel,
    pub mean_thought_leadership: f64,
}

impl BiographySummary {
    /// Summarizes every profiled cluster; `None` when no cluster has a profile.
    #[must_use]
    pub fn from_clusters(clusters: &[PersonCluster]) -> Option<Self> {
        let profiles: Vec<&BiographicalProfile> = clusters.iter().filter_map(|c| c.biography.as_ref()).collect();
        if profiles.is_empty() {
            return None;
        }

        let mut votes: BTreeMap<Industry, usize> = BTreeMap::new();
        for industry in profiles.iter().filter_map(|p| p.industry) {
            *votes.entry(industry).or_default() += 1;
        }
        let mut dominant_industry: Option<(Industry, usize)> = None;
        for (industry, count) in votes {
            if dominant_industry.map_or(true, |(_, c)| count > c) {
                dominant_industry = Some((industry, count));
            }
        }

        let highest_education = profiles
            .iter()
            .map(|p| p.education_level)
            .max()
            .unwrap_or(EducationLevel::Unknown);
        let total: f64 = profiles.iter().map(|p| f64::from(p.thought_leadership)).sum();

        Some(Self {
            profiled_clusters: profiles.len(),
            dominant_industry: dominant_industry.map(|(i, _)| i),
            highest_education,
            mean_thought_leadership: total / profiles.len() as f64,
        })
    }
}
