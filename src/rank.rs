//! Cluster ranking and summary statistics.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::biography::BiographySummary;
use crate::cluster::PersonCluster;
use crate::conflict::{HIGH_CONFIDENCE, MEDIUM_CONFIDENCE};
use crate::result::{DomainCount, ResultSummary};

/// Ranking order: confidence descending, then source count descending, then
/// earliest original evidence first.
#[must_use]
pub fn compare(a: &PersonCluster, b: &PersonCluster) -> Ordering {
    b.confidence
        .cmp(&a.confidence)
        .then_with(|| b.source_count().cmp(&a.source_count()))
        .then_with(|| a.first_evidence_index().cmp(&b.first_evidence_index()))
}

/// Sorts clusters into ranking order.
pub fn rank(clusters: &mut [PersonCluster]) {
    clusters.sort_by(compare);
}

/// Most frequent source domains, count descending then name ascending.
#[must_use]
pub fn top_domains(clusters: &[PersonCluster], limit: usize) -> Vec<DomainCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for source in clusters.iter().flat_map(|c| &c.sources) {
        if !source.domain.is_empty() {
            *counts.entry(source.domain.as_str()).or_default() += 1;
        }
    }
    let mut ranked: Vec<DomainCount> = counts
        .into_iter()
        .map(|(domain, count)| DomainCount {
            domain: domain.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps the BTreeMap's alphabetical order among equal counts.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

/// Builds summary statistics for ranked clusters.
#[must_use]
pub fn summarize(clusters: &[PersonCluster], excluded_sources: usize, top_domain_limit: usize) -> ResultSummary {
    let mut summary = ResultSummary {
        total_sources: clusters.iter().map(PersonCluster::source_count).sum(),
        total_clusters: clusters.len(),
        excluded_sources,
        top_domains: top_domains(clusters, top_domain_limit),
        biography: BiographySummary::from_clusters(clusters),
        ..ResultSummary::default()
    };
    for cluster in clusters {
        match cluster.confidence {
            c if c > HIGH_CONFIDENCE => summary.high_confidence_clusters += 1,
            c if c >= MEDIUM_CONFIDENCE => summary.medium_confidence_clusters += 1,
            _ => summary.low_confidence_clusters += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::test_support::*;
    use crate::evidence::{EvidenceItem, PersonAttributes};

    fn clusters(specs: &[(&str, u8)]) -> Vec<PersonCluster> {
        let items: Vec<EvidenceItem> = specs
            .iter()
            .map(|(url, _)| item(url, PersonAttributes::default()))
            .collect();
        let evidence = scored(&items);
        evidence
            .iter()
            .zip(specs)
            .map(|(e, (_, confidence))| {
                let mut c = PersonCluster::found(&jane(), e);
                c.confidence = *confidence;
                c
            })
            .collect()
    }

    #[test]
    fn ranks_by_confidence_then_sources_then_index() {
        let mut cs = clusters(&[("https://a.test", 40), ("https://b.test", 90), ("https://c.test", 40)]);
        let items = vec![item("https://d.test", PersonAttributes::default())];
        let mut extra = scored(&items);
        extra[0].index = 7;
        cs[2].absorb(&extra[0]);

        rank(&mut cs);
        let order: Vec<usize> = cs.iter().map(PersonCluster::first_evidence_index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn equal_clusters_keep_evidence_order() {
        let mut cs = clusters(&[("https://a.test", 50), ("https://b.test", 50)]);
        cs.reverse();
        rank(&mut cs);
        assert_eq!(cs[0].first_evidence_index(), 0);
    }

    #[test]
    fn summary_buckets_and_domains() {
        let cs = clusters(&[
            ("https://www.linkedin.com/in/x", 80),
            ("https://linkedin.com/in/y", 70),
            ("https://b.test", 40),
            ("https://a.test", 39),
            ("not a url", 10),
        ]);
        let summary = summarize(&cs, 2, 2);
        assert_eq!(summary.total_sources, 5);
        assert_eq!(summary.total_clusters, 5);
        assert_eq!(summary.excluded_sources, 2);
        assert_eq!(summary.high_confidence_clusters, 1);
        assert_eq!(summary.medium_confidence_clusters, 2);
        assert_eq!(summary.low_confidence_clusters, 2);
        assert_eq!(
            summary.top_domains,
            vec![
                DomainCount {
                    domain: "linkedin.com".into(),
                    count: 2
                },
                DomainCount {
                    domain: "a.test".into(),
                    count: 1
                },
            ]
        );
        assert!(summary.biography.is_none());
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let summary = summarize(&[], 0, 5);
        assert_eq!(summary, ResultSummary::default());
    }
}
