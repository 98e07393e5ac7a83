use std::collections::BTreeSet;

use personlink::cluster::ScoredEvidence;
use personlink::merge::merge;
use personlink::{
    ClusteringStrategyKind, ConfidenceScorer, DomainTrustTable, EvidenceItem, PersonAttributes, PersonCluster,
    ResolveRequest, Resolver, ResolverConfig, SocialProfile, SourcePolicy, TargetIdentity,
};

fn jane() -> TargetIdentity {
    TargetIdentity::new("Jane", "Doe", "jane@acme.com").unwrap()
}

/// Small linear congruential generator so corpora are varied but repeatable.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> Option<&'a str> {
        let idx = (self.next() % (options.len() as u64 + 1)) as usize;
        options.get(idx).copied()
    }
}

fn corpus(seed: u64, n: usize) -> Vec<EvidenceItem> {
    let mut rng = Lcg(seed);
    let domains = ["linkedin.com", "github.com", "acme.com", "globex.com", "news.test", "mit.edu", "blog.test"];
    (0..n)
        .map(|i| {
            let attrs = PersonAttributes {
                name: rng.pick(&["Jane Doe", "J. Doe", "Jane A. Doe", "John Smith"]).map(Into::into),
                email: rng.pick(&["jane@acme.com", "jdoe@globex.com", "j@doe.dev"]).map(Into::into),
                phone: rng.pick(&["+1 555 0100", "555-0199"]).map(Into::into),
                company: rng.pick(&["Acme Corp", "Globex", "Initech"]).map(Into::into),
                title: rng.pick(&["Engineer", "Senior Engineer", "Director"]).map(Into::into),
                location: rng.pick(&["Berlin", "Austin"]).map(Into::into),
                social_profiles: rng
                    .pick(&["jdoe", "janedoe"])
                    .map(|u| vec![SocialProfile::new("github", format!("https://github.com/{u}"), u)])
                    .unwrap_or_default(),
                skills: rng.pick(&["Rust", "Python"]).map(|s| vec![s.to_string()]).unwrap_or_default(),
                ..PersonAttributes::default()
            };
            let domain = domains[(rng.next() % domains.len() as u64) as usize];
            let title = if rng.next() % 2 == 0 { "Jane Doe - profile" } else { "" };
            EvidenceItem::new(format!("https://{domain}/p/{i}"), title, "", attrs)
        })
        .collect()
}

#[test]
fn resolution_is_deterministic() {
    for strategy in [ClusteringStrategyKind::RuleBased, ClusteringStrategyKind::FeatureVector] {
        let resolver = Resolver::new(ResolverConfig::with_strategy(strategy)).unwrap();
        for seed in 0..8 {
            let request = ResolveRequest::new(jane(), corpus(seed, 12));
            assert_eq!(resolver.resolve(&request), resolver.resolve(&request));
        }
    }
}

#[test]
fn every_item_lands_in_exactly_one_cluster() {
    let config = ResolverConfig {
        source_policy: SourcePolicy::default().exclude("blog.test"),
        ..ResolverConfig::default()
    };
    for strategy in [ClusteringStrategyKind::RuleBased, ClusteringStrategyKind::FeatureVector] {
        let resolver = Resolver::new(ResolverConfig {
            strategy,
            ..config.clone()
        })
        .unwrap();
        for seed in 0..8 {
            let evidence = corpus(seed, 15);
            let excluded: BTreeSet<usize> = evidence
                .iter()
                .enumerate()
                .filter(|(_, e)| e.domain == "blog.test")
                .map(|(i, _)| i)
                .collect();
            let result = resolver.resolve(&ResolveRequest::new(jane(), evidence.clone()));

            let mut seen = BTreeSet::new();
            for source in result.clusters.iter().flat_map(|c| &c.sources) {
                assert!(seen.insert(source.evidence_index), "index {} seen twice", source.evidence_index);
            }
            let expected: BTreeSet<usize> = (0..evidence.len()).filter(|i| !excluded.contains(i)).collect();
            assert_eq!(seen, expected);
            assert_eq!(result.summary.total_sources + result.summary.excluded_sources, evidence.len());
        }
    }
}

#[test]
fn merging_twice_changes_nothing() {
    for (seed, item) in corpus(42, 20).into_iter().enumerate() {
        let mut base = corpus(seed as u64, 1).remove(0).attributes;
        merge(&mut base, &item.attributes);
        let once = base.clone();
        merge(&mut base, &item.attributes);
        assert_eq!(base, once);
    }
}

#[test]
fn confidence_stays_in_bounds() {
    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    for seed in 0..16 {
        let result = resolver.resolve(&ResolveRequest::new(jane(), corpus(seed, 25)));
        for cluster in &result.clusters {
            assert!(cluster.confidence <= 100);
            let breakdown = cluster.confidence_breakdown.as_ref().unwrap();
            assert_eq!(breakdown.total(), cluster.confidence);
        }
    }
}

#[test]
fn adding_target_email_evidence_never_lowers_confidence() {
    let target = jane();
    let trust = DomainTrustTable::default();
    let scorer = ConfidenceScorer::new(&target, &trust);

    for seed in 0..8 {
        let mut items = corpus(seed, 8);
        for item in &mut items {
            item.attributes.email = Some("jane@acme.com".into());
        }
        let evidence: Vec<ScoredEvidence<'_>> = items
            .iter()
            .enumerate()
            .map(|(index, item)| ScoredEvidence {
                index,
                item,
                relevance: ((seed as usize * 31 + index * 17) % 101) as u8,
                snippet_only: false,
            })
            .collect();

        let mut cluster = PersonCluster::found(&target, &evidence[0]);
        scorer.apply(&mut cluster);
        let mut previous = cluster.confidence;
        for scored in &evidence[1..] {
            cluster.absorb(scored);
            scorer.apply(&mut cluster);
            assert!(
                cluster.confidence >= previous,
                "confidence dropped from {previous} to {}",
                cluster.confidence
            );
            previous = cluster.confidence;
        }
    }
}
