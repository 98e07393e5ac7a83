use std::time::Duration;

use personlink::{
    EvidenceItem, PersonAttributes, ResolveRequest, Resolver, ResolverConfig, ResolverRuntime, RuntimeConfig,
    TargetIdentity,
};

fn request_for(first: &str, last: &str, email: &str, items: usize) -> ResolveRequest {
    let target = TargetIdentity::new(first, last, email).unwrap();
    let evidence = (0..items)
        .map(|i| {
            let attrs = PersonAttributes {
                name: Some(format!("{first} {last}")),
                email: Some(email.to_string()),
                ..PersonAttributes::default()
            };
            EvidenceItem::new(format!("https://site{i}.test/{last}"), "", "", attrs)
        })
        .collect();
    ResolveRequest::new(target, evidence)
}

#[test]
fn concurrent_runs_match_sequential_runs() {
    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let requests = vec![
        request_for("Jane", "Doe", "jane@acme.com", 4),
        request_for("John", "Smith", "john@globex.com", 6),
        request_for("Ada", "Lovelace", "ada@engine.org", 3),
        request_for("Alan", "Turing", "alan@bletchley.uk", 5),
    ];
    let expected: Vec<_> = requests.iter().map(|r| resolver.resolve(r)).collect();

    let runtime = ResolverRuntime::new(
        resolver,
        RuntimeConfig {
            workers: 3,
            queue_capacity: 16,
        },
    )
    .unwrap();
    let handles: Vec<_> = requests.into_iter().map(|r| runtime.submit(r).unwrap()).collect();

    for (handle, expected) in handles.into_iter().zip(expected) {
        let result = handle.join_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result, expected);
        assert_eq!(result.clusters.len(), 1);
    }
}

#[test]
fn runtime_shares_one_resolver_across_threads() {
    let runtime = ResolverRuntime::new(Resolver::new(ResolverConfig::default()).unwrap(), RuntimeConfig::default()).unwrap();
    std::thread::scope(|scope| {
        for i in 0..4 {
            let runtime = &runtime;
            scope.spawn(move || {
                let result = runtime
                    .resolve(request_for("Jane", "Doe", "jane@acme.com", i + 1))
                    .unwrap();
                assert_eq!(result.summary.total_sources, i + 1);
            });
        }
    });
    assert_eq!(runtime.resolver().config().top_domain_limit, 5);
}
