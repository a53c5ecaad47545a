//! Benchmarks for the synchronous part of gesture handling.
//!
//! Catalog lookup and target resolution run on the dispatch actor for every
//! released gesture; intent URI parsing runs whenever a user target is a
//! shortcut. All of them should stay well under a millisecond so the actor
//! never lags behind the input stream.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use gesture_core::preferences::{GESTURE_S_TARGET, GESTURE_W_TARGET};
use gesture_core::InMemoryPreferences;
use gesture_dispatch::catalog::{SLIDE_E, SLIDE_S, SLIDE_W};
use gesture_dispatch::{target, ActionCatalog, IntentSpec, TorchState};

const SHORTCUT: &str = "intent://example.com/search#Intent;scheme=https;\
    action=android.intent.action.VIEW;category=android.intent.category.BROWSABLE;\
    component=org.mozilla.firefox/.App;launchFlags=0x10200000;S.query=rust%20lang;\
    B.private=true;i.tab=3;end";

fn bench_catalog_lookup(c: &mut Criterion) {
    let catalog = ActionCatalog::new();
    let codes: Vec<u32> = (240..270).collect();

    let mut group = c.benchmark_group("catalog");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("lookup_mixed_scancodes", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let code = codes[idx % codes.len()];
            idx += 1;
            catalog.lookup(code.into()).is_some()
        });
    });

    group.finish();
}

fn bench_target_resolution(c: &mut Criterion) {
    let catalog = ActionCatalog::new();
    let prefs = InMemoryPreferences::new();
    prefs.set(GESTURE_W_TARGET, "org.mozilla.firefox");
    prefs.set(GESTURE_S_TARGET, SHORTCUT);
    let torch = TorchState::new(Some("0".to_string()));

    let mut group = c.benchmark_group("target_resolution");
    group.measurement_time(Duration::from_secs(5));

    for (name, code) in [("fixed", SLIDE_E), ("package", SLIDE_W), ("intent_uri", SLIDE_S)] {
        let action = catalog.lookup(code).expect("gesture in catalog");
        group.bench_function(name, |b| b.iter(|| target::resolve(action, &prefs, &torch)));
    }

    group.finish();
}

fn bench_intent_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("intent_spec");
    group.sample_size(200);

    group.bench_function("parse_shortcut", |b| b.iter(|| IntentSpec::parse(SHORTCUT)));

    group.finish();
}

criterion_group!(
    benches,
    bench_catalog_lookup,
    bench_target_resolution,
    bench_intent_parse
);
criterion_main!(benches);
