//! Property-style checks over randomly generated fingerprint libraries:
//! whatever the input, emitted clusters obey their structural invariants
//! and repeated searches are deterministic.

use std::path::PathBuf;

use rand::prelude::*;
use scene_dup_finder_lib::{
    ann::BackendKind, find_duplicates, CancelFlag, MatchGroup, SceneBreak, SearchParams, Store,
    WindowParams,
};

/// Insert `num_files` synthetic files, some of which share a duplicated gap
/// pattern, the rest with independently random scene structure.
fn random_library(rng: &mut StdRng, num_files: usize, num_copies: usize) -> Store {
    let mut store = Store::open_in_memory().unwrap();

    let dup_gaps = random_gaps(rng, 20);
    for i in 0..num_copies {
        insert_file(&mut store, &format!("/vids/copy_{i}.mp4"), &dup_gaps);
    }
    for i in 0..num_files - num_copies {
        let gaps = random_gaps(rng, 15 + (i % 10));
        insert_file(&mut store, &format!("/vids/unique_{i}.mp4"), &gaps);
    }

    store
}

fn random_gaps(rng: &mut StdRng, count: usize) -> Vec<f64> {
    (0..count).map(|_| rng.gen_range(10.0..120.0)).collect()
}

fn insert_file(store: &mut Store, name: &str, gaps: &[f64]) {
    let fps = 25.0;
    let mut frame = 0u32;
    let fingerprints = gaps
        .iter()
        .map(|&gap_secs| {
            frame += (gap_secs * fps) as u32;
            SceneBreak { frame, gap_secs }
        })
        .collect::<Vec<_>>();
    let duration_secs = f64::from(frame) / fps + 10.0;

    store
        .insert_video(&PathBuf::from(name), fps, duration_secs, &[], &fingerprints)
        .unwrap();
}

fn params() -> SearchParams {
    SearchParams {
        radius: 1.0,
        step: 1,
        window: WindowParams::default(),
        backend: BackendKind::Exact,
    }
}

fn group_ids(group: &MatchGroup) -> Vec<i64> {
    group.entries().map(|e| e.file.id).collect()
}

#[test]
fn clusters_always_have_at_least_two_distinct_files() {
    let mut rng = StdRng::seed_from_u64(10);

    for round in 0..5 {
        let store = random_library(&mut rng, 12, 2 + round % 3);
        let clusters = find_duplicates(&store, &params(), &CancelFlag::new()).unwrap();

        for cluster in &clusters {
            assert!(cluster.len() >= 2);
            let mut ids = group_ids(cluster);
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), cluster.len(), "file ids must be distinct");
        }
    }
}

#[test]
fn planted_copies_are_found() {
    let mut rng = StdRng::seed_from_u64(11);
    let store = random_library(&mut rng, 10, 3);

    let clusters = find_duplicates(&store, &params(), &CancelFlag::new()).unwrap();
    assert!(!clusters.is_empty());

    // the three planted copies end up in one cluster together
    let biggest = clusters.iter().map(MatchGroup::len).max().unwrap();
    assert_eq!(biggest, 3);
}

#[test]
fn search_is_deterministic_for_fixed_inputs() {
    let mut rng = StdRng::seed_from_u64(12);
    let store = random_library(&mut rng, 15, 4);

    let cancel = CancelFlag::new();
    let first = find_duplicates(&store, &params(), &cancel).unwrap();
    let second = find_duplicates(&store, &params(), &cancel).unwrap();

    assert_eq!(first, second);
}

#[test]
fn fully_whitelisted_clusters_never_reappear() {
    let mut rng = StdRng::seed_from_u64(13);
    let mut store = random_library(&mut rng, 10, 3);

    let clusters = find_duplicates(&store, &params(), &CancelFlag::new()).unwrap();
    assert!(!clusters.is_empty());

    for cluster in &clusters {
        store.whitelist_add(&group_ids(cluster)).unwrap();
    }

    let after = find_duplicates(&store, &params(), &CancelFlag::new()).unwrap();
    for cluster in &after {
        let ids = group_ids(cluster);
        let mut fully_whitelisted = true;
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                fully_whitelisted &= store.whitelist_contains(a, b).unwrap();
            }
        }
        assert!(
            !fully_whitelisted,
            "a fully-whitelisted clique must be suppressed"
        );
    }
}
