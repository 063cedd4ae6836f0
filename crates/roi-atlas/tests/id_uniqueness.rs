use std::collections::BTreeSet;

use indexmap::IndexMap;
use proptest::prelude::*;
use roi_atlas::{resolve_atlas, RegionCatalog, RegionIds, ResolveContext};
use roi_core::{ProjectConfig, RawAttributes, RoiError};
use serde_yaml::Value;

fn config() -> ProjectConfig {
    serde_yaml::from_str("project: ids\nbasepath: /nonexistent\n").expect("config")
}

fn parcellation(fname: &str, manifold: &str, regions: &[u32]) -> RawAttributes {
    let mut raw = IndexMap::new();
    raw.insert("source".to_string(), Value::from("parcellation"));
    raw.insert("manifold".to_string(), Value::from(manifold));
    raw.insert("fname".to_string(), Value::from(fname));
    raw.insert(
        "regions".to_string(),
        Value::Sequence(regions.iter().map(|id| Value::from(*id)).collect()),
    );
    raw
}

fn assert_unique_per_scope(ids: &RegionIds) {
    match ids {
        RegionIds::Flat(ids) => {
            let unique: BTreeSet<_> = ids.iter().collect();
            assert_eq!(unique.len(), ids.len());
        }
        RegionIds::PerHemisphere(map) => {
            for ids in map.values() {
                let unique: BTreeSet<_> = ids.iter().collect();
                assert_eq!(unique.len(), ids.len());
            }
        }
    }
}

proptest! {
    #[test]
    fn subcortical_requests_never_share_ids(codes in proptest::sample::subsequence((1u32..=8).collect::<Vec<_>>(), 1..=8)) {
        let config = config();
        let ctx = ResolveContext::new(&config);
        let atlas = resolve_atlas("aseg", &parcellation("aseg.mgz", "volume", &codes), &ctx)
            .expect("resolve");
        let ids = atlas.region_ids().expect("ids");
        prop_assert_eq!(ids.len(), codes.len() * 2);
        assert_unique_per_scope(&ids);
        let catalog = RegionCatalog::build(&atlas).expect("catalog");
        prop_assert_eq!(catalog.len(), codes.len() * 2);
    }

    #[test]
    fn cortical_requests_never_share_ids_within_a_hemisphere(codes in proptest::sample::subsequence((1u32..=35).collect::<Vec<_>>(), 1..=35)) {
        let config = config();
        let ctx = ResolveContext::new(&config);
        let atlas = resolve_atlas("aparc", &parcellation("aparc.annot", "surface", &codes), &ctx)
            .expect("resolve");
        let ids = atlas.region_ids().expect("ids");
        assert_unique_per_scope(&ids);
        prop_assert_eq!(ids.len(), codes.len() * 2);
    }

    #[test]
    fn repeated_requests_are_rejected(code in 1u32..=8, extra in proptest::collection::vec(1u32..=8, 0..4)) {
        let mut codes = vec![code];
        codes.extend(extra);
        codes.push(code);
        let config = config();
        let ctx = ResolveContext::new(&config);
        let err = resolve_atlas("aseg", &parcellation("aseg.mgz", "volume", &codes), &ctx)
            .unwrap_err();
        prop_assert!(matches!(err, RoiError::Config(_)));
        prop_assert_eq!(err.info().code.as_str(), "duplicate_region");
    }
}
