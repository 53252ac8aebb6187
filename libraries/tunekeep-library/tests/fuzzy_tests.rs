use proptest::prelude::*;
use std::collections::HashSet;
use tunekeep_core::Track;
use tunekeep_library::fuzzy::similarity;
use tunekeep_library::FuzzyMatcher;

fn snapshot() -> Vec<Track> {
    [
        "/L/Daft Punk - One More Time.mp3",
        "/L/One Love.mp3",
        "/L/Gone.mp3",
        "/S/one more time (live).mp3",
        "/S/Lonely.flac",
        "/S/Money Money.mp3",
    ]
    .into_iter()
    .map(Track::new)
    .collect()
}

#[test]
fn test_find_is_deterministic_for_same_snapshot() {
    let tracks = snapshot();
    let matcher = FuzzyMatcher::new();

    for term in ["one", "One More", "money", "zzz"] {
        let first = matcher.find(term, &tracks);
        for _ in 0..10 {
            assert_eq!(matcher.find(term, &tracks), first, "term {term}");
        }
    }
}

#[test]
fn test_find_results_are_unique_tracks_from_snapshot() {
    let tracks = snapshot();
    let found = FuzzyMatcher::new().find("one", &tracks);

    assert!(!found.is_empty());
    for track in &found {
        assert!(tracks.contains(track));
    }
    let unique: HashSet<&Track> = found.iter().collect();
    assert_eq!(unique.len(), found.len());
}

proptest! {
    #[test]
    fn ratio_stays_within_unit_interval(a in ".{0,24}", b in ".{0,24}") {
        let score = similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn ratio_of_identical_strings_is_one(a in ".{0,24}") {
        prop_assert!((similarity(&a, &a) - 1.0).abs() < 1e-12);
    }
}
