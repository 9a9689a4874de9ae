//! Tests for keep-original classification and the bounded per-object maps.
//!
//! ## Classification
//!
//! Text keeps its original font only when every visible character outside
//! formatting tags is printable ASCII and the enabled flags match what the
//! text contains (letters for `latin`, digits for `digits`).
//!
//! ## Bounded maps
//!
//! Per-object maps clear completely when a new identity arrives at capacity.

use fontswap::fonts::{AssetKind, FontAsset};
use fontswap::original_cache::BoundedMap;
use fontswap::{KeepPolicy, MAX_TRACKED_OBJECTS, ObjectId, OriginalStateCache, TextKind};
use fontswap::should_keep_original;

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_nothing_kept_when_both_flags_off() {
    for text in ["", "Hello", "123", "<b>OK</b>", "任务"] {
        assert!(!should_keep_original(text, false, false), "{text:?}");
    }
}

#[test]
fn test_markup_examples() {
    assert!(should_keep_original("<color=#FF0000>HP</color> 100", true, false));
    assert!(should_keep_original("<color=#FF0000>HP</color> 100", false, true));
    assert!(!should_keep_original("<b>任务</b>", true, true));
    // Tag contents never count, even if they hold letters or digits
    assert!(!should_keep_original("<size=24></size>", true, true));
    assert!(!should_keep_original("<size=24>...</size>", true, true));
}

#[test]
fn test_unterminated_tag_hides_the_rest() {
    assert!(!should_keep_original("<b 任务 ABC", true, true));
    assert!(should_keep_original("OK <b 任务", true, false));
}

#[test]
fn test_any_non_ascii_disqualifies() {
    assert!(!should_keep_original("Level 5 任务", true, true));
    assert!(!should_keep_original("Café", true, false));
    assert!(!should_keep_original("100€", false, true));
}

#[test]
fn test_whitespace_is_ignored() {
    assert!(should_keep_original("\tA\u{3000}B\n", true, false));
    assert!(!should_keep_original(" \t\n", true, true));
}

#[test]
fn test_punctuation_alone_is_not_kept() {
    assert!(!should_keep_original("--:--", true, true));
    assert!(should_keep_original("12:30", false, true));
    assert!(!should_keep_original("12:30", true, false));
}

#[test]
fn test_policy_matches_free_function() {
    let samples = ["Hello", "42", "HP 100", "<i>x</i>", "任务 1", ""];
    for latin in [false, true] {
        for digits in [false, true] {
            let policy = KeepPolicy::new(latin, digits);
            assert_eq!(policy.is_active(), latin || digits);
            for text in samples {
                assert_eq!(
                    policy.keeps_original(text),
                    should_keep_original(text, latin, digits),
                    "{text:?} latin={latin} digits={digits}"
                );
            }
        }
    }
}

// ============================================================================
// Bounded maps
// ============================================================================

#[test]
fn test_bounded_map_clears_before_insert_over_capacity() {
    let mut map: BoundedMap<String> = BoundedMap::default();
    assert_eq!(map.capacity(), MAX_TRACKED_OBJECTS);

    for i in 0..MAX_TRACKED_OBJECTS as i64 {
        map.insert(ObjectId(i), format!("text {i}"));
    }
    assert_eq!(map.len(), MAX_TRACKED_OBJECTS);
    assert_eq!(map.clears(), 0);

    // Updating a known identity at capacity does not clear
    map.insert(ObjectId(0), "changed".to_string());
    assert_eq!(map.len(), MAX_TRACKED_OBJECTS);
    assert_eq!(map.clears(), 0);

    map.insert(ObjectId(MAX_TRACKED_OBJECTS as i64), "new".to_string());
    assert_eq!(map.len(), 1);
    assert_eq!(map.clears(), 1);
    assert!(map.get(ObjectId(0)).is_none());
    assert_eq!(map.get(ObjectId(MAX_TRACKED_OBJECTS as i64)).map(String::as_str), Some("new"));
}

#[test]
fn test_original_cache_keeps_default_across_clears() {
    let default = FontAsset::new("Default", AssetKind::Typeface);
    let override_font = FontAsset::new("Noto", AssetKind::Typeface);
    let mut cache = OriginalStateCache::with_capacity(2);
    cache.note_override(&override_font);
    assert!(cache.set_default_once(Some(default.clone())));

    let bender = FontAsset::new("Bender", AssetKind::Typeface);
    assert!(cache.record_if_needed(ObjectId(1), Some(&bender)));
    assert!(cache.record_if_needed(ObjectId(2), Some(&bender)));
    assert!(!cache.record_if_needed(ObjectId(2), Some(&bender)));
    assert!(!cache.record_if_needed(ObjectId(3), Some(&override_font)));
    assert_eq!(cache.len(), 2);

    assert!(cache.record_if_needed(ObjectId(3), Some(&bender)));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.clears(), 1);

    // Forgotten structured objects fall back to the captured default
    assert_eq!(cache.original_for(ObjectId(1), TextKind::Structured), Some(default));
    assert_eq!(cache.original_for(ObjectId(1), TextKind::Plain), None);
}

#[test]
fn test_default_capture_skips_override_and_is_once() {
    let override_font = FontAsset::new("Noto", AssetKind::Typeface);
    let mut cache = OriginalStateCache::new();
    cache.note_override(&override_font);

    assert!(!cache.set_default_once(Some(override_font)));
    assert!(!cache.set_default_once(None));
    assert!(cache.default_font().is_none());

    let first = FontAsset::new("First", AssetKind::Typeface);
    assert!(cache.set_default_once(Some(first.clone())));
    assert!(!cache.set_default_once(Some(FontAsset::new("Second", AssetKind::Typeface))));
    assert_eq!(cache.default_font(), Some(&first));
}
