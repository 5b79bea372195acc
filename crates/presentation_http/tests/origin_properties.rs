//! Property tests for the allowed-origins parser
#![allow(clippy::unwrap_used)]

use infrastructure::CorsOrigins;
use presentation_http::middleware::{cors::WILDCARD, parse_origins};
use proptest::prelude::*;

fn origin() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("*".to_string()),
        Just(" ".to_string()),
        "https://[a-z]{1,8}\\.example",
    ]
}

proptest! {
    #[test]
    fn any_text_yields_a_usable_set(raw in ".{0,64}") {
        let set = parse_origins(Some(&CorsOrigins::Text(raw)));
        prop_assert!(!set.as_slice().is_empty());
        prop_assert!(set.is_wildcard() || !set.contains(WILDCARD));
    }

    #[test]
    fn comma_lists_keep_first_occurrence_order(entries in prop::collection::vec(origin(), 0..8)) {
        let set = parse_origins(Some(&CorsOrigins::Text(entries.join(","))));

        let mut expected: Vec<String> = Vec::new();
        for entry in &entries {
            let entry = entry.trim();
            if !entry.is_empty() && entry != WILDCARD && !expected.iter().any(|e| e == entry) {
                expected.push(entry.to_string());
            }
        }

        if expected.is_empty() {
            prop_assert!(set.is_wildcard());
        } else {
            prop_assert_eq!(set.as_slice(), expected.as_slice());
        }
    }

    #[test]
    fn json_and_comma_forms_agree(entries in prop::collection::vec("https://[a-z]{1,8}\\.example", 1..6)) {
        let json = serde_json::to_string(&entries).unwrap();
        let from_json = parse_origins(Some(&CorsOrigins::Text(json)));
        let from_list = parse_origins(Some(&CorsOrigins::Text(entries.join(","))));
        prop_assert_eq!(from_json, from_list);
    }
}
