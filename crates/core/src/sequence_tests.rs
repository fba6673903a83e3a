// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[test]
fn parses_sequence_number_amid_other_lines() {
    let text = "sequenceNumberOffset=0\nsequenceNumber=667\ntimestamp=2024-01-01T00:00:00Z\n";
    assert_eq!(parse(text).unwrap(), 667);
}

#[test]
fn rejects_text_without_sequence_number() {
    assert_eq!(parse("garbage"), Err(InvalidStateError::MissingSequenceNumber));
}

#[test]
fn publish_path_pads_to_three_digits() {
    let path = PublishPath::derive(667);
    assert_eq!(path.top, 0);
    assert_eq!(path.mid, 0);
    assert_eq!(path.leaf, 667);
    assert_eq!(path.diff_key(), "000/000/667.osc.gz");
    assert_eq!(path.state_key(), "000/000/667.state.txt");
}

#[test]
fn publish_path_overflow_case() {
    // S7: start = 1_234_567, end = 1_234_568
    let path = PublishPath::derive(1_234_568);
    assert_eq!(path.top, 1);
    assert_eq!(path.mid, 234);
    assert_eq!(path.leaf, 568);
    assert_eq!(path.diff_key(), "001/234/568.osc.gz");
}

proptest! {
    #[test]
    fn publish_path_round_trips(n in 0u64..1_000_000_000) {
        let path = PublishPath::derive(n);
        prop_assert_eq!(path.to_sequence(), n);
    }

    #[test]
    fn sequence_parser_finds_any_embedded_number(n in 0u64..u64::MAX, prefix in "[a-z]{0,12}", suffix in "[a-z]{0,12}") {
        let text = format!("{prefix}\nsequenceNumber={n}\n{suffix}\n");
        prop_assert_eq!(parse(&text).unwrap(), n);
    }
}
