// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

crate::define_id! {
    pub struct TestId("tst-");
}

#[test]
fn round_trips_through_string() {
    let id = TestId::new();
    let again = TestId::from_string(id.as_str());
    assert_eq!(id, again);
    assert!(id.as_str().starts_with("tst-"));
}

#[test]
fn distinct_ids_are_unique() {
    let a = TestId::new();
    let b = TestId::new();
    assert_ne!(a, b);
}
