// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn exit_codes_match_spec_table() {
    assert_eq!(JobError::General("x".into()).exit_code(), 1);
    assert_eq!(JobError::Tool { kind: ToolKind::Logger, source: "x".into() }.exit_code(), 100);
    assert_eq!(JobError::Tool { kind: ToolKind::Inspector, source: "x".into() }.exit_code(), 101);
    assert_eq!(JobError::InvalidState("x".into()).exit_code(), 102);
    assert_eq!(JobError::Rollback("x".into()).exit_code(), 104);
    assert_eq!(JobError::ObjectStore("x".into()).exit_code(), 105);
    assert_eq!(JobError::Filesystem("x".into()).exit_code(), 107);
    assert_eq!(JobError::Terminated.exit_code(), 130);
}

#[test]
fn rollback_supersedes_all_other_errors() {
    let errors = vec![
        JobError::ObjectStore("upload failed".into()),
        JobError::Rollback("put during rollback failed".into()),
        JobError::Filesystem("unlink failed".into()),
    ];
    let worst = max_severity(&errors).unwrap();
    assert_eq!(worst.exit_code(), 104);
}

#[test]
fn without_rollback_the_most_severe_non_terminated_error_wins() {
    let errors =
        vec![JobError::InvalidState("bad".into()), JobError::ObjectStore("put failed".into())];
    let worst = max_severity(&errors).unwrap();
    assert_eq!(worst.exit_code(), 105);
}
