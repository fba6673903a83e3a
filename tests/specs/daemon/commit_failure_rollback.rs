//! Commit failure with successful rollback: uploads succeed and the
//! pointer advances, but the catchup tool fails; the engine restores
//! the pointer from the pre-job backup and fails the action.

use crate::prelude::*;

#[test]
fn catchup_failure_rolls_back_the_pointer() {
    let daemon = Daemon::new();
    daemon.servers().seed_pointer("sequenceNumber=665\n");
    daemon.set_sequence_end(667);
    daemon.set_catchup_exit(1);

    daemon.run().code(100);

    assert_eq!(
        daemon.servers().object_text("state.txt").as_deref(),
        Some("sequenceNumber=665\n"),
        "pointer should be restored to sequenceStart after rollback"
    );
    assert!(
        daemon.servers().object("000/000/667.osc.gz").is_some(),
        "the per-sequence diff was already uploaded before commit ran"
    );

    let mediator = daemon.servers().mediator.lock();
    let action = mediator.actions.values().next().expect("one action recorded");
    assert_eq!(action["outcome"], "FAILED");
}
