//! Happy path: a normal job advances the pointer and publishes both
//! per-sequence artifacts.

use crate::prelude::*;

#[test]
fn happy_path_publishes_artifacts_and_exits_zero() {
    let daemon = Daemon::new();
    daemon.servers().seed_pointer("sequenceNumber=665\n");
    daemon.set_sequence_end(667);

    daemon.run().success();

    assert_eq!(daemon.servers().object_text("state.txt").as_deref(), Some("sequenceNumber=667\n"));
    assert_eq!(
        daemon.servers().object_text("000/000/667.state.txt").as_deref(),
        Some("sequenceNumber=667\n")
    );
    assert!(daemon.servers().object("000/000/667.osc.gz").is_some(), "diff artifact should be uploaded");

    let mediator = daemon.servers().mediator.lock();
    assert_eq!(mediator.locks_issued, 1);
    assert_eq!(mediator.locks_released, 1);
    assert_eq!(mediator.actions.len(), 1);
    let action = mediator.actions.values().next().expect("one action recorded");
    assert_eq!(action["outcome"], "COMPLETED");
}
