//! Null diff: start and end sequence are equal, so the job releases
//! its lease and exits clean without creating an action or uploading
//! anything.

use crate::prelude::*;

#[test]
fn null_diff_takes_no_action_and_exits_zero() {
    let daemon = Daemon::new();
    daemon.servers().seed_pointer("sequenceNumber=667\n");
    daemon.set_sequence_end(667);

    daemon.run().success();

    assert!(daemon.servers().object("000/000/667.osc.gz").is_none(), "no diff should be uploaded");
    assert!(daemon.servers().object("000/000/667.state.txt").is_none(), "no per-sequence state should be uploaded");

    let mediator = daemon.servers().mediator.lock();
    assert_eq!(mediator.locks_issued, 1);
    assert_eq!(mediator.locks_released, 1);
    assert!(mediator.actions.is_empty(), "null-diff jobs never create an action");
}
