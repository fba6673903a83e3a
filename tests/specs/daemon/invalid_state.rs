//! Invalid state file: the pulled pointer has no
//! `sequenceNumber=<digits>` substring, so the job aborts at phase 4
//! before any tool runs or any upload happens.

use crate::prelude::*;

#[test]
fn invalid_state_file_aborts_with_exit_code_102() {
    let daemon = Daemon::new();
    daemon.servers().seed_pointer("garbage\n");

    daemon.run().code(102);

    let mediator = daemon.servers().mediator.lock();
    assert_eq!(mediator.locks_issued, 1, "reserve still happens before phase 4");
    assert!(mediator.actions.is_empty(), "no action is created before an end sequence is known");
}
