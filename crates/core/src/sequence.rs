// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State file parsing and publish-path derivation.
//!
//! The state file is an opaque text blob whose only contractually
//! meaningful piece is a `sequenceNumber=<digits>` substring. Everything
//! else is preserved verbatim when the file is copied around by the
//! job engine.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// A replication sequence number. Monotonically non-decreasing across
/// successful jobs.
pub type SequenceNumber = u64;

/// The three zero-padded path components derived from a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishPath {
    pub top: u32,
    pub mid: u32,
    pub leaf: u32,
}

impl PublishPath {
    /// Derive the (top, mid, leaf) triple for sequence number `n`.
    ///
    /// `top = n / 1_000_000`, `mid = (n % 1_000_000) / 1_000`, `leaf = n % 1_000`.
    pub fn derive(n: SequenceNumber) -> Self {
        let top = (n / 1_000_000) as u32;
        let mid = ((n % 1_000_000) / 1_000) as u32;
        let leaf = (n % 1_000) as u32;
        Self { top, mid, leaf }
    }

    /// Forward-slash joined directory prefix, e.g. `"001/234"`.
    pub fn dir(&self) -> String {
        format!("{:03}/{:03}", self.top, self.mid)
    }

    /// The diff object key: `top/mid/leaf.osc.gz`.
    pub fn diff_key(&self) -> String {
        format!("{}/{:03}.osc.gz", self.dir(), self.leaf)
    }

    /// The per-sequence state object key: `top/mid/leaf.state.txt`.
    pub fn state_key(&self) -> String {
        format!("{}/{:03}.state.txt", self.dir(), self.leaf)
    }

    /// Recover the sequence number this path was derived from.
    pub fn to_sequence(self) -> SequenceNumber {
        self.top as u64 * 1_000_000 + self.mid as u64 * 1_000 + self.leaf as u64
    }
}

/// The pointer object key, always `state.txt`.
pub const POINTER_KEY: &str = "state.txt";

/// Errors parsing a state file's contents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidStateError {
    #[error("state file does not contain a sequenceNumber=<digits> substring")]
    MissingSequenceNumber,
    #[error("sequenceNumber value overflowed a 64-bit integer")]
    Overflow,
}

#[allow(clippy::expect_used)]
fn sequence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"sequenceNumber=(\d+)").expect("static regex is valid"))
}

/// Parse the sequence number out of a state file's text contents.
///
/// Fails with [`InvalidStateError::MissingSequenceNumber`] if no
/// `sequenceNumber=<digits>` substring is present anywhere in `text`.
pub fn parse(text: &str) -> Result<SequenceNumber, InvalidStateError> {
    let captures =
        sequence_regex().captures(text).ok_or(InvalidStateError::MissingSequenceNumber)?;
    captures[1].parse::<SequenceNumber>().map_err(|_| InvalidStateError::Overflow)
}

#[cfg(test)]
#[path = "sequence_tests.rs"]
mod tests;
