// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Resolve the config file path: `OSMDBT_CONFIG` > `./osmdbt.toml`.
pub fn config_path() -> PathBuf {
    std::env::var("OSMDBT_CONFIG").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("osmdbt.toml"))
}

/// Resolve the daemon's own log file path: `OSMDBT_LOG_PATH` > `./osmdbtd.log`.
pub fn log_path() -> PathBuf {
    std::env::var("OSMDBT_LOG_PATH").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("osmdbtd.log"))
}

/// Hard safety timer before self-termination on shutdown, in seconds
/// (default 10s).
pub fn shutdown_timeout_seconds() -> u64 {
    std::env::var("OSMDBT_SHUTDOWN_TIMEOUT_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10)
}

/// Liveness HTTP server bind address: `OSMDBT_LIVENESS_ADDR` >
/// `0.0.0.0:9090`. Port `0` binds an OS-assigned ephemeral port, which
/// the test suite relies on to run multiple daemons concurrently.
pub fn liveness_addr() -> SocketAddr {
    std::env::var("OSMDBT_LIVENESS_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 9090)))
}
