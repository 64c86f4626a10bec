// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Wiring
//!
//! Connects OS signals to the domain's cooperative [`CancellationToken`].
//! The executor checks the token between nodes, so Ctrl+C lets the
//! in-flight node finish, marks the rest not-run, and surfaces a
//! distinguished cancellation failure with exit code 130.

use flowline_domain::CancellationToken;
use tokio::task::JoinHandle;

/// Spawns a background task that cancels `token` when SIGINT (Ctrl+C)
/// arrives. Returns the handle so callers can abort the listener once the
/// run completes normally.
pub fn spawn_signal_handler(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("interrupt received, cancelling the current run");
                token.cancel();
            }
            Err(error) => {
                tracing::error!("failed to install interrupt handler: {}", error);
            }
        }
    })
}
