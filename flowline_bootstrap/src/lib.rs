// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the application layers (domain,
//! application, infrastructure) and owns the entry-point concerns:
//!
//! - **Argument parsing** - clap parsing plus validation into a
//!   [`ValidatedCli`]
//! - **Exit codes** - sysexits-style mapping from the domain error
//!   taxonomy
//! - **Signal handling** - wiring SIGINT into the domain's cooperative
//!   cancellation token
//!
//! ## Key Design Principles
//!
//! 1. **Separation from application layers** - bootstrap can access all
//!    layers; application layers never reach back into bootstrap.
//! 2. **Validated input only** - the shell receives a [`ValidatedCli`],
//!    never raw arguments.
//! 3. **Cooperative shutdown** - signals cancel between nodes; nothing is
//!    killed mid-transform.

pub mod cli;
pub mod exit_code;
pub mod shutdown;

// Re-export commonly used types
pub use cli::{parse_and_validate, ExportFormat, ParseError, ValidatedCli, ValidatedCommand};
pub use exit_code::{result_to_exit_code, ExitCode};
pub use shutdown::spawn_signal_handler;

/// Bootstrap and parse CLI arguments.
///
/// Clap handles `--help` and `--version` automatically and exits the
/// process. The caller runs the application logic and maps its result
/// through [`result_to_exit_code`].
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
