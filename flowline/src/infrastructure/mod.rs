// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Concrete backends behind the domain's ports: file-backed entry
//! adapters, layered configuration, tracing setup, and DAG metadata
//! providers.

pub mod config;
pub mod datasets;
pub mod logging;
pub mod metadata;
