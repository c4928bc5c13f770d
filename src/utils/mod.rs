// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Utility modules
//!
//! Terminal helpers for the read2vec CLI.

pub mod colors;
pub mod spinner;

pub use colors::*;
pub use spinner::*;
