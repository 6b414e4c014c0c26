// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries, one module per table family.

pub mod accounts;
pub mod drafts;
pub mod merchants;
pub mod poll_state;
pub mod products;
