// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Core value types shared across the fetch/cache engine.

mod filter;
mod grid;
mod identity;
mod range;
mod row;

pub use filter::{Filter, FilterValue};
pub use grid::GridNode;
pub use identity::{StreamIdentity, StreamKind};
pub use range::BlockRange;
pub use row::FetchedRow;
