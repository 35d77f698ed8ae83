// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod codec;
pub mod engine;
pub mod executor;
pub mod legs;
pub mod overlay;

pub use engine::SimulationEngine;
pub use executor::ReadOnlyExecutor;
