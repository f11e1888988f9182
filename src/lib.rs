// SPDX-License-Identifier: MIT

pub mod condition;
pub mod telemetry;
