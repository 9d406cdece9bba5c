//! SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

/// Failures surfaced by the monitoring engine. Calibration errors put the
/// engine into a permanent non-monitoring mode; transform misalignment is
/// recoverable per cycle; transport errors never escalate past the
/// dispatcher's retry policy.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("calibration file not found")]
    CalibrationMissing,

    #[error("calibration data is malformed: {reason}")]
    CalibrationMalformed { reason: String },

    #[error("plane transform returned {actual} point(s), expected {expected}")]
    TransformMisaligned { expected: usize, actual: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Classified notification delivery failures. Every class is retried the
/// same way; the classification only shapes the diagnostic message.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unable to reach the notification gateway: {0}")]
    Unreachable(String),

    #[error("notification gateway address did not resolve: {0}")]
    InvalidAddress(String),

    #[error("gateway host/port configuration has the wrong shape: {0}")]
    TypeMismatch(String),
}
