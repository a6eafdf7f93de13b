// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Factory error codes.
//!
//! Callers branch on [`ErrorCode`], never on message text. Codes are stable
//! across releases.

use crate::compile::LoadError;
use std::fmt;
use thiserror::Error;

/// Stable numeric error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Loading or binding the unit failed.
    FactoryBindFailed = 150_001,
    CanCreateFailed = 150_002,
    CanInventFailed = 150_003,
    CanSendWhileDisconnectedFailed = 150_004,
    /// Instantiating a document failed.
    CatastrophicCreateFailed = 150_005,
    CompileFailed = 150_006,
    /// The space has type errors.
    NotDeployable = 150_007,
    CodegenFailed = 150_008,
    TestRunFailed = 150_009,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::FactoryBindFailed => "FACTORY_BIND_FAILED",
            Self::CanCreateFailed => "CAN_CREATE_FAILED",
            Self::CanInventFailed => "CAN_INVENT_FAILED",
            Self::CanSendWhileDisconnectedFailed => "CAN_SEND_WHILE_DISCONNECTED_FAILED",
            Self::CatastrophicCreateFailed => "CATASTROPHIC_CREATE_FAILED",
            Self::CompileFailed => "COMPILE_FAILED",
            Self::NotDeployable => "NOT_DEPLOYABLE",
            Self::CodegenFailed => "CODEGEN_FAILED",
            Self::TestRunFailed => "TEST_RUN_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u32())
    }
}

/// A call into a unit failed (panicked, returned garbage or was refused).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvokeError(pub String);

impl InvokeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("failed to load unit: {0}")]
    Load(#[from] LoadError),

    #[error("failed to bind unit: {0}")]
    Bind(InvokeError),

    #[error("can_create failed: {0}")]
    CanCreate(InvokeError),

    #[error("can_invent failed: {0}")]
    CanInvent(InvokeError),

    #[error("can_send_while_disconnected failed: {0}")]
    CanSendWhileDisconnected(InvokeError),

    #[error("failed to create document: {0}")]
    Create(InvokeError),

    #[error("test '{name}' could not run: {source}")]
    Test { name: String, source: InvokeError },
}

impl FactoryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Load(_) | Self::Bind(_) => ErrorCode::FactoryBindFailed,
            Self::CanCreate(_) => ErrorCode::CanCreateFailed,
            Self::CanInvent(_) => ErrorCode::CanInventFailed,
            Self::CanSendWhileDisconnected(_) => ErrorCode::CanSendWhileDisconnectedFailed,
            Self::Create(_) => ErrorCode::CatastrophicCreateFailed,
            Self::Test { .. } => ErrorCode::TestRunFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_and_stable() {
        assert_eq!(ErrorCode::FactoryBindFailed.as_u32(), 150_001);
        assert_eq!(ErrorCode::CatastrophicCreateFailed.as_u32(), 150_005);
        let err = FactoryError::CanInvent(InvokeError::new("boom"));
        assert_eq!(err.code(), ErrorCode::CanInventFailed);
        assert_eq!(err.to_string(), "can_invent failed: boom");
        let err = FactoryError::from(LoadError::NotFound("libx.so".into()));
        assert_eq!(err.code(), ErrorCode::FactoryBindFailed);
    }

    #[test]
    fn test_code_display() {
        assert_eq!(
            ErrorCode::CanSendWhileDisconnectedFailed.to_string(),
            "CAN_SEND_WHILE_DISCONNECTED_FAILED (150004)"
        );
    }
}
