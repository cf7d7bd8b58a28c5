//! Build error taxonomy shared by the compiler and its callers.
//!
//! Every failure aborts the current build; there is no partial-success state.
//! The `Display` output is the single human-readable message surfaced to the user.

use crate::ProfileId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// High-level error classification for logging and reporting.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Missing profile/group reference, illegal chain nesting, missing front proxy.
    Resolution,
    /// A hop that cannot be auto-configured or explicitly refuses to be built.
    Capability,
    /// A protocol translator produced an empty or invalid outbound.
    Translator,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Resolution => "resolution",
            Self::Capability => "capability",
            Self::Translator => "translator",
        };
        f.write_str(s)
    }
}

/// Error produced by a configuration build.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildError {
    #[error("profile not found: {0}")]
    ProfileNotFound(ProfileId),

    #[error("This profile is not in any group, your data may be corrupted.")]
    GroupNotFound,

    #[error("chain missing profile: {0}")]
    ChainMissing(ProfileId),

    #[error("chain in chain is not allowed: {0}")]
    NestedChain(ProfileId),

    #[error("front proxy profile not found: {0}")]
    FrontProxyMissing(ProfileId),

    #[error("This configuration cannot be set automatically, please try another.")]
    CannotConfigure,

    /// No executable is configured for the helper core.
    #[error("Core not found: {0}")]
    CoreNotFound(String),

    /// The helper refused its launch arguments.
    #[error("{0}")]
    Rejected(String),

    #[error("using wireguard system interface requires elevated permissions")]
    NeedElevation,

    #[error("no free loopback port: {0}")]
    PortUnavailable(String),

    #[error("unsupported outbound")]
    UnsupportedOutbound,
}

impl BuildError {
    /// Get the error class for categorization.
    #[inline]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ProfileNotFound(_)
            | Self::GroupNotFound
            | Self::ChainMissing(_)
            | Self::NestedChain(_)
            | Self::FrontProxyMissing(_) => ErrorClass::Resolution,
            Self::CannotConfigure
            | Self::CoreNotFound(_)
            | Self::Rejected(_)
            | Self::NeedElevation
            | Self::PortUnavailable(_) => ErrorClass::Capability,
            Self::UnsupportedOutbound => ErrorClass::Translator,
        }
    }

    #[inline]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    #[inline]
    pub fn core_not_found(core: impl Into<String>) -> Self {
        Self::CoreNotFound(core.into())
    }
}

/// Failure reported by the engine or the helper supervisor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine rejected config: {0}")]
    Rejected(String),
    #[error("engine io: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_messages_name_the_id() {
        assert_eq!(
            BuildError::ChainMissing(42).to_string(),
            "chain missing profile: 42"
        );
        assert_eq!(
            BuildError::NestedChain(3).to_string(),
            "chain in chain is not allowed: 3"
        );
        assert_eq!(BuildError::ChainMissing(42).class(), ErrorClass::Resolution);
    }

    #[test]
    fn capability_and_translator_classes() {
        assert_eq!(
            BuildError::core_not_found("naive").to_string(),
            "Core not found: naive"
        );
        assert_eq!(BuildError::NeedElevation.class(), ErrorClass::Capability);
        assert_eq!(BuildError::rejected("bad").to_string(), "bad");
        assert_eq!(
            BuildError::UnsupportedOutbound.class(),
            ErrorClass::Translator
        );
        assert_eq!(ErrorClass::Capability.to_string(), "capability");
    }
}
