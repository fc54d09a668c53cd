// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - Error Types

use rust_decimal::Decimal;

/// Errors raised while configuring or executing a simulation.
///
/// Everything except [`SimError::DataSource`] is a configuration error: it
/// aborts the run it occurs in and is never retried. Data-source errors are
/// recovered by the collaborators in [`crate::datasource`] via fallback
/// constants and only surface when a caller asks for them directly.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("parameter `{0}` has no candidate values")]
    EmptyParameter(&'static str),

    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("invalid stage selected: {0}")]
    InvalidStage(String),

    #[error("block `{block}`: unknown state variable `{variable}`")]
    UnknownVariable { block: String, variable: String },

    #[error("state variable `{variable}` expects a {expected} value")]
    TypeMismatch { variable: &'static str, expected: &'static str },

    #[error("block `{block}`: signal key `{key}` produced by more than one policy")]
    SignalCollision { block: String, key: String },

    #[error("block `{block}`: signal key `{key}` missing")]
    MissingSignal { block: String, key: String },

    #[error("block `{block}`: pool weight {weight} outside (0, 1)")]
    InvalidWeight { block: String, weight: Decimal },

    #[error("data source unavailable: {0}")]
    DataSource(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// An error without a block of its own, raised while a block ran.
    #[error("block `{block}`: {source}")]
    InBlock { block: String, source: Box<SimError> },
}

impl SimError {
    /// Attach the failing block's description to an error raised inside it.
    ///
    /// Policies and update functions do not know which block they run in.
    /// Variants with a `block` field get it filled in when empty; every
    /// other error is wrapped in [`SimError::InBlock`].
    pub fn in_block(self, description: &str) -> Self {
        let block = description.to_string();
        match self {
            Self::UnknownVariable { block: b, variable } if b.is_empty() => {
                Self::UnknownVariable { block, variable }
            }
            Self::SignalCollision { block: b, key } if b.is_empty() => {
                Self::SignalCollision { block, key }
            }
            Self::MissingSignal { block: b, key } if b.is_empty() => Self::MissingSignal { block, key },
            Self::InvalidWeight { block: b, weight } if b.is_empty() => {
                Self::InvalidWeight { block, weight }
            }
            e @ (Self::UnknownVariable { .. }
            | Self::SignalCollision { .. }
            | Self::MissingSignal { .. }
            | Self::InvalidWeight { .. }
            | Self::InBlock { .. }) => e,
            other => Self::InBlock { block, source: Box::new(other) },
        }
    }

    /// Name of the block the error was raised in, if known.
    pub fn block(&self) -> Option<&str> {
        match self {
            Self::UnknownVariable { block, .. }
            | Self::SignalCollision { block, .. }
            | Self::MissingSignal { block, .. }
            | Self::InvalidWeight { block, .. }
            | Self::InBlock { block, .. } => Some(block.as_str()).filter(|b| !b.is_empty()),
            _ => None,
        }
    }

    /// The underlying error, with any [`SimError::InBlock`] wrapper removed.
    pub fn root(&self) -> &SimError {
        match self {
            Self::InBlock { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error came from an external data source.
    pub fn is_data_source(&self) -> bool {
        matches!(self.root(), Self::DataSource(_))
    }
}
