// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

use crate::metric::{DataType, MetricKind};
use thiserror::Error;

/// Failure to find a kernel. Retrying never changes the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("metric `{kind}` is declared but not implemented")]
    NotImplemented { kind: MetricKind },
    #[error("metric `{kind}` is not implemented for datatype `{datatype}`")]
    Unsupported {
        kind: MetricKind,
        datatype: DataType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown metric `{0}`")]
    MetricKind(String),
    #[error("unknown datatype `{0}`")]
    DataType(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown capability `{0}`")]
    UnknownCapability(String),
    #[error("environment variable `{0}` is not valid unicode")]
    NotUnicode(&'static str),
    #[error("failed to parse options: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid options: {0}")]
    Validation(#[from] validator::ValidationErrors),
}
