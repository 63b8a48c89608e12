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

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// `sum(a[i] * b[i])`
    InnerProduct,
    /// `ip(a, b) / (|a| * |b|)`, NaN if either vector is zero.
    Cosine,
    /// `sum((a[i] - b[i])^2)`
    SquaredEuclidean,
    /// Number of differing bits of two packed bit arrays.
    Hamming,
    /// Declared for set similarity; there is no kernel for it.
    Tanimoto,
}

impl MetricKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricKind::InnerProduct => "ip",
            MetricKind::Cosine => "cos",
            MetricKind::SquaredEuclidean => "l2sq",
            MetricKind::Hamming => "hamming",
            MetricKind::Tanimoto => "tanimoto",
        }
    }
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ip" | "dot" | "inner_product" => Ok(MetricKind::InnerProduct),
            "cos" | "cosine" | "angular" => Ok(MetricKind::Cosine),
            "l2sq" | "sqeuclidean" | "squared_euclidean" => Ok(MetricKind::SquaredEuclidean),
            "hamming" => Ok(MetricKind::Hamming),
            "tanimoto" => Ok(MetricKind::Tanimoto),
            _ => Err(ParseError::MetricKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Float64,
    Float32,
    Float16,
    /// Signed bytes, multiplied as integers.
    ///
    /// Sums accumulate in wrapping 32-bit integers, so results are exact up
    /// to about 131k dimensions at the extremes (`128 * 128 * n < 2^31`).
    /// Longer vectors wrap silently.
    Int8,
    /// Packed bits, eight to a byte.
    Bit1,
}

impl DataType {
    pub const fn as_str(self) -> &'static str {
        match self {
            DataType::Float64 => "f64",
            DataType::Float32 => "f32",
            DataType::Float16 => "f16",
            DataType::Int8 => "i8",
            DataType::Bit1 => "b1",
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f64" | "float64" => Ok(DataType::Float64),
            "f32" | "float32" => Ok(DataType::Float32),
            "f16" | "float16" => Ok(DataType::Float16),
            "i8" | "int8" => Ok(DataType::Int8),
            "b1" | "bit1" => Ok(DataType::Bit1),
            _ => Err(ParseError::DataType(s.to_string())),
        }
    }
}

#[test]
fn metric_kind_names() {
    for kind in [
        MetricKind::InnerProduct,
        MetricKind::Cosine,
        MetricKind::SquaredEuclidean,
        MetricKind::Hamming,
        MetricKind::Tanimoto,
    ] {
        assert_eq!(kind.to_string().parse::<MetricKind>(), Ok(kind));
    }
    assert_eq!("dot".parse::<MetricKind>(), Ok(MetricKind::InnerProduct));
    assert_eq!("angular".parse::<MetricKind>(), Ok(MetricKind::Cosine));
    assert_eq!(
        "jaccard".parse::<MetricKind>(),
        Err(ParseError::MetricKind("jaccard".to_string()))
    );
}

#[test]
fn data_type_names() {
    for datatype in [
        DataType::Float64,
        DataType::Float32,
        DataType::Float16,
        DataType::Int8,
        DataType::Bit1,
    ] {
        assert_eq!(datatype.to_string().parse::<DataType>(), Ok(datatype));
    }
    assert!("bf16".parse::<DataType>().is_err());
}
