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

use crate::capability::Capability;
use crate::config::DispatchOptions;
use crate::detect::detect_capabilities;
use crate::error::ResolveError;
use crate::kernel::{Function, Kernel};
use crate::metric::{DataType, MetricKind};

/// Kernels of one datatype compiled for one capability tier.
pub(crate) struct Tier<F: 'static> {
    pub capability: Capability,
    pub inner_product: F,
    pub cosine: F,
    pub squared_euclidean: F,
}

/// Bit kernels compiled for one capability tier.
pub(crate) struct BitTier<F: 'static> {
    pub capability: Capability,
    pub hamming: F,
}

/// Picks the kernel for `kind` and `datatype` among those the processor
/// supports and `allowed` permits.
///
/// The first tier in priority order (widest registers first) whose
/// capability lies within `detect_capabilities() & allowed` wins. Every
/// supported pair has a portable fallback, so a supported pair resolves even
/// if `allowed` is [`Capability::AUTOVEC`].
pub fn resolve_metric(
    kind: MetricKind,
    datatype: DataType,
    allowed: Capability,
) -> Result<Kernel, ResolveError> {
    let viable = detect_capabilities() & allowed;
    let kernel = resolve_viable(kind, datatype, viable)?;
    tracing::debug!(
        "resolved {kind} over {datatype} to tier {} (viable: {viable})",
        kernel.capability()
    );
    Ok(kernel)
}

/// [`resolve_metric`] with the allowed mask taken from `options`.
pub fn resolve_metric_with(
    options: &DispatchOptions,
    kind: MetricKind,
    datatype: DataType,
) -> Result<Kernel, ResolveError> {
    resolve_metric(kind, datatype, options.allowed())
}

pub(crate) fn resolve_viable(
    kind: MetricKind,
    datatype: DataType,
    viable: Capability,
) -> Result<Kernel, ResolveError> {
    if kind == MetricKind::Tanimoto {
        return Err(ResolveError::NotImplemented { kind });
    }
    let unsupported = ResolveError::Unsupported { kind, datatype };
    let (capability, function) = match datatype {
        DataType::Float64 => {
            let (c, f) = select(crate::floating_f64::TIERS, kind, viable).ok_or(unsupported)?;
            (c, Function::Float64(f))
        }
        DataType::Float32 => {
            let (c, f) = select(crate::floating_f32::TIERS, kind, viable).ok_or(unsupported)?;
            (c, Function::Float32(f))
        }
        DataType::Float16 => {
            let (c, f) = select(crate::floating_f16::TIERS, kind, viable).ok_or(unsupported)?;
            (c, Function::Float16(f))
        }
        DataType::Int8 => {
            let (c, f) = select(crate::byte::TIERS, kind, viable).ok_or(unsupported)?;
            (c, Function::Int8(f))
        }
        DataType::Bit1 => {
            if kind != MetricKind::Hamming {
                return Err(unsupported);
            }
            let tier = crate::bit::TIERS
                .iter()
                .find(|tier| viable.contains(tier.capability))
                .ok_or(unsupported)?;
            (tier.capability, Function::Bit1(tier.hamming))
        }
    };
    Ok(Kernel::new(kind, datatype, capability, function))
}

fn select<F: Copy>(
    tiers: &'static [Tier<F>],
    kind: MetricKind,
    viable: Capability,
) -> Option<(Capability, F)> {
    let tier = tiers.iter().find(|tier| viable.contains(tier.capability))?;
    let function = match kind {
        MetricKind::InnerProduct => tier.inner_product,
        MetricKind::Cosine => tier.cosine,
        MetricKind::SquaredEuclidean => tier.squared_euclidean,
        MetricKind::Hamming | MetricKind::Tanimoto => return None,
    };
    Some((tier.capability, function))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [MetricKind; 5] = [
        MetricKind::InnerProduct,
        MetricKind::Cosine,
        MetricKind::SquaredEuclidean,
        MetricKind::Hamming,
        MetricKind::Tanimoto,
    ];

    const DATATYPES: [DataType; 5] = [
        DataType::Float64,
        DataType::Float32,
        DataType::Float16,
        DataType::Int8,
        DataType::Bit1,
    ];

    fn is_supported(kind: MetricKind, datatype: DataType) -> bool {
        match datatype {
            DataType::Bit1 => kind == MetricKind::Hamming,
            _ => matches!(
                kind,
                MetricKind::InnerProduct | MetricKind::Cosine | MetricKind::SquaredEuclidean
            ),
        }
    }

    #[test]
    fn every_tier_table_ends_in_fallback() {
        assert_eq!(
            crate::floating_f64::TIERS.last().map(|t| t.capability),
            Some(Capability::AUTOVEC)
        );
        assert_eq!(
            crate::floating_f32::TIERS.last().map(|t| t.capability),
            Some(Capability::AUTOVEC)
        );
        assert_eq!(
            crate::floating_f16::TIERS.last().map(|t| t.capability),
            Some(Capability::AUTOVEC)
        );
        assert_eq!(
            crate::byte::TIERS.last().map(|t| t.capability),
            Some(Capability::AUTOVEC)
        );
        assert_eq!(
            crate::bit::TIERS.last().map(|t| t.capability),
            Some(Capability::AUTOVEC)
        );
    }

    #[test]
    fn resolution_is_total() {
        for viable in [Capability::AUTOVEC, Capability::all()] {
            for kind in KINDS {
                for datatype in DATATYPES {
                    let result = resolve_viable(kind, datatype, viable);
                    match result {
                        Ok(kernel) => {
                            assert!(is_supported(kind, datatype));
                            assert_eq!(kernel.kind(), kind);
                            assert_eq!(kernel.datatype(), datatype);
                        }
                        Err(ResolveError::NotImplemented { kind: k }) => {
                            assert_eq!(k, MetricKind::Tanimoto);
                            assert_eq!(kind, MetricKind::Tanimoto);
                        }
                        Err(ResolveError::Unsupported { .. }) => {
                            assert!(!is_supported(kind, datatype));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn autovec_mask_selects_fallback() {
        for kind in KINDS {
            for datatype in DATATYPES {
                if let Ok(kernel) = resolve_metric(kind, datatype, Capability::AUTOVEC) {
                    assert_eq!(kernel.capability(), Capability::AUTOVEC);
                }
            }
        }
    }

    #[test]
    fn resolved_tier_is_viable() {
        let detected = detect_capabilities();
        for allowed in [
            Capability::all(),
            Capability::X86_AVX2,
            Capability::X86_AVX2FP16,
            Capability::ARM_NEON,
        ] {
            for datatype in DATATYPES {
                for kind in KINDS {
                    if let Ok(kernel) = resolve_metric(kind, datatype, allowed) {
                        assert!((detected & allowed).contains(kernel.capability()));
                    }
                }
            }
        }
    }

    #[test]
    fn widest_tier_wins() {
        let viable = Capability::X86_AVX2 | Capability::X86_AVX2FP16 | Capability::X86_AVX512;
        #[cfg(target_arch = "x86_64")]
        {
            let kernel = resolve_viable(MetricKind::Cosine, DataType::Float32, viable).unwrap();
            assert_eq!(kernel.capability(), Capability::X86_AVX512);
            let kernel = resolve_viable(MetricKind::Cosine, DataType::Int8, viable).unwrap();
            assert_eq!(kernel.capability(), Capability::X86_AVX2);
            let kernel = resolve_viable(
                MetricKind::InnerProduct,
                DataType::Float16,
                Capability::X86_AVX2,
            )
            .unwrap();
            assert_eq!(kernel.capability(), Capability::AUTOVEC);
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            let kernel = resolve_viable(MetricKind::Cosine, DataType::Float32, viable).unwrap();
            assert_eq!(kernel.capability(), Capability::AUTOVEC);
        }
    }

    #[test]
    fn errors_name_the_request() {
        assert_eq!(
            resolve_metric(MetricKind::Hamming, DataType::Float32, Capability::all()).unwrap_err(),
            ResolveError::Unsupported {
                kind: MetricKind::Hamming,
                datatype: DataType::Float32
            }
        );
        assert_eq!(
            resolve_metric(MetricKind::Cosine, DataType::Bit1, Capability::all())
                .unwrap_err()
                .to_string(),
            "metric `cos` is not implemented for datatype `b1`"
        );
        assert_eq!(
            resolve_metric(MetricKind::Tanimoto, DataType::Bit1, Capability::all()).unwrap_err(),
            ResolveError::NotImplemented {
                kind: MetricKind::Tanimoto
            }
        );
    }
}
