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

//! Similarity kernels with runtime selection of the widest usable vector
//! instruction set.
//!
//! ```
//! use simkern::{Capability, DataType, MetricKind};
//!
//! let kernel = simkern::resolve_metric(MetricKind::InnerProduct, DataType::Float32, Capability::all())
//!     .unwrap();
//! assert_eq!(kernel.compute(&[1.0f32, 2.0, 3.0, 4.0], &[4.0, 3.0, 2.0, 1.0]), 20.0);
//! ```

#![allow(unsafe_code)]

// used by the `simkern` binary only
#[cfg(feature = "cli")]
use {clap as _, tracing_subscriber as _};

mod capability;
mod config;
mod detect;
mod emulate;
mod error;
mod kernel;
mod metric;
mod resolve;

pub mod bit;
pub mod byte;
pub mod floating_f16;
pub mod floating_f32;
pub mod floating_f64;

pub use capability::Capability;
pub use config::DispatchOptions;
pub use detect::detect_capabilities;
pub use error::{ConfigError, ParseError, ResolveError};
pub use kernel::{Element, Kernel};
pub use metric::{DataType, MetricKind};
pub use resolve::{resolve_metric, resolve_metric_with};

#[cfg(target_arch = "x86_64")]
pub use detect::{CpuidFeatures, cpuid_features};

pub use half::f16;

#[inline(always)]
pub(crate) fn cosine(xy: f32, xx: f32, yy: f32) -> f32 {
    xy / (xx.sqrt() * yy.sqrt())
}

mod internal {
    #[cfg(target_arch = "x86_64")]
    simkern_macros::define_is_capability_detected!("x86_64");

    #[cfg(target_arch = "aarch64")]
    simkern_macros::define_is_capability_detected!("aarch64");

    #[cfg(target_arch = "x86_64")]
    #[allow(unused_imports)]
    pub use is_x86_64_capability_detected;

    #[cfg(target_arch = "aarch64")]
    #[allow(unused_imports)]
    pub use is_aarch64_capability_detected;
}

pub(crate) use simkern_macros::target_capability;

#[cfg(target_arch = "x86_64")]
#[allow(unused_imports)]
pub use internal::is_x86_64_capability_detected as is_capability_detected;

#[cfg(target_arch = "aarch64")]
#[allow(unused_imports)]
pub use internal::is_aarch64_capability_detected as is_capability_detected;
