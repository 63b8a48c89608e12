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

pub struct TargetCapability {
    pub name: &'static str,
    pub target_arch: &'static str,
    /// Name of the associated constant on `Capability`.
    pub flag: &'static str,
    pub target_features: &'static [&'static str],
}

pub const TARGET_CAPABILITIES: &[TargetCapability] = &[
    // No kernel is compiled with `avx512fp16`; the tier is detected and reported only.
    TargetCapability {
        name: "avx512fp16",
        target_arch: "x86_64",
        flag: "X86_AVX512FP16",
        target_features: &["avx512f"],
    },
    TargetCapability {
        name: "avx512",
        target_arch: "x86_64",
        flag: "X86_AVX512",
        target_features: &["avx512f"],
    },
    TargetCapability {
        name: "avx2fp16",
        target_arch: "x86_64",
        flag: "X86_AVX2FP16",
        target_features: &["avx2", "f16c"],
    },
    TargetCapability {
        name: "avx2",
        target_arch: "x86_64",
        flag: "X86_AVX2",
        target_features: &["avx2"],
    },
    TargetCapability {
        name: "sve",
        target_arch: "aarch64",
        flag: "ARM_SVE",
        target_features: &["sve"],
    },
    TargetCapability {
        name: "neon",
        target_arch: "aarch64",
        flag: "ARM_NEON",
        target_features: &["neon"],
    },
];
