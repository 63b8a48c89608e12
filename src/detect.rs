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
use std::sync::atomic::{AtomicU64, Ordering};

const DETECTED: u64 = 1 << 63;

static CACHE: AtomicU64 = AtomicU64::new(0);

/// Capabilities of the running processor that kernels may use.
///
/// The probe runs once per process; later calls read a cached value. Racing
/// first calls compute the same result.
pub fn detect_capabilities() -> Capability {
    let cache = CACHE.load(Ordering::Relaxed);
    if cache & DETECTED != 0 {
        return Capability::from_bits_retain(cache as u32);
    }
    let capabilities = probe();
    tracing::debug!("detected capabilities: {capabilities}");
    CACHE.store(DETECTED | capabilities.bits() as u64, Ordering::Relaxed);
    capabilities
}

/// Feature bits as reported by `cpuid`, before checking that the operating
/// system saves the register state they need.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuidFeatures {
    /// Leaf 1, ECX bit 27.
    pub osxsave: bool,
    /// Leaf 1, ECX bit 29.
    pub f16c: bool,
    /// Leaf 7 sub-leaf 0, EBX bit 5.
    pub avx2: bool,
    /// Leaf 7 sub-leaf 0, EBX bit 16.
    pub avx512f: bool,
    /// Leaf 7 sub-leaf 0, EDX bit 23.
    pub avx512fp16: bool,
    /// Leaf 7 sub-leaf 0, EDX bit 24.
    pub amx_tile: bool,
}

#[cfg(target_arch = "x86_64")]
pub fn cpuid_features() -> CpuidFeatures {
    use core::arch::x86_64::{__cpuid, __cpuid_count};
    #[allow(unused_unsafe)]
    let (max_leaf, leaf_1) = unsafe { (__cpuid(0).eax, __cpuid(1)) };
    let mut features = CpuidFeatures {
        osxsave: leaf_1.ecx & (1 << 27) != 0,
        f16c: leaf_1.ecx & (1 << 29) != 0,
        ..Default::default()
    };
    if max_leaf >= 7 {
        #[allow(unused_unsafe)]
        let leaf_7 = unsafe { __cpuid_count(7, 0) };
        features.avx2 = leaf_7.ebx & (1 << 5) != 0;
        features.avx512f = leaf_7.ebx & (1 << 16) != 0;
        features.avx512fp16 = leaf_7.edx & (1 << 23) != 0;
        features.amx_tile = leaf_7.edx & (1 << 24) != 0;
    }
    features
}

#[cfg(target_arch = "x86_64")]
fn probe() -> Capability {
    #[target_feature(enable = "xsave")]
    fn xcr0() -> u64 {
        unsafe { core::arch::x86_64::_xgetbv(0) }
    }
    let cpuid = cpuid_features();
    tracing::trace!("cpuid: {cpuid:?}");
    // `is_x86_feature_detected!` also checks XCR0 for the YMM and ZMM state.
    let avx2 = cpuid.avx2 && std::arch::is_x86_feature_detected!("avx2");
    let f16c = cpuid.f16c && std::arch::is_x86_feature_detected!("f16c");
    let avx512f = cpuid.avx512f && std::arch::is_x86_feature_detected!("avx512f");
    let amx = cpuid.amx_tile && cpuid.osxsave && {
        const TILECFG_TILEDATA: u64 = 0b11 << 17;
        let state = unsafe { xcr0() };
        state & TILECFG_TILEDATA == TILECFG_TILEDATA
    };
    let mut result = Capability::AUTOVEC;
    result.set(Capability::X86_AVX2, avx2);
    result.set(Capability::X86_AVX2FP16, avx2 && f16c);
    result.set(Capability::X86_AVX512, avx512f);
    result.set(Capability::X86_AVX512FP16, avx512f && cpuid.avx512fp16);
    result.set(Capability::X86_AMX, amx);
    result
}

#[cfg(target_arch = "aarch64")]
fn probe() -> Capability {
    // Every AArch64 core implements Advanced SIMD.
    let mut result = Capability::ARM_NEON;
    result.set(
        Capability::ARM_SVE,
        std::arch::is_aarch64_feature_detected!("sve"),
    );
    result.set(
        Capability::ARM_SVE2,
        std::arch::is_aarch64_feature_detected!("sve2"),
    );
    result.set(Capability::ARM_SME, is_sme_detected());
    result
}

#[cfg(all(target_arch = "aarch64", any(target_os = "linux", target_os = "android")))]
fn is_sme_detected() -> bool {
    const HWCAP2_SME: libc::c_ulong = 1 << 23;
    let hwcap2 = unsafe { libc::getauxval(libc::AT_HWCAP2) };
    tracing::trace!("hwcap2: {hwcap2:#x}");
    hwcap2 & HWCAP2_SME != 0
}

#[cfg(all(
    target_arch = "aarch64",
    not(any(target_os = "linux", target_os = "android"))
))]
fn is_sme_detected() -> bool {
    false
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn probe() -> Capability {
    Capability::AUTOVEC
}

#[test]
fn detect_capabilities_is_idempotent() {
    let first = detect_capabilities();
    for _ in 0..16 {
        assert_eq!(detect_capabilities(), first);
    }
    assert_eq!(probe(), first);
}

#[test]
fn detect_capabilities_is_consistent() {
    let detected = detect_capabilities();
    if detected.contains(Capability::X86_AVX2FP16) {
        assert!(detected.contains(Capability::X86_AVX2));
    }
    if detected.contains(Capability::X86_AVX512FP16) {
        assert!(detected.contains(Capability::X86_AVX512));
    }
    #[cfg(target_arch = "aarch64")]
    assert!(detected.contains(Capability::ARM_NEON));
    #[cfg(not(target_arch = "aarch64"))]
    assert!(!detected.intersects(
        Capability::ARM_NEON | Capability::ARM_SVE | Capability::ARM_SVE2 | Capability::ARM_SME
    ));
    #[cfg(not(target_arch = "x86_64"))]
    assert!(!detected.intersects(
        Capability::X86_AVX2
            | Capability::X86_AVX2FP16
            | Capability::X86_AVX512
            | Capability::X86_AVX512FP16
            | Capability::X86_AMX
    ));
}

#[cfg(target_arch = "x86_64")]
#[test]
fn cpuid_agrees_with_std_detection() {
    let cpuid = cpuid_features();
    let detected = detect_capabilities();
    if detected.contains(Capability::X86_AVX2) {
        assert!(cpuid.avx2);
    }
    if detected.contains(Capability::X86_AVX512) {
        assert!(cpuid.avx512f);
    }
    if std::arch::is_x86_feature_detected!("avx2") {
        assert!(cpuid.avx2);
        assert!(detected.contains(Capability::X86_AVX2));
    }
    if detected.contains(Capability::X86_AMX) {
        assert!(cpuid.amx_tile && cpuid.osxsave);
    }
    if !cpuid.amx_tile {
        assert!(!detected.contains(Capability::X86_AMX));
    }
}
