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

//! Packed bit kernels. Each byte holds eight dimensions; padding bits of the
//! last byte are counted like any other bit.

use crate::capability::Capability;
use crate::resolve::BitTier;

pub(crate) static TIERS: &[BitTier<unsafe fn(&[u8], &[u8]) -> u32>] = &[
    #[cfg(simkern_sve)]
    BitTier {
        capability: Capability::ARM_SVE,
        hamming: hamming::hamming_sve,
    },
    #[cfg(target_arch = "aarch64")]
    BitTier {
        capability: Capability::ARM_NEON,
        hamming: hamming::hamming_neon,
    },
    #[cfg(target_arch = "x86_64")]
    BitTier {
        capability: Capability::X86_AVX2,
        hamming: hamming::hamming_avx2,
    },
    BitTier {
        capability: Capability::AUTOVEC,
        hamming: hamming::fallback,
    },
];

pub mod hamming {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx2")]
    pub fn hamming_avx2(lhs: &[u8], rhs: &[u8]) -> u32 {
        assert!(lhs.len() == rhs.len());
        use crate::emulate::emulate_mm256_reduce_add_epi64;
        use core::arch::x86_64::*;
        static LUT: [[i8; 16]; 2] = [[0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4]; 2];
        let lut = unsafe { _mm256_loadu_si256((&raw const LUT).cast()) };
        let mask_0 = _mm256_set1_epi8(0x0f);
        let mut sum = _mm256_setzero_si256();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut n = lhs.len();
        while n >= 32 {
            let x = unsafe { _mm256_loadu_si256(a.cast()) };
            let y = unsafe { _mm256_loadu_si256(b.cast()) };
            (n, a, b) = unsafe { (n - 32, a.add(32), b.add(32)) };
            let xor = _mm256_xor_si256(x, y);
            let xor_lo = _mm256_and_si256(xor, mask_0);
            let xor_hi = _mm256_and_si256(_mm256_srli_epi16(xor, 4), mask_0);
            let res_lo = _mm256_shuffle_epi8(lut, xor_lo);
            let res_hi = _mm256_shuffle_epi8(lut, xor_hi);
            let res = _mm256_add_epi8(res_lo, res_hi);
            sum = _mm256_add_epi64(sum, _mm256_sad_epu8(res, _mm256_setzero_si256()));
        }
        let mut count = emulate_mm256_reduce_add_epi64(sum) as u32;
        // keeps the tail loop rolled
        while std::hint::black_box(n) > 0 {
            let (x, y) = unsafe { (a.read(), b.read()) };
            (n, a, b) = unsafe { (n - 1, a.add(1), b.add(1)) };
            count += (x ^ y).count_ones();
        }
        count
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn hamming_avx2_test() {
        if !crate::is_capability_detected!("avx2") {
            println!("test {} ... skipped (avx2)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let lhs = (0..1040).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
            let rhs = (0..1040).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
            for z in 1000..1040 {
                let specialized = unsafe { hamming_avx2(&lhs[..z], &rhs[..z]) };
                let fallback = fallback(&lhs[..z], &rhs[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_capability(enable = "neon")]
    pub fn hamming_neon(lhs: &[u8], rhs: &[u8]) -> u32 {
        assert!(lhs.len() == rhs.len());
        use core::arch::aarch64::*;
        let mut sum = vdupq_n_u32(0);
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut n = lhs.len();
        while n >= 16 {
            let x = unsafe { vld1q_u8(a) };
            let y = unsafe { vld1q_u8(b) };
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
            let bits = vcntq_u8(veorq_u8(x, y));
            sum = vpadalq_u16(sum, vpaddlq_u8(bits));
        }
        let mut count = vaddvq_u32(sum);
        // keeps the tail loop rolled
        while std::hint::black_box(n) > 0 {
            let (x, y) = unsafe { (a.read(), b.read()) };
            (n, a, b) = unsafe { (n - 1, a.add(1), b.add(1)) };
            count += (x ^ y).count_ones();
        }
        count
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn hamming_neon_test() {
        if !crate::is_capability_detected!("neon") {
            println!("test {} ... skipped (neon)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let lhs = (0..1040).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
            let rhs = (0..1040).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
            for z in 1000..1040 {
                let specialized = unsafe { hamming_neon(&lhs[..z], &rhs[..z]) };
                let fallback = fallback(&lhs[..z], &rhs[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(simkern_sve)]
    #[crate::target_capability(enable = "sve")]
    pub fn hamming_sve(lhs: &[u8], rhs: &[u8]) -> u32 {
        unsafe extern "C" {
            #[link_name = "simkern_sve_b1_hamming"]
            unsafe fn f(a: *const u8, b: *const u8, n: usize) -> u32;
        }
        assert!(lhs.len() == rhs.len());
        unsafe { f(lhs.as_ptr(), rhs.as_ptr(), lhs.len()) }
    }

    #[cfg(all(simkern_sve, test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn hamming_sve_test() {
        if !crate::is_capability_detected!("sve") {
            println!("test {} ... skipped (sve)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let lhs = (0..1040).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
            let rhs = (0..1040).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
            for z in 1000..1040 {
                let specialized = unsafe { hamming_sve(&lhs[..z], &rhs[..z]) };
                let fallback = fallback(&lhs[..z], &rhs[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    pub fn fallback(lhs: &[u8], rhs: &[u8]) -> u32 {
        assert!(lhs.len() == rhs.len());
        let n = lhs.len();
        let mut count = 0;
        for i in 0..n {
            count += (lhs[i] ^ rhs[i]).count_ones();
        }
        count
    }

    #[test]
    fn fallback_test() {
        assert_eq!(fallback(&[0xff; 16], &[0x00; 16]), 128);
        assert_eq!(fallback(&[0b1010_0000], &[0b0110_0000]), 2);
        assert_eq!(fallback(&[0x5a; 7], &[0x5a; 7]), 0);
        assert_eq!(fallback(&[], &[]), 0);
    }
}
