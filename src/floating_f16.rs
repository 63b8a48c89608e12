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

//! Half-precision kernels. Elements are widened to `f32` before any
//! arithmetic.

use crate::capability::Capability;
use crate::resolve::Tier;
use half::f16;

pub(crate) static TIERS: &[Tier<unsafe fn(&[f16], &[f16]) -> f32>] = &[
    #[cfg(simkern_sve)]
    Tier {
        capability: Capability::ARM_SVE,
        inner_product: inner_product::inner_product_sve,
        cosine: cosine::cosine_sve,
        squared_euclidean: squared_euclidean::squared_euclidean_sve,
    },
    #[cfg(simkern_neon_f16)]
    Tier {
        capability: Capability::ARM_NEON,
        inner_product: inner_product::inner_product_neon,
        cosine: cosine::cosine_neon,
        squared_euclidean: squared_euclidean::squared_euclidean_neon,
    },
    #[cfg(target_arch = "x86_64")]
    Tier {
        capability: Capability::X86_AVX512,
        inner_product: inner_product::inner_product_avx512,
        cosine: cosine::cosine_avx512,
        squared_euclidean: squared_euclidean::squared_euclidean_avx512,
    },
    #[cfg(target_arch = "x86_64")]
    Tier {
        capability: Capability::X86_AVX2FP16,
        inner_product: inner_product::inner_product_avx2fp16,
        cosine: cosine::cosine_avx2fp16,
        squared_euclidean: squared_euclidean::squared_euclidean_avx2fp16,
    },
    Tier {
        capability: Capability::AUTOVEC,
        inner_product: inner_product::fallback,
        cosine: cosine::fallback,
        squared_euclidean: squared_euclidean::fallback,
    },
];

#[cfg(test)]
fn random_pair(n: usize) -> (Vec<f16>, Vec<f16>) {
    use rand::Rng;
    let mut rng = rand::rng();
    let lhs = (0..n)
        .map(|_| f16::from_f32(rng.random_range(-1.0..=1.0)))
        .collect::<Vec<_>>();
    let rhs = (0..n)
        .map(|_| f16::from_f32(rng.random_range(-1.0..=1.0)))
        .collect::<Vec<_>>();
    (lhs, rhs)
}

pub mod inner_product {
    use half::f16;

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx512")]
    pub fn inner_product_avx512(lhs: &[f16], rhs: &[f16]) -> f32 {
        use crate::emulate::partial_load;
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = _mm512_setzero_ps();
        while n >= 16 {
            let x = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(a.cast())) };
            let y = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(b.cast())) };
            xy = _mm512_fmadd_ps(x, y, xy);
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(16, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(a.cast())) };
            let y = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(b.cast())) };
            xy = _mm512_fmadd_ps(x, y, xy);
        }
        _mm512_reduce_add_ps(xy)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn inner_product_avx512_test() {
        const EPSILON: f32 = 0.008;
        if !crate::is_capability_detected!("avx512") {
            println!("test {} ... skipped (avx512)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { inner_product_avx512(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx2fp16")]
    pub fn inner_product_avx2fp16(lhs: &[f16], rhs: &[f16]) -> f32 {
        use crate::emulate::{emulate_mm256_reduce_add_ps, partial_load};
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = _mm256_setzero_ps();
        while n >= 8 {
            let x = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(b.cast())) };
            xy = _mm256_add_ps(_mm256_mul_ps(x, y), xy);
            (n, a, b) = unsafe { (n - 8, a.add(8), b.add(8)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(8, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(b.cast())) };
            xy = _mm256_add_ps(_mm256_mul_ps(x, y), xy);
        }
        emulate_mm256_reduce_add_ps(xy)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn inner_product_avx2fp16_test() {
        const EPSILON: f32 = 0.008;
        if !crate::is_capability_detected!("avx2fp16") {
            println!("test {} ... skipped (avx2fp16)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { inner_product_avx2fp16(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(simkern_sve)]
    #[crate::target_capability(enable = "sve")]
    pub fn inner_product_sve(lhs: &[f16], rhs: &[f16]) -> f32 {
        unsafe extern "C" {
            #[link_name = "simkern_sve_f16_ip"]
            unsafe fn f(a: *const (), b: *const (), n: usize) -> f32;
        }
        assert!(lhs.len() == rhs.len());
        unsafe { f(lhs.as_ptr().cast(), rhs.as_ptr().cast(), lhs.len()) }
    }

    #[cfg(all(simkern_sve, test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn inner_product_sve_test() {
        const EPSILON: f32 = 0.008;
        if !crate::is_capability_detected!("sve") {
            println!("test {} ... skipped (sve)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { inner_product_sve(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(simkern_neon_f16)]
    #[crate::target_capability(enable = "neon")]
    pub fn inner_product_neon(lhs: &[f16], rhs: &[f16]) -> f32 {
        unsafe extern "C" {
            #[link_name = "simkern_neon_f16_ip"]
            unsafe fn f(a: *const (), b: *const (), n: usize) -> f32;
        }
        assert!(lhs.len() == rhs.len());
        unsafe { f(lhs.as_ptr().cast(), rhs.as_ptr().cast(), lhs.len()) }
    }

    #[cfg(all(simkern_neon_f16, test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn inner_product_neon_test() {
        const EPSILON: f32 = 0.008;
        if !crate::is_capability_detected!("neon") {
            println!("test {} ... skipped (neon)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { inner_product_neon(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    pub fn fallback(lhs: &[f16], rhs: &[f16]) -> f32 {
        assert!(lhs.len() == rhs.len());
        let n = lhs.len();
        let mut xy = 0.0f32;
        for i in 0..n {
            xy += lhs[i].to_f32() * rhs[i].to_f32();
        }
        xy
    }

    #[test]
    fn fallback_test() {
        let lhs = [1.0f32, 2.0, 3.0, 4.0].map(f16::from_f32);
        let rhs = [4.0f32, 3.0, 2.0, 1.0].map(f16::from_f32);
        assert_eq!(fallback(&lhs, &rhs), 20.0);
        // 300 * 300 overflows `f16` but not `f32`
        let big = [f16::from_f32(300.0)];
        assert_eq!(fallback(&big, &big), 90000.0);
    }
}

pub mod cosine {
    use half::f16;

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx512")]
    pub fn cosine_avx512(lhs: &[f16], rhs: &[f16]) -> f32 {
        use crate::emulate::partial_load;
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = _mm512_setzero_ps();
        let mut xx = _mm512_setzero_ps();
        let mut yy = _mm512_setzero_ps();
        while n >= 16 {
            let x = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(a.cast())) };
            let y = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(b.cast())) };
            xy = _mm512_fmadd_ps(x, y, xy);
            xx = _mm512_fmadd_ps(x, x, xx);
            yy = _mm512_fmadd_ps(y, y, yy);
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(16, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(a.cast())) };
            let y = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(b.cast())) };
            xy = _mm512_fmadd_ps(x, y, xy);
            xx = _mm512_fmadd_ps(x, x, xx);
            yy = _mm512_fmadd_ps(y, y, yy);
        }
        crate::cosine(
            _mm512_reduce_add_ps(xy),
            _mm512_reduce_add_ps(xx),
            _mm512_reduce_add_ps(yy),
        )
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn cosine_avx512_test() {
        const EPSILON: f32 = 0.0001;
        if !crate::is_capability_detected!("avx512") {
            println!("test {} ... skipped (avx512)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { cosine_avx512(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx2fp16")]
    pub fn cosine_avx2fp16(lhs: &[f16], rhs: &[f16]) -> f32 {
        use crate::emulate::{emulate_mm256_reduce_add_ps, partial_load};
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = _mm256_setzero_ps();
        let mut xx = _mm256_setzero_ps();
        let mut yy = _mm256_setzero_ps();
        while n >= 8 {
            let x = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(b.cast())) };
            xy = _mm256_add_ps(_mm256_mul_ps(x, y), xy);
            xx = _mm256_add_ps(_mm256_mul_ps(x, x), xx);
            yy = _mm256_add_ps(_mm256_mul_ps(y, y), yy);
            (n, a, b) = unsafe { (n - 8, a.add(8), b.add(8)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(8, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(b.cast())) };
            xy = _mm256_add_ps(_mm256_mul_ps(x, y), xy);
            xx = _mm256_add_ps(_mm256_mul_ps(x, x), xx);
            yy = _mm256_add_ps(_mm256_mul_ps(y, y), yy);
        }
        crate::cosine(
            emulate_mm256_reduce_add_ps(xy),
            emulate_mm256_reduce_add_ps(xx),
            emulate_mm256_reduce_add_ps(yy),
        )
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn cosine_avx2fp16_test() {
        const EPSILON: f32 = 0.0001;
        if !crate::is_capability_detected!("avx2fp16") {
            println!("test {} ... skipped (avx2fp16)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { cosine_avx2fp16(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(simkern_sve)]
    #[crate::target_capability(enable = "sve")]
    pub fn cosine_sve(lhs: &[f16], rhs: &[f16]) -> f32 {
        unsafe extern "C" {
            #[link_name = "simkern_sve_f16_cos"]
            unsafe fn f(a: *const (), b: *const (), n: usize) -> f32;
        }
        assert!(lhs.len() == rhs.len());
        unsafe { f(lhs.as_ptr().cast(), rhs.as_ptr().cast(), lhs.len()) }
    }

    #[cfg(all(simkern_sve, test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn cosine_sve_test() {
        const EPSILON: f32 = 0.0001;
        if !crate::is_capability_detected!("sve") {
            println!("test {} ... skipped (sve)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { cosine_sve(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(simkern_neon_f16)]
    #[crate::target_capability(enable = "neon")]
    pub fn cosine_neon(lhs: &[f16], rhs: &[f16]) -> f32 {
        unsafe extern "C" {
            #[link_name = "simkern_neon_f16_cos"]
            unsafe fn f(a: *const (), b: *const (), n: usize) -> f32;
        }
        assert!(lhs.len() == rhs.len());
        unsafe { f(lhs.as_ptr().cast(), rhs.as_ptr().cast(), lhs.len()) }
    }

    #[cfg(all(simkern_neon_f16, test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn cosine_neon_test() {
        const EPSILON: f32 = 0.0001;
        if !crate::is_capability_detected!("neon") {
            println!("test {} ... skipped (neon)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { cosine_neon(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    pub fn fallback(lhs: &[f16], rhs: &[f16]) -> f32 {
        assert!(lhs.len() == rhs.len());
        let n = lhs.len();
        let mut xy = 0.0f32;
        let mut xx = 0.0f32;
        let mut yy = 0.0f32;
        for i in 0..n {
            let (x, y) = (lhs[i].to_f32(), rhs[i].to_f32());
            xy += x * y;
            xx += x * x;
            yy += y * y;
        }
        crate::cosine(xy, xx, yy)
    }
}

pub mod squared_euclidean {
    use half::f16;

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx512")]
    pub fn squared_euclidean_avx512(lhs: &[f16], rhs: &[f16]) -> f32 {
        use crate::emulate::partial_load;
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut d2 = _mm512_setzero_ps();
        while n >= 16 {
            let x = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(a.cast())) };
            let y = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(b.cast())) };
            let d = _mm512_sub_ps(x, y);
            d2 = _mm512_fmadd_ps(d, d, d2);
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(16, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(a.cast())) };
            let y = unsafe { _mm512_cvtph_ps(_mm256_loadu_si256(b.cast())) };
            let d = _mm512_sub_ps(x, y);
            d2 = _mm512_fmadd_ps(d, d, d2);
        }
        _mm512_reduce_add_ps(d2)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn squared_euclidean_avx512_test() {
        const EPSILON: f32 = 0.02;
        if !crate::is_capability_detected!("avx512") {
            println!("test {} ... skipped (avx512)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { squared_euclidean_avx512(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx2fp16")]
    pub fn squared_euclidean_avx2fp16(lhs: &[f16], rhs: &[f16]) -> f32 {
        use crate::emulate::{emulate_mm256_reduce_add_ps, partial_load};
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut d2 = _mm256_setzero_ps();
        while n >= 8 {
            let x = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(b.cast())) };
            let d = _mm256_sub_ps(x, y);
            d2 = _mm256_add_ps(_mm256_mul_ps(d, d), d2);
            (n, a, b) = unsafe { (n - 8, a.add(8), b.add(8)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(8, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(b.cast())) };
            let d = _mm256_sub_ps(x, y);
            d2 = _mm256_add_ps(_mm256_mul_ps(d, d), d2);
        }
        emulate_mm256_reduce_add_ps(d2)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn squared_euclidean_avx2fp16_test() {
        const EPSILON: f32 = 0.02;
        if !crate::is_capability_detected!("avx2fp16") {
            println!("test {} ... skipped (avx2fp16)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { squared_euclidean_avx2fp16(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(simkern_sve)]
    #[crate::target_capability(enable = "sve")]
    pub fn squared_euclidean_sve(lhs: &[f16], rhs: &[f16]) -> f32 {
        unsafe extern "C" {
            #[link_name = "simkern_sve_f16_l2sq"]
            unsafe fn f(a: *const (), b: *const (), n: usize) -> f32;
        }
        assert!(lhs.len() == rhs.len());
        unsafe { f(lhs.as_ptr().cast(), rhs.as_ptr().cast(), lhs.len()) }
    }

    #[cfg(all(simkern_sve, test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn squared_euclidean_sve_test() {
        const EPSILON: f32 = 0.02;
        if !crate::is_capability_detected!("sve") {
            println!("test {} ... skipped (sve)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { squared_euclidean_sve(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(simkern_neon_f16)]
    #[crate::target_capability(enable = "neon")]
    pub fn squared_euclidean_neon(lhs: &[f16], rhs: &[f16]) -> f32 {
        unsafe extern "C" {
            #[link_name = "simkern_neon_f16_l2sq"]
            unsafe fn f(a: *const (), b: *const (), n: usize) -> f32;
        }
        assert!(lhs.len() == rhs.len());
        unsafe { f(lhs.as_ptr().cast(), rhs.as_ptr().cast(), lhs.len()) }
    }

    #[cfg(all(simkern_neon_f16, test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn squared_euclidean_neon_test() {
        const EPSILON: f32 = 0.02;
        if !crate::is_capability_detected!("neon") {
            println!("test {} ... skipped (neon)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { squared_euclidean_neon(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    pub fn fallback(lhs: &[f16], rhs: &[f16]) -> f32 {
        assert!(lhs.len() == rhs.len());
        let n = lhs.len();
        let mut d2 = 0.0f32;
        for i in 0..n {
            let d = lhs[i].to_f32() - rhs[i].to_f32();
            d2 += d * d;
        }
        d2
    }
}
