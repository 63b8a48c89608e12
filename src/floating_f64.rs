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

//! Double-precision kernels. Partial sums are kept in `f64` and the result is
//! rounded to `f32` once.

use crate::capability::Capability;
use crate::resolve::Tier;

pub(crate) static TIERS: &[Tier<unsafe fn(&[f64], &[f64]) -> f32>] = &[
    #[cfg(target_arch = "x86_64")]
    Tier {
        capability: Capability::X86_AVX512,
        inner_product: inner_product::inner_product_avx512,
        cosine: cosine::cosine_avx512,
        squared_euclidean: squared_euclidean::squared_euclidean_avx512,
    },
    #[cfg(target_arch = "x86_64")]
    Tier {
        capability: Capability::X86_AVX2,
        inner_product: inner_product::inner_product_avx2,
        cosine: cosine::cosine_avx2,
        squared_euclidean: squared_euclidean::squared_euclidean_avx2,
    },
    #[cfg(target_arch = "aarch64")]
    Tier {
        capability: Capability::ARM_NEON,
        inner_product: inner_product::inner_product_neon,
        cosine: cosine::cosine_neon,
        squared_euclidean: squared_euclidean::squared_euclidean_neon,
    },
    Tier {
        capability: Capability::AUTOVEC,
        inner_product: inner_product::fallback,
        cosine: cosine::fallback,
        squared_euclidean: squared_euclidean::fallback,
    },
];

fn cosine(xy: f64, xx: f64, yy: f64) -> f32 {
    (xy / (xx.sqrt() * yy.sqrt())) as f32
}

#[cfg(test)]
fn random_pair(n: usize) -> (Vec<f64>, Vec<f64>) {
    use rand::Rng;
    let mut rng = rand::rng();
    let lhs = (0..n)
        .map(|_| rng.random_range(-1.0..=1.0))
        .collect::<Vec<_>>();
    let rhs = (0..n)
        .map(|_| rng.random_range(-1.0..=1.0))
        .collect::<Vec<_>>();
    (lhs, rhs)
}

pub mod inner_product {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx512")]
    pub fn inner_product_avx512(lhs: &[f64], rhs: &[f64]) -> f32 {
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = _mm512_setzero_pd();
        while n >= 8 {
            let x = unsafe { _mm512_loadu_pd(a) };
            let y = unsafe { _mm512_loadu_pd(b) };
            xy = _mm512_fmadd_pd(x, y, xy);
            (n, a, b) = unsafe { (n - 8, a.add(8), b.add(8)) };
        }
        if n > 0 {
            let mask = ((1u32 << n) - 1) as u8;
            let x = unsafe { _mm512_maskz_loadu_pd(mask, a) };
            let y = unsafe { _mm512_maskz_loadu_pd(mask, b) };
            xy = _mm512_fmadd_pd(x, y, xy);
        }
        _mm512_reduce_add_pd(xy) as f32
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn inner_product_avx512_test() {
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
    #[crate::target_capability(enable = "avx2")]
    pub fn inner_product_avx2(lhs: &[f64], rhs: &[f64]) -> f32 {
        use crate::emulate::{emulate_mm256_reduce_add_pd, partial_load};
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = _mm256_setzero_pd();
        while n >= 4 {
            let x = unsafe { _mm256_loadu_pd(a) };
            let y = unsafe { _mm256_loadu_pd(b) };
            xy = _mm256_add_pd(_mm256_mul_pd(x, y), xy);
            (n, a, b) = unsafe { (n - 4, a.add(4), b.add(4)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(4, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm256_loadu_pd(a) };
            let y = unsafe { _mm256_loadu_pd(b) };
            xy = _mm256_add_pd(_mm256_mul_pd(x, y), xy);
        }
        emulate_mm256_reduce_add_pd(xy) as f32
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn inner_product_avx2_test() {
        const EPSILON: f32 = 0.0001;
        if !crate::is_capability_detected!("avx2") {
            println!("test {} ... skipped (avx2)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { inner_product_avx2(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_capability(enable = "neon")]
    pub fn inner_product_neon(lhs: &[f64], rhs: &[f64]) -> f32 {
        assert!(lhs.len() == rhs.len());
        use core::arch::aarch64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = vdupq_n_f64(0.0);
        while n >= 2 {
            let x = unsafe { vld1q_f64(a) };
            let y = unsafe { vld1q_f64(b) };
            xy = vfmaq_f64(xy, x, y);
            (n, a, b) = unsafe { (n - 2, a.add(2), b.add(2)) };
        }
        let mut xy = vaddvq_f64(xy);
        if n > 0 {
            let (x, y) = unsafe { (a.read(), b.read()) };
            xy += x * y;
        }
        xy as f32
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn inner_product_neon_test() {
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
                let specialized = unsafe { inner_product_neon(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    pub fn fallback(lhs: &[f64], rhs: &[f64]) -> f32 {
        assert!(lhs.len() == rhs.len());
        let n = lhs.len();
        let mut xy = 0.0f64;
        for i in 0..n {
            xy += lhs[i] * rhs[i];
        }
        xy as f32
    }

    #[test]
    fn fallback_test() {
        assert_eq!(fallback(&[1.0, 2.0, 3.0, 4.0], &[4.0, 3.0, 2.0, 1.0]), 20.0);
        assert_eq!(fallback(&[], &[]), 0.0);
        // 2^-30 is lost if the sum is carried in `f32`
        let lhs = [1.0, 2.0f64.powi(-30), -1.0];
        assert_eq!(fallback(&lhs, &[1.0, 1.0, 1.0]), 2.0f32.powi(-30));
    }
}

pub mod cosine {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx512")]
    pub fn cosine_avx512(lhs: &[f64], rhs: &[f64]) -> f32 {
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = _mm512_setzero_pd();
        let mut xx = _mm512_setzero_pd();
        let mut yy = _mm512_setzero_pd();
        while n >= 8 {
            let x = unsafe { _mm512_loadu_pd(a) };
            let y = unsafe { _mm512_loadu_pd(b) };
            xy = _mm512_fmadd_pd(x, y, xy);
            xx = _mm512_fmadd_pd(x, x, xx);
            yy = _mm512_fmadd_pd(y, y, yy);
            (n, a, b) = unsafe { (n - 8, a.add(8), b.add(8)) };
        }
        if n > 0 {
            let mask = ((1u32 << n) - 1) as u8;
            let x = unsafe { _mm512_maskz_loadu_pd(mask, a) };
            let y = unsafe { _mm512_maskz_loadu_pd(mask, b) };
            xy = _mm512_fmadd_pd(x, y, xy);
            xx = _mm512_fmadd_pd(x, x, xx);
            yy = _mm512_fmadd_pd(y, y, yy);
        }
        super::cosine(
            _mm512_reduce_add_pd(xy),
            _mm512_reduce_add_pd(xx),
            _mm512_reduce_add_pd(yy),
        )
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn cosine_avx512_test() {
        const EPSILON: f32 = 0.000001;
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
    #[crate::target_capability(enable = "avx2")]
    pub fn cosine_avx2(lhs: &[f64], rhs: &[f64]) -> f32 {
        use crate::emulate::{emulate_mm256_reduce_add_pd, partial_load};
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = _mm256_setzero_pd();
        let mut xx = _mm256_setzero_pd();
        let mut yy = _mm256_setzero_pd();
        while n >= 4 {
            let x = unsafe { _mm256_loadu_pd(a) };
            let y = unsafe { _mm256_loadu_pd(b) };
            xy = _mm256_add_pd(_mm256_mul_pd(x, y), xy);
            xx = _mm256_add_pd(_mm256_mul_pd(x, x), xx);
            yy = _mm256_add_pd(_mm256_mul_pd(y, y), yy);
            (n, a, b) = unsafe { (n - 4, a.add(4), b.add(4)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(4, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm256_loadu_pd(a) };
            let y = unsafe { _mm256_loadu_pd(b) };
            xy = _mm256_add_pd(_mm256_mul_pd(x, y), xy);
            xx = _mm256_add_pd(_mm256_mul_pd(x, x), xx);
            yy = _mm256_add_pd(_mm256_mul_pd(y, y), yy);
        }
        super::cosine(
            emulate_mm256_reduce_add_pd(xy),
            emulate_mm256_reduce_add_pd(xx),
            emulate_mm256_reduce_add_pd(yy),
        )
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn cosine_avx2_test() {
        const EPSILON: f32 = 0.000001;
        if !crate::is_capability_detected!("avx2") {
            println!("test {} ... skipped (avx2)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { cosine_avx2(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_capability(enable = "neon")]
    pub fn cosine_neon(lhs: &[f64], rhs: &[f64]) -> f32 {
        assert!(lhs.len() == rhs.len());
        use core::arch::aarch64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = vdupq_n_f64(0.0);
        let mut xx = vdupq_n_f64(0.0);
        let mut yy = vdupq_n_f64(0.0);
        while n >= 2 {
            let x = unsafe { vld1q_f64(a) };
            let y = unsafe { vld1q_f64(b) };
            xy = vfmaq_f64(xy, x, y);
            xx = vfmaq_f64(xx, x, x);
            yy = vfmaq_f64(yy, y, y);
            (n, a, b) = unsafe { (n - 2, a.add(2), b.add(2)) };
        }
        let mut xy = vaddvq_f64(xy);
        let mut xx = vaddvq_f64(xx);
        let mut yy = vaddvq_f64(yy);
        if n > 0 {
            let (x, y) = unsafe { (a.read(), b.read()) };
            xy += x * y;
            xx += x * x;
            yy += y * y;
        }
        super::cosine(xy, xx, yy)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn cosine_neon_test() {
        const EPSILON: f32 = 0.000001;
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

    pub fn fallback(lhs: &[f64], rhs: &[f64]) -> f32 {
        assert!(lhs.len() == rhs.len());
        let n = lhs.len();
        let mut xy = 0.0f64;
        let mut xx = 0.0f64;
        let mut yy = 0.0f64;
        for i in 0..n {
            xy += lhs[i] * rhs[i];
            xx += lhs[i] * lhs[i];
            yy += rhs[i] * rhs[i];
        }
        super::cosine(xy, xx, yy)
    }
}

pub mod squared_euclidean {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx512")]
    pub fn squared_euclidean_avx512(lhs: &[f64], rhs: &[f64]) -> f32 {
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut d2 = _mm512_setzero_pd();
        while n >= 8 {
            let x = unsafe { _mm512_loadu_pd(a) };
            let y = unsafe { _mm512_loadu_pd(b) };
            let d = _mm512_sub_pd(x, y);
            d2 = _mm512_fmadd_pd(d, d, d2);
            (n, a, b) = unsafe { (n - 8, a.add(8), b.add(8)) };
        }
        if n > 0 {
            let mask = ((1u32 << n) - 1) as u8;
            let x = unsafe { _mm512_maskz_loadu_pd(mask, a) };
            let y = unsafe { _mm512_maskz_loadu_pd(mask, b) };
            let d = _mm512_sub_pd(x, y);
            d2 = _mm512_fmadd_pd(d, d, d2);
        }
        _mm512_reduce_add_pd(d2) as f32
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn squared_euclidean_avx512_test() {
        const EPSILON: f32 = 0.001;
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
    #[crate::target_capability(enable = "avx2")]
    pub fn squared_euclidean_avx2(lhs: &[f64], rhs: &[f64]) -> f32 {
        use crate::emulate::{emulate_mm256_reduce_add_pd, partial_load};
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut d2 = _mm256_setzero_pd();
        while n >= 4 {
            let x = unsafe { _mm256_loadu_pd(a) };
            let y = unsafe { _mm256_loadu_pd(b) };
            let d = _mm256_sub_pd(x, y);
            d2 = _mm256_add_pd(_mm256_mul_pd(d, d), d2);
            (n, a, b) = unsafe { (n - 4, a.add(4), b.add(4)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(4, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm256_loadu_pd(a) };
            let y = unsafe { _mm256_loadu_pd(b) };
            let d = _mm256_sub_pd(x, y);
            d2 = _mm256_add_pd(_mm256_mul_pd(d, d), d2);
        }
        emulate_mm256_reduce_add_pd(d2) as f32
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn squared_euclidean_avx2_test() {
        const EPSILON: f32 = 0.001;
        if !crate::is_capability_detected!("avx2") {
            println!("test {} ... skipped (avx2)", module_path!());
            return;
        }
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let (lhs, rhs) = super::random_pair(4016);
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let specialized = unsafe { squared_euclidean_avx2(lhs, rhs) };
                let fallback = fallback(lhs, rhs);
                assert!(
                    (specialized - fallback).abs() < EPSILON,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_capability(enable = "neon")]
    pub fn squared_euclidean_neon(lhs: &[f64], rhs: &[f64]) -> f32 {
        assert!(lhs.len() == rhs.len());
        use core::arch::aarch64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut d2 = vdupq_n_f64(0.0);
        while n >= 2 {
            let x = unsafe { vld1q_f64(a) };
            let y = unsafe { vld1q_f64(b) };
            let d = vsubq_f64(x, y);
            d2 = vfmaq_f64(d2, d, d);
            (n, a, b) = unsafe { (n - 2, a.add(2), b.add(2)) };
        }
        let mut d2 = vaddvq_f64(d2);
        if n > 0 {
            let (x, y) = unsafe { (a.read(), b.read()) };
            d2 += (x - y) * (x - y);
        }
        d2 as f32
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn squared_euclidean_neon_test() {
        const EPSILON: f32 = 0.001;
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

    pub fn fallback(lhs: &[f64], rhs: &[f64]) -> f32 {
        assert!(lhs.len() == rhs.len());
        let n = lhs.len();
        let mut d2 = 0.0f64;
        for i in 0..n {
            let d = lhs[i] - rhs[i];
            d2 += d * d;
        }
        d2 as f32
    }
}
