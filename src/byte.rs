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

//! Signed byte kernels. Products are accumulated in `i32` with two's
//! complement wrapping on every tier, so all tiers agree bit for bit.

use crate::capability::Capability;
use crate::resolve::Tier;

pub(crate) static TIERS: &[Tier<unsafe fn(&[i8], &[i8]) -> f32>] = &[
    #[cfg(target_arch = "aarch64")]
    Tier {
        capability: Capability::ARM_NEON,
        inner_product: inner_product::inner_product_neon,
        cosine: cosine::cosine_neon,
        squared_euclidean: squared_euclidean::squared_euclidean_neon,
    },
    #[cfg(target_arch = "x86_64")]
    Tier {
        capability: Capability::X86_AVX2,
        inner_product: inner_product::inner_product_avx2,
        cosine: cosine::cosine_avx2,
        squared_euclidean: squared_euclidean::squared_euclidean_avx2,
    },
    Tier {
        capability: Capability::AUTOVEC,
        inner_product: inner_product::fallback,
        cosine: cosine::fallback,
        squared_euclidean: squared_euclidean::fallback,
    },
];

#[cfg(test)]
fn random_pair(n: usize) -> (Vec<i8>, Vec<i8>) {
    use rand::Rng;
    let mut rng = rand::rng();
    let lhs = (0..n).map(|_| rng.random()).collect::<Vec<_>>();
    let rhs = (0..n).map(|_| rng.random()).collect::<Vec<_>>();
    (lhs, rhs)
}

pub mod inner_product {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx2")]
    pub fn inner_product_avx2(lhs: &[i8], rhs: &[i8]) -> f32 {
        use crate::emulate::{emulate_mm256_reduce_add_epi32, partial_load};
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = _mm256_setzero_si256();
        while n >= 16 {
            let x = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(b.cast())) };
            xy = _mm256_add_epi32(xy, _mm256_madd_epi16(x, y));
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(16, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(b.cast())) };
            xy = _mm256_add_epi32(xy, _mm256_madd_epi16(x, y));
        }
        emulate_mm256_reduce_add_epi32(xy) as f32
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn inner_product_avx2_test() {
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
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_capability(enable = "neon")]
    pub fn inner_product_neon(lhs: &[i8], rhs: &[i8]) -> f32 {
        use crate::emulate::partial_load;
        assert!(lhs.len() == rhs.len());
        use core::arch::aarch64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = vdupq_n_s32(0);
        while n >= 16 {
            let x = unsafe { vld1q_s8(a) };
            let y = unsafe { vld1q_s8(b) };
            let (x_0, x_1) = (vmovl_s8(vget_low_s8(x)), vmovl_high_s8(x));
            let (y_0, y_1) = (vmovl_s8(vget_low_s8(y)), vmovl_high_s8(y));
            xy = vmlal_s16(xy, vget_low_s16(x_0), vget_low_s16(y_0));
            xy = vmlal_high_s16(xy, x_0, y_0);
            xy = vmlal_s16(xy, vget_low_s16(x_1), vget_low_s16(y_1));
            xy = vmlal_high_s16(xy, x_1, y_1);
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(16, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { vld1q_s8(a) };
            let y = unsafe { vld1q_s8(b) };
            let (x_0, x_1) = (vmovl_s8(vget_low_s8(x)), vmovl_high_s8(x));
            let (y_0, y_1) = (vmovl_s8(vget_low_s8(y)), vmovl_high_s8(y));
            xy = vmlal_s16(xy, vget_low_s16(x_0), vget_low_s16(y_0));
            xy = vmlal_high_s16(xy, x_0, y_0);
            xy = vmlal_s16(xy, vget_low_s16(x_1), vget_low_s16(y_1));
            xy = vmlal_high_s16(xy, x_1, y_1);
        }
        vaddvq_s32(xy) as f32
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn inner_product_neon_test() {
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
                assert_eq!(specialized, fallback);
            }
        }
    }

    pub fn fallback(lhs: &[i8], rhs: &[i8]) -> f32 {
        assert!(lhs.len() == rhs.len());
        let n = lhs.len();
        let mut xy = 0i32;
        for i in 0..n {
            xy = xy.wrapping_add(lhs[i] as i32 * rhs[i] as i32);
        }
        xy as f32
    }

    #[test]
    fn fallback_test() {
        assert_eq!(fallback(&[1, 2, 3, 4], &[4, 3, 2, 1]), 20.0);
        assert_eq!(fallback(&[-128, 127], &[-128, 127]), 32513.0);
        assert_eq!(fallback(&[], &[]), 0.0);
        // 128 * 128 * 131000 stays below 2^31
        let x = vec![-128i8; 131000];
        assert_eq!(fallback(&x, &x), 2146304000.0);
    }
}

pub mod cosine {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx2")]
    pub fn cosine_avx2(lhs: &[i8], rhs: &[i8]) -> f32 {
        use crate::emulate::{emulate_mm256_reduce_add_epi32, partial_load};
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = _mm256_setzero_si256();
        let mut xx = _mm256_setzero_si256();
        let mut yy = _mm256_setzero_si256();
        while n >= 16 {
            let x = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(b.cast())) };
            xy = _mm256_add_epi32(xy, _mm256_madd_epi16(x, y));
            xx = _mm256_add_epi32(xx, _mm256_madd_epi16(x, x));
            yy = _mm256_add_epi32(yy, _mm256_madd_epi16(y, y));
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(16, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(b.cast())) };
            xy = _mm256_add_epi32(xy, _mm256_madd_epi16(x, y));
            xx = _mm256_add_epi32(xx, _mm256_madd_epi16(x, x));
            yy = _mm256_add_epi32(yy, _mm256_madd_epi16(y, y));
        }
        crate::cosine(
            emulate_mm256_reduce_add_epi32(xy) as f32,
            emulate_mm256_reduce_add_epi32(xx) as f32,
            emulate_mm256_reduce_add_epi32(yy) as f32,
        )
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn cosine_avx2_test() {
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
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_capability(enable = "neon")]
    pub fn cosine_neon(lhs: &[i8], rhs: &[i8]) -> f32 {
        use crate::emulate::partial_load;
        assert!(lhs.len() == rhs.len());
        use core::arch::aarch64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut xy = vdupq_n_s32(0);
        let mut xx = vdupq_n_s32(0);
        let mut yy = vdupq_n_s32(0);
        while n >= 16 {
            let x = unsafe { vld1q_s8(a) };
            let y = unsafe { vld1q_s8(b) };
            let (x_0, x_1) = (vmovl_s8(vget_low_s8(x)), vmovl_high_s8(x));
            let (y_0, y_1) = (vmovl_s8(vget_low_s8(y)), vmovl_high_s8(y));
            xy = vmlal_s16(xy, vget_low_s16(x_0), vget_low_s16(y_0));
            xy = vmlal_high_s16(xy, x_0, y_0);
            xy = vmlal_s16(xy, vget_low_s16(x_1), vget_low_s16(y_1));
            xy = vmlal_high_s16(xy, x_1, y_1);
            xx = vmlal_s16(xx, vget_low_s16(x_0), vget_low_s16(x_0));
            xx = vmlal_high_s16(xx, x_0, x_0);
            xx = vmlal_s16(xx, vget_low_s16(x_1), vget_low_s16(x_1));
            xx = vmlal_high_s16(xx, x_1, x_1);
            yy = vmlal_s16(yy, vget_low_s16(y_0), vget_low_s16(y_0));
            yy = vmlal_high_s16(yy, y_0, y_0);
            yy = vmlal_s16(yy, vget_low_s16(y_1), vget_low_s16(y_1));
            yy = vmlal_high_s16(yy, y_1, y_1);
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(16, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { vld1q_s8(a) };
            let y = unsafe { vld1q_s8(b) };
            let (x_0, x_1) = (vmovl_s8(vget_low_s8(x)), vmovl_high_s8(x));
            let (y_0, y_1) = (vmovl_s8(vget_low_s8(y)), vmovl_high_s8(y));
            xy = vmlal_s16(xy, vget_low_s16(x_0), vget_low_s16(y_0));
            xy = vmlal_high_s16(xy, x_0, y_0);
            xy = vmlal_s16(xy, vget_low_s16(x_1), vget_low_s16(y_1));
            xy = vmlal_high_s16(xy, x_1, y_1);
            xx = vmlal_s16(xx, vget_low_s16(x_0), vget_low_s16(x_0));
            xx = vmlal_high_s16(xx, x_0, x_0);
            xx = vmlal_s16(xx, vget_low_s16(x_1), vget_low_s16(x_1));
            xx = vmlal_high_s16(xx, x_1, x_1);
            yy = vmlal_s16(yy, vget_low_s16(y_0), vget_low_s16(y_0));
            yy = vmlal_high_s16(yy, y_0, y_0);
            yy = vmlal_s16(yy, vget_low_s16(y_1), vget_low_s16(y_1));
            yy = vmlal_high_s16(yy, y_1, y_1);
        }
        crate::cosine(
            vaddvq_s32(xy) as f32,
            vaddvq_s32(xx) as f32,
            vaddvq_s32(yy) as f32,
        )
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn cosine_neon_test() {
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
                assert_eq!(specialized, fallback);
            }
        }
    }

    pub fn fallback(lhs: &[i8], rhs: &[i8]) -> f32 {
        assert!(lhs.len() == rhs.len());
        let n = lhs.len();
        let mut xy = 0i32;
        let mut xx = 0i32;
        let mut yy = 0i32;
        for i in 0..n {
            let (x, y) = (lhs[i] as i32, rhs[i] as i32);
            xy = xy.wrapping_add(x * y);
            xx = xx.wrapping_add(x * x);
            yy = yy.wrapping_add(y * y);
        }
        crate::cosine(xy as f32, xx as f32, yy as f32)
    }

    #[test]
    fn fallback_test() {
        assert_eq!(fallback(&[3, 0], &[0, 5]), 0.0);
        assert_eq!(fallback(&[3, 4], &[6, 8]), 1.0);
        assert_eq!(fallback(&[3, 4], &[-3, -4]), -1.0);
    }
}

pub mod squared_euclidean {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_capability(enable = "avx2")]
    pub fn squared_euclidean_avx2(lhs: &[i8], rhs: &[i8]) -> f32 {
        use crate::emulate::{emulate_mm256_reduce_add_epi32, partial_load};
        assert!(lhs.len() == rhs.len());
        use core::arch::x86_64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut d2 = _mm256_setzero_si256();
        while n >= 16 {
            let x = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(b.cast())) };
            let d = _mm256_sub_epi16(x, y);
            d2 = _mm256_add_epi32(d2, _mm256_madd_epi16(d, d));
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(16, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtepi8_epi16(_mm_loadu_si128(b.cast())) };
            let d = _mm256_sub_epi16(x, y);
            d2 = _mm256_add_epi32(d2, _mm256_madd_epi16(d, d));
        }
        emulate_mm256_reduce_add_epi32(d2) as f32
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn squared_euclidean_avx2_test() {
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
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_capability(enable = "neon")]
    pub fn squared_euclidean_neon(lhs: &[i8], rhs: &[i8]) -> f32 {
        use crate::emulate::partial_load;
        assert!(lhs.len() == rhs.len());
        use core::arch::aarch64::*;
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut d2 = vdupq_n_s32(0);
        while n >= 16 {
            let x = unsafe { vld1q_s8(a) };
            let y = unsafe { vld1q_s8(b) };
            let d_0 = vsubl_s8(vget_low_s8(x), vget_low_s8(y));
            let d_1 = vsubl_high_s8(x, y);
            d2 = vmlal_s16(d2, vget_low_s16(d_0), vget_low_s16(d_0));
            d2 = vmlal_high_s16(d2, d_0, d_0);
            d2 = vmlal_s16(d2, vget_low_s16(d_1), vget_low_s16(d_1));
            d2 = vmlal_high_s16(d2, d_1, d_1);
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let (_a, _b) = unsafe { partial_load!(16, n, a, b) };
            (a, b) = (_a.as_ptr(), _b.as_ptr());
            let x = unsafe { vld1q_s8(a) };
            let y = unsafe { vld1q_s8(b) };
            let d_0 = vsubl_s8(vget_low_s8(x), vget_low_s8(y));
            let d_1 = vsubl_high_s8(x, y);
            d2 = vmlal_s16(d2, vget_low_s16(d_0), vget_low_s16(d_0));
            d2 = vmlal_high_s16(d2, d_0, d_0);
            d2 = vmlal_s16(d2, vget_low_s16(d_1), vget_low_s16(d_1));
            d2 = vmlal_high_s16(d2, d_1, d_1);
        }
        vaddvq_s32(d2) as f32
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn squared_euclidean_neon_test() {
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
                assert_eq!(specialized, fallback);
            }
        }
    }

    pub fn fallback(lhs: &[i8], rhs: &[i8]) -> f32 {
        assert!(lhs.len() == rhs.len());
        let n = lhs.len();
        let mut d2 = 0i32;
        for i in 0..n {
            let d = lhs[i] as i32 - rhs[i] as i32;
            d2 = d2.wrapping_add(d * d);
        }
        d2 as f32
    }

    #[test]
    fn fallback_test() {
        assert_eq!(fallback(&[-128, 127], &[127, -128]), 130050.0);
        assert_eq!(fallback(&[5, 5], &[5, 5]), 0.0);
    }
}
