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

/// Copies the `len` remaining elements behind each pointer into zero-padded
/// arrays of `N` elements, so the tail can be loaded as one full register.
///
/// # Safety
///
/// `len < N` and every pointer must be valid for `len` reads.
#[allow(unused_macros)]
macro_rules! partial_load {
    ($n:literal, $len:expr, $($ptr:ident),*) => {{
        let len: usize = $len;
        debug_assert!(len < $n);
        ($({
            let mut buffer = [Default::default(); $n];
            core::ptr::copy_nonoverlapping($ptr, buffer.as_mut_ptr(), len);
            buffer
        },)*)
    }};
}

#[allow(unused_imports)]
pub(crate) use partial_load;

#[cfg(target_arch = "x86_64")]
pub use x86_64::*;

#[cfg(target_arch = "x86_64")]
mod x86_64 {
    use core::arch::x86_64::*;

    #[inline]
    #[crate::target_capability(enable = "avx2")]
    pub fn emulate_mm256_reduce_add_ps(x: __m256) -> f32 {
        let sum = _mm_add_ps(_mm256_castps256_ps128(x), _mm256_extractf128_ps(x, 1));
        let sum = _mm_hadd_ps(sum, sum);
        let sum = _mm_hadd_ps(sum, sum);
        _mm_cvtss_f32(sum)
    }

    #[inline]
    #[crate::target_capability(enable = "avx2")]
    pub fn emulate_mm256_reduce_add_pd(x: __m256d) -> f64 {
        let sum = _mm_add_pd(_mm256_castpd256_pd128(x), _mm256_extractf128_pd(x, 1));
        let sum = _mm_add_sd(sum, _mm_unpackhi_pd(sum, sum));
        _mm_cvtsd_f64(sum)
    }

    #[inline]
    #[crate::target_capability(enable = "avx2")]
    pub fn emulate_mm256_reduce_add_epi32(x: __m256i) -> i32 {
        let sum = _mm_add_epi32(_mm256_castsi256_si128(x), _mm256_extracti128_si256(x, 1));
        let sum = _mm_hadd_epi32(sum, sum);
        let sum = _mm_hadd_epi32(sum, sum);
        _mm_cvtsi128_si32(sum)
    }

    #[inline]
    #[crate::target_capability(enable = "avx2")]
    pub fn emulate_mm256_reduce_add_epi64(x: __m256i) -> i64 {
        let sum = _mm_add_epi64(_mm256_castsi256_si128(x), _mm256_extracti128_si256(x, 1));
        _mm_cvtsi128_si64(sum).wrapping_add(_mm_extract_epi64(sum, 1))
    }

    #[cfg(test)]
    #[test]
    fn emulate_mm256_reduce_test() {
        if !crate::is_capability_detected!("avx2") {
            println!("test {} ... skipped (avx2)", module_path!());
            return;
        }
        #[crate::target_capability(enable = "avx2")]
        fn run() {
            let ps = _mm256_setr_ps(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0);
            assert_eq!(emulate_mm256_reduce_add_ps(ps), 36.0);
            let pd = _mm256_setr_pd(0.5, 1.5, 2.5, 3.5);
            assert_eq!(emulate_mm256_reduce_add_pd(pd), 8.0);
            let epi32 = _mm256_setr_epi32(1, -2, 3, -4, 5, -6, 7, i32::MAX);
            assert_eq!(
                emulate_mm256_reduce_add_epi32(epi32),
                4i32.wrapping_add(i32::MAX)
            );
            let epi64 = _mm256_setr_epi64x(10, 20, 30, -40);
            assert_eq!(emulate_mm256_reduce_add_epi64(epi64), 20);
        }
        unsafe { run() }
    }
}

#[test]
fn partial_load_test() {
    let data = [1.0f32, 2.0, 3.0];
    let other = [4i8, 5, 6];
    let a = data.as_ptr();
    let b = other.as_ptr();
    let (x, y) = unsafe { partial_load!(4, 3, a, b) };
    assert_eq!(x, [1.0, 2.0, 3.0, 0.0]);
    assert_eq!(y, [4, 5, 6, 0]);
}
