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
use crate::metric::{DataType, MetricKind};
use half::f16;
use std::fmt::{Debug, Formatter};

/// Element types a [`Kernel`] can be invoked on.
///
/// `u8` stands for [`DataType::Bit1`]: each byte packs eight bits.
pub trait Element: Copy + sealed::Sealed + 'static {
    const DATATYPE: DataType;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! impl_element {
    ($($t:ty => $datatype:ident),*) => {
        $(
            impl sealed::Sealed for $t {}
            impl Element for $t {
                const DATATYPE: DataType = DataType::$datatype;
            }
        )*
    };
}

impl_element!(f64 => Float64, f32 => Float32, f16 => Float16, i8 => Int8, u8 => Bit1);

#[derive(Clone, Copy)]
pub(crate) enum Function {
    Float64(unsafe fn(&[f64], &[f64]) -> f32),
    Float32(unsafe fn(&[f32], &[f32]) -> f32),
    Float16(unsafe fn(&[f16], &[f16]) -> f32),
    Int8(unsafe fn(&[i8], &[i8]) -> f32),
    Bit1(unsafe fn(&[u8], &[u8]) -> u32),
}

/// One concrete metric routine, chosen by [`crate::resolve_metric`].
///
/// A `Kernel` can only be obtained from the resolver, which checks that the
/// processor supports the instructions the routine is compiled with. It is
/// plain data: copy it, cache it and share it across threads freely.
#[derive(Clone, Copy)]
pub struct Kernel {
    kind: MetricKind,
    datatype: DataType,
    capability: Capability,
    function: Function,
}

impl Kernel {
    /// Only the resolver calls this, after checking `capability` against
    /// the detected processor features.
    pub(crate) fn new(
        kind: MetricKind,
        datatype: DataType,
        capability: Capability,
        function: Function,
    ) -> Self {
        Self {
            kind,
            datatype,
            capability,
            function,
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    /// The tier the routine belongs to, [`Capability::AUTOVEC`] for the
    /// portable fallback.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Computes the metric of two vectors.
    ///
    /// Hamming distances are returned as `f32`; use [`Kernel::hamming`] for
    /// an exact count.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not the datatype the kernel was resolved for or if
    /// the lengths differ.
    pub fn compute<T: Element>(&self, lhs: &[T], rhs: &[T]) -> f32 {
        assert_eq!(
            T::DATATYPE,
            self.datatype,
            "kernel resolved for `{}` is called with `{}`",
            self.datatype,
            T::DATATYPE
        );
        assert_eq!(lhs.len(), rhs.len(), "vectors differ in length");
        unsafe {
            self.compute_raw(
                lhs.as_ptr().cast(),
                rhs.as_ptr().cast(),
                lhs.len(),
                rhs.len(),
            )
        }
    }

    /// Number of differing bits of two packed bit arrays.
    ///
    /// # Panics
    ///
    /// Panics if the kernel is not a [`DataType::Bit1`] kernel or if the
    /// lengths differ.
    pub fn hamming(&self, lhs: &[u8], rhs: &[u8]) -> u32 {
        assert_eq!(lhs.len(), rhs.len(), "vectors differ in length");
        match self.function {
            Function::Bit1(f) => unsafe { f(lhs, rhs) },
            _ => panic!("kernel resolved for `{}` is not a bit kernel", self.datatype),
        }
    }

    /// Computes the metric over raw memory: the uniform invocation contract
    /// shared by every kernel.
    ///
    /// `len_a` elements of the resolved datatype are read from each pointer
    /// (for [`DataType::Bit1`] an element is one byte of packed bits).
    /// `len_b` names the dimensionality of `b` and must equal `len_a`.
    ///
    /// Hamming counts come back as `f32`, which is exact below `2^24`
    /// differing bits. Use [`Kernel::hamming`] for an exact count.
    ///
    /// # Safety
    ///
    /// Nothing is validated. Both pointers must be non-null, aligned for the
    /// element type and valid for reads of `len_a` elements, and the memory
    /// must not be mutated during the call. Violations are undefined
    /// behavior local to the invoked routine.
    pub unsafe fn compute_raw(
        &self,
        a: *const (),
        b: *const (),
        len_a: usize,
        len_b: usize,
    ) -> f32 {
        debug_assert_eq!(len_a, len_b, "vectors differ in length");
        let n = len_a;
        unsafe {
            match self.function {
                Function::Float64(f) => f(slice(a, n), slice(b, n)),
                Function::Float32(f) => f(slice(a, n), slice(b, n)),
                Function::Float16(f) => f(slice(a, n), slice(b, n)),
                Function::Int8(f) => f(slice(a, n), slice(b, n)),
                Function::Bit1(f) => f(slice(a, n), slice(b, n)) as f32,
            }
        }
    }
}

#[inline(always)]
unsafe fn slice<'a, T>(p: *const (), n: usize) -> &'a [T] {
    unsafe { std::slice::from_raw_parts(p.cast::<T>(), n) }
}

impl Debug for Kernel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("kind", &self.kind)
            .field("datatype", &self.datatype)
            .field("capability", &format_args!("{}", self.capability))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback_f32() -> Kernel {
        Kernel::new(
            MetricKind::InnerProduct,
            DataType::Float32,
            Capability::AUTOVEC,
            Function::Float32(crate::floating_f32::inner_product::fallback),
        )
    }

    #[test]
    fn compute_raw_matches_compute() {
        let kernel = fallback_f32();
        let lhs = [1.0f32, 2.0, 3.0, 4.0];
        let rhs = [4.0f32, 3.0, 2.0, 1.0];
        let raw = unsafe { kernel.compute_raw(lhs.as_ptr().cast(), rhs.as_ptr().cast(), 4, 4) };
        assert_eq!(raw, 20.0);
        assert_eq!(kernel.compute(&lhs, &rhs), 20.0);
        assert_eq!(kernel.compute::<f32>(&[], &[]), 0.0);
    }

    #[test]
    #[should_panic(expected = "kernel resolved for `f32` is called with `f64`")]
    fn compute_rejects_other_datatype() {
        fallback_f32().compute(&[1.0f64], &[1.0f64]);
    }

    #[test]
    #[should_panic(expected = "vectors differ in length")]
    fn compute_rejects_length_mismatch() {
        fallback_f32().compute(&[1.0f32, 2.0], &[1.0f32]);
    }

    #[test]
    #[should_panic(expected = "is not a bit kernel")]
    fn hamming_rejects_float_kernel() {
        fallback_f32().hamming(&[0xff], &[0x00]);
    }

    #[test]
    fn kernel_is_plain_data() {
        fn assert_send_sync_copy<T: Send + Sync + Copy>() {}
        assert_send_sync_copy::<Kernel>();
        let debug = format!("{:?}", fallback_f32());
        assert!(debug.contains("InnerProduct"));
        assert!(debug.contains("autovec"));
    }
}
