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

use crate::error::ConfigError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

bitflags::bitflags! {
    /// Vector instruction set extensions, either supported by the processor or
    /// allowed by a caller. Masks combine with `&`.
    ///
    /// The empty set is [`Capability::AUTOVEC`], the portable baseline that
    /// every mask implicitly contains.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capability: u32 {
        const ARM_NEON = 1 << 0;
        const ARM_SVE = 1 << 1;
        const ARM_SVE2 = 1 << 2;

        const X86_AVX2 = 1 << 10;
        const X86_AVX512 = 1 << 11;
        const X86_AVX2FP16 = 1 << 12;
        const X86_AVX512FP16 = 1 << 13;

        const X86_AMX = 1 << 20;
        const ARM_SME = 1 << 21;
    }
}

const NAMES: &[(&str, Capability)] = &[
    ("neon", Capability::ARM_NEON),
    ("sve", Capability::ARM_SVE),
    ("sve2", Capability::ARM_SVE2),
    ("sme", Capability::ARM_SME),
    ("avx2", Capability::X86_AVX2),
    ("avx2fp16", Capability::X86_AVX2FP16),
    ("avx512", Capability::X86_AVX512),
    ("avx512fp16", Capability::X86_AVX512FP16),
    ("amx", Capability::X86_AMX),
];

impl Capability {
    pub const AUTOVEC: Self = Self::empty();

    /// Looks up a single lower-case name such as `avx2` or `neon`.
    ///
    /// `autovec` maps to the empty set and `all` to every named bit.
    pub fn from_lowercase_name(name: &str) -> Option<Self> {
        match name {
            "autovec" => Some(Self::AUTOVEC),
            "all" => Some(Self::all()),
            _ => NAMES
                .iter()
                .find(|(n, _)| *n == name)
                .map(|&(_, capability)| capability),
        }
    }

    /// Lower-case names of the bits in this set, in declaration order.
    pub fn lowercase_names(self) -> impl Iterator<Item = &'static str> {
        NAMES
            .iter()
            .filter(move |&&(_, capability)| self.contains(capability))
            .map(|&(name, _)| name)
    }
}

impl Default for Capability {
    fn default() -> Self {
        Self::AUTOVEC
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("autovec");
        }
        for (i, name) in self.lowercase_names().enumerate() {
            if i != 0 {
                f.write_str(",")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl FromStr for Capability {
    type Err = ConfigError;

    /// Parses a comma separated list of lower-case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut result = Self::AUTOVEC;
        for name in s.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            let name = name.to_ascii_lowercase();
            match Self::from_lowercase_name(&name) {
                Some(capability) => result |= capability,
                None => return Err(ConfigError::UnknownCapability(name)),
            }
        }
        Ok(result)
    }
}

#[test]
fn capability_names() {
    assert_eq!(Capability::AUTOVEC.to_string(), "autovec");
    assert_eq!(
        (Capability::X86_AVX2 | Capability::X86_AVX512).to_string(),
        "avx2,avx512"
    );
    assert_eq!(
        "AVX2, neon".parse::<Capability>().unwrap(),
        Capability::X86_AVX2 | Capability::ARM_NEON
    );
    assert_eq!("".parse::<Capability>().unwrap(), Capability::AUTOVEC);
    assert_eq!("all".parse::<Capability>().unwrap(), Capability::all());
    assert!(matches!(
        "avx1024".parse::<Capability>(),
        Err(ConfigError::UnknownCapability(name)) if name == "avx1024"
    ));
    for &(name, capability) in NAMES {
        assert_eq!(Capability::from_lowercase_name(name), Some(capability));
        assert_eq!(capability.to_string(), name);
    }
}

#[test]
fn capability_bits_match_reference_layout() {
    assert_eq!(Capability::ARM_NEON.bits(), 1);
    assert_eq!(Capability::X86_AVX2.bits(), 1 << 10);
    assert_eq!(Capability::X86_AVX512FP16.bits(), 1 << 13);
    assert_eq!(Capability::ARM_SME.bits(), 1 << 21);
    let supported = Capability::X86_AVX2 | Capability::X86_AVX2FP16;
    let allowed = Capability::X86_AVX2 | Capability::ARM_NEON;
    assert_eq!(supported & allowed, Capability::X86_AVX2);
}
