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
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Which instruction sets the resolver may pick from.
///
/// ```toml
/// allowed = ["avx2", "avx2fp16", "neon"]
/// ```
///
/// An empty list permits only the portable fallback kernels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DispatchOptions {
    #[serde(default = "DispatchOptions::default_allowed")]
    #[validate(length(max = 16), custom(function = DispatchOptions::validate_allowed))]
    pub allowed: Vec<String>,
}

impl DispatchOptions {
    pub const ENV: &'static str = "SIMKERN_ALLOWED";

    fn default_allowed() -> Vec<String> {
        vec!["all".to_string()]
    }

    fn validate_allowed(allowed: &[String]) -> Result<(), ValidationError> {
        for name in allowed {
            if Capability::from_lowercase_name(name).is_none() {
                let mut error = ValidationError::new("unknown_capability");
                error.message = Some(format!("unknown capability `{name}`").into());
                return Err(error);
            }
        }
        Ok(())
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let options = toml::from_str::<Self>(s)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads [`DispatchOptions::ENV`], a comma separated capability list.
    /// Unset means every capability is allowed.
    pub fn from_env() -> Result<Self, ConfigError> {
        use std::env::VarError;
        match std::env::var(Self::ENV) {
            Ok(value) => Self::from_list(&value),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(Self::ENV)),
        }
    }

    pub fn from_list(s: &str) -> Result<Self, ConfigError> {
        let options = Self {
            allowed: s
                .split(',')
                .map(|name| name.trim().to_ascii_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        };
        if let Some(name) = options
            .allowed
            .iter()
            .find(|name| Capability::from_lowercase_name(name).is_none())
        {
            return Err(ConfigError::UnknownCapability(name.clone()));
        }
        options.validate()?;
        Ok(options)
    }

    /// The allowed mask; unknown names are ignored.
    pub fn allowed(&self) -> Capability {
        self.allowed
            .iter()
            .filter_map(|name| Capability::from_lowercase_name(name))
            .fold(Capability::AUTOVEC, |acc, capability| acc | capability)
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            allowed: Self::default_allowed(),
        }
    }
}

#[test]
fn dispatch_options_from_toml() {
    let options = DispatchOptions::from_toml("allowed = [\"avx2\", \"neon\"]").unwrap();
    assert_eq!(
        options.allowed(),
        Capability::X86_AVX2 | Capability::ARM_NEON
    );
    let options = DispatchOptions::from_toml("").unwrap();
    assert_eq!(options.allowed(), Capability::all());
    let options = DispatchOptions::from_toml("allowed = []").unwrap();
    assert_eq!(options.allowed(), Capability::AUTOVEC);
}

#[test]
fn dispatch_options_rejects_bad_input() {
    assert!(matches!(
        DispatchOptions::from_toml("allowed = [\"avx9\"]"),
        Err(ConfigError::Validation(_))
    ));
    assert!(matches!(
        DispatchOptions::from_toml("allow = []"),
        Err(ConfigError::Toml(_))
    ));
    assert!(matches!(
        DispatchOptions::from_list("sve, mmx"),
        Err(ConfigError::UnknownCapability(name)) if name == "mmx"
    ));
}

#[test]
fn dispatch_options_from_list() {
    let options = DispatchOptions::from_list(" SVE,sve2 ,").unwrap();
    assert_eq!(options.allowed, vec!["sve".to_string(), "sve2".to_string()]);
    assert_eq!(options.allowed(), Capability::ARM_SVE | Capability::ARM_SVE2);
    assert_eq!(
        DispatchOptions::from_list("autovec").unwrap().allowed(),
        Capability::AUTOVEC
    );
}

#[test]
fn dispatch_options_from_env() {
    // the only test that touches this variable
    unsafe { std::env::remove_var(DispatchOptions::ENV) };
    assert_eq!(DispatchOptions::from_env().unwrap(), DispatchOptions::default());

    unsafe { std::env::set_var(DispatchOptions::ENV, "avx2, NEON") };
    assert_eq!(
        DispatchOptions::from_env().unwrap().allowed(),
        Capability::X86_AVX2 | Capability::ARM_NEON
    );

    unsafe { std::env::set_var(DispatchOptions::ENV, "avx2,sse9") };
    assert!(matches!(
        DispatchOptions::from_env(),
        Err(ConfigError::UnknownCapability(name)) if name == "sse9"
    ));

    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStringExt;
        let value = std::ffi::OsString::from_vec(vec![b'a', 0xff, b'v']);
        unsafe { std::env::set_var(DispatchOptions::ENV, value) };
        assert!(matches!(
            DispatchOptions::from_env(),
            Err(ConfigError::NotUnicode(name)) if name == DispatchOptions::ENV
        ));
    }

    unsafe { std::env::remove_var(DispatchOptions::ENV) };
}
