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

use std::env::var;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo::rerun-if-changed=cshim");
    println!("cargo::rustc-check-cfg=cfg(simkern_neon_f16)");
    println!("cargo::rustc-check-cfg=cfg(simkern_sve)");
    let target_arch = var("CARGO_CFG_TARGET_ARCH")?;
    let target_endian = var("CARGO_CFG_TARGET_ENDIAN")?;
    let target_os = var("CARGO_CFG_TARGET_OS")?;
    if target_arch == "aarch64" {
        let mut build = cc::Build::new();
        build.file("./cshim/neon.c");
        build.opt_level(3);
        build.compile("simkern_neon");
        println!("cargo::rustc-cfg=simkern_neon_f16");
        // SVE kernels are compiled for the whole file, so they live apart from NEON ones.
        if target_endian == "little" && matches!(target_os.as_str(), "linux" | "android") {
            let mut build = cc::Build::new();
            build.file("./cshim/sve.c");
            build.flag("-march=armv8-a+sve");
            build.opt_level(3);
            build.compile("simkern_sve");
            println!("cargo::rustc-cfg=simkern_sve");
        }
    }
    Ok(())
}
