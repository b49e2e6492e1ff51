// Yocto Exporter - Sensor hub collection core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Build script for yocto-metrics
//!
//! With the `yapi` feature, compiles the C wrapper in `csrc/` against the
//! vendor YAPI headers and links it with the vendor library.
//!
//! - `YOCTO_API_DIR`: directory holding `yocto_api.h` and the sensor headers
//! - `YOCTO_LIB_DIR`: directory holding the static vendor library
//! - `YOCTO_LIB_NAME`: vendor library name (default `yocto`)

fn main() {
    #[cfg(feature = "yapi")]
    yapi::build();
}

#[cfg(feature = "yapi")]
mod yapi {
    use std::env;

    pub fn build() {
        println!("cargo:rerun-if-changed=csrc/yocto_wrapper.h");
        println!("cargo:rerun-if-changed=csrc/yocto_wrapper.cpp");
        println!("cargo:rerun-if-env-changed=YOCTO_API_DIR");
        println!("cargo:rerun-if-env-changed=YOCTO_LIB_DIR");
        println!("cargo:rerun-if-env-changed=YOCTO_LIB_NAME");

        let mut wrapper = cc::Build::new();
        wrapper
            .cpp(true)
            .file("csrc/yocto_wrapper.cpp")
            .include("csrc")
            .warnings(false);

        match env::var("YOCTO_API_DIR") {
            Ok(dir) => {
                wrapper.include(dir);
            }
            Err(_) => {
                println!("cargo:warning=YOCTO_API_DIR not set, relying on the default include path for yocto_api.h");
            }
        }

        // Emits the link directive for yocto_wrapper and the C++ runtime
        wrapper.compile("yocto_wrapper");

        match env::var("YOCTO_LIB_DIR") {
            Ok(dir) => println!("cargo:rustc-link-search=native={}", dir),
            Err(_) => {
                println!("cargo:warning=YOCTO_LIB_DIR not set, relying on the default linker search path");
            }
        }

        // After the wrapper so static resolution sees its references
        let lib_name = env::var("YOCTO_LIB_NAME").unwrap_or_else(|_| "yocto".to_string());
        println!("cargo:rustc-link-lib=static={}", lib_name);

        let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
        match target_os.as_str() {
            "macos" => {
                println!("cargo:rustc-link-lib=framework=IOKit");
                println!("cargo:rustc-link-lib=framework=CoreFoundation");
            }
            "linux" => {
                println!("cargo:rustc-link-lib=usb-1.0");
                println!("cargo:rustc-link-lib=pthread");
            }
            _ => {}
        }
    }
}
