//! Links the FLANN C bindings (`libflann`).
//!
//! # Environment Variables
//!
//! - `FLANN_LIB_DIR`: extra directory searched for `libflann`
//! - `FLANN_STATIC=1`: link `flann_s` statically instead of the shared library

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=FLANN_LIB_DIR");
    println!("cargo:rerun-if-env-changed=FLANN_STATIC");

    if let Ok(dir) = env::var("FLANN_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }

    let static_link = env::var("FLANN_STATIC").map(|v| v == "1").unwrap_or(false);
    if static_link {
        // The static archive pulls in the C++ runtime and lz4.
        println!("cargo:rustc-link-lib=static=flann_s");
        println!("cargo:rustc-link-lib=dylib=stdc++");
        println!("cargo:rustc-link-lib=dylib=lz4");
    } else {
        println!("cargo:rustc-link-lib=dylib=flann");
    }
}
