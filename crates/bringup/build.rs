//! Build script for the `bringup` firmware crate.
//!
//! Copies `config/memory.x` from the workspace root into `OUT_DIR` so `cortex-m-rt`'s `link.x`
//! finds it, sets the linker arguments and links the native `drivers` static library.
//!
//! The peripheral drivers are built outside of cargo. Their location defaults to
//! `drivers/build/Release` under the workspace root and can be overridden with the
//! `BRINGUP_DRIVERS_DIR` environment variable.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let l_crate_dir =
        PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    let l_workspace_root = l_crate_dir
        .parent()
        .expect("bringup crate must live two levels under the workspace root")
        .parent()
        .expect("bringup crate must live two levels under the workspace root")
        .to_path_buf();

    // ---- Ensure the linker can find memory.x ----
    let l_memory_x_src = l_workspace_root.join("config").join("memory.x");
    if !l_memory_x_src.exists() {
        panic!(
            "Expected linker memory script at {:?}. \
             Make sure `memory.x` exists in config folder.",
            l_memory_x_src
        );
    }

    let l_out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR not set"));
    let l_memory_x_dst = l_out_dir.join("memory.x");

    fs::copy(&l_memory_x_src, &l_memory_x_dst).unwrap_or_else(|e| {
        panic!(
            "Failed to copy {:?} to {:?}: {}",
            l_memory_x_src, l_memory_x_dst, e
        )
    });

    println!("cargo:rustc-link-search={}", l_out_dir.display());
    println!("cargo:rerun-if-changed={}", l_memory_x_src.display());

    // ---- Linker arguments required for cortex-m-rt embedded targets ----
    // `--nmagic` is required when memory regions are not aligned to 0x10000.
    println!("cargo:rustc-link-arg=--nmagic");
    println!("cargo:rustc-link-arg=-Tlink.x");

    // ---- Link the native drivers static library (built elsewhere) ----
    println!("cargo:rerun-if-env-changed=BRINGUP_DRIVERS_DIR");
    let l_drivers_lib_dir = match env::var_os("BRINGUP_DRIVERS_DIR") {
        Some(l_dir) => PathBuf::from(l_dir),
        None => l_workspace_root
            .join("drivers")
            .join("build")
            .join("Release"),
    };
    println!(
        "cargo:rustc-link-search=native={}",
        l_drivers_lib_dir.display()
    );
    println!("cargo:rustc-link-lib=static=drivers");
}
