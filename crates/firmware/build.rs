use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    // Only run linker script setup for hardware builds
    if env::var_os("CARGO_FEATURE_HARDWARE").is_some() {
        // Put `link.x` in our output directory and ensure it's on the linker search path.
        let out = PathBuf::from(env::var_os("OUT_DIR").ok_or("OUT_DIR not set")?);
        fs::write(out.join("link.x"), include_bytes!("link.x"))?;

        println!("cargo:rustc-link-search={}", out.display());
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
        println!("cargo:rerun-if-changed=link.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
