//! Build script for mdsview-core
//!
//! Checks the toolchain before compilation:
//! - Minimum Rust version (let-else needs 1.65)

fn main()
{
    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 65, 0);

        if rustc_version < min_rust_version {
            panic!("mdsview-core requires Rust {min_rust_version} or newer, found {rustc_version}");
        }
    } else {
        // Some build environments hide rustc; don't fail there
        println!("cargo:warning=could not verify Rust version");
    }
}
