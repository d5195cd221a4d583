use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=ROCM_PATH");

    if env::var_os("CARGO_FEATURE_STATIC_LINK").is_none() {
        return;
    }

    if let Some(rocm) = env::var_os("ROCM_PATH") {
        let rocm = rocm.to_string_lossy();
        println!("cargo:rustc-link-search=native={rocm}/lib");
        println!("cargo:rustc-link-search=native={rocm}/lib64");
    }
    println!("cargo:rustc-link-search=native=/opt/rocm/lib");
    println!("cargo:rustc-link-search=native=/opt/rocm/lib64");
    println!("cargo:rustc-link-lib=dylib=amd_smi");
}
