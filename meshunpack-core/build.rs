use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=MESHCODEC_LIB_DIR");
    if env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }
    if let Some(dir) = env::var_os("MESHCODEC_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    }
}
