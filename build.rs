pub fn main() {
    #[cfg(windows)]
    if std::env::var_os("CARGO_FEATURE_OPENCL").is_some() {
        include_opencl();
    }
}

#[cfg(windows)]
fn include_opencl() {
    use camino::Utf8Path;

    println!("cargo:rerun-if-env-changed=CUDA_PATH");
    match std::env::var("CUDA_PATH") {
        Ok(path) => {
            let lib = Utf8Path::new(&path).join("lib");
            #[cfg(target_pointer_width = "32")]
            let path = lib.join("Win32");
            #[cfg(target_pointer_width = "64")]
            let path = lib.join("x64");
            println!("cargo:rustc-link-search={path}");
        },
        Err(_) => println!("cargo:warning=OpenCL library path not found. Linking may fail on Windows.")
    }
}
