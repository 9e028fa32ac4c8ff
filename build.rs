fn main() {
    // Let a bundled libpdfium.dylib in Contents/Frameworks resolve on macOS
    #[cfg(target_os = "macos")]
    {
        println!("cargo:rustc-link-arg=-Wl,-rpath,@executable_path/../Frameworks");
    }

    tauri_build::build()
}
