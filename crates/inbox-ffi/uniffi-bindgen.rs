//! UniFFI bindgen binary for generating Swift/Kotlin bindings
//!
//! Usage:
//!   cargo run -p inbox-ffi --features bindgen --bin uniffi-bindgen generate \
//!       --library target/release/libinbox_ffi.dylib \
//!       --language kotlin \
//!       --out-dir generated/kotlin

fn main() {
    uniffi::uniffi_bindgen_main()
}
