//! UniFFI bindings crate for the admin inbox
//!
//! Wraps the inbox crate for UniFFI library mode binding generation by
//! re-exporting its FFI module and scaffolding.
//!
//! ## Building bindings
//!
//! 1. Build the library:
//!    ```bash
//!    cargo build --release -p inbox-ffi --target aarch64-apple-ios
//!    cargo build --release -p inbox-ffi --target aarch64-linux-android
//!    ```
//!
//! 2. Generate Swift or Kotlin bindings:
//!    ```bash
//!    cargo run -p inbox-ffi --features bindgen --bin uniffi-bindgen generate \
//!        --library target/aarch64-apple-ios/release/libinbox_ffi.a \
//!        --language swift \
//!        --out-dir generated/swift
//!    ```

pub use inbox::ffi::*;

// Library mode needs the scaffolding symbols from this cdylib
inbox::uniffi_reexport_scaffolding!();
