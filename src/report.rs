//! Status lines shown to the user while a flow runs.
//!
//! Progress goes to stdout, problems to stderr. Structured diagnostics go
//! through `tracing` instead.

pub fn ok(message: impl AsRef<str>) {
    println!("✓ {}", message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    eprintln!("! {}", message.as_ref());
}

pub fn fail(message: impl AsRef<str>) {
    eprintln!("✗ {}", message.as_ref());
}

/// Debug echo of commands and generated files.
pub fn detail(message: impl AsRef<str>) {
    println!("  {}", message.as_ref());
}
