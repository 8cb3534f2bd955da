//! Blackdrop CLI
//!
//! Command-line frontend for the batch background-removal and backdrop
//! compositing pipeline.

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    blackdrop::cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
