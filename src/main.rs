//! extbuild - version propagation and CMake builds for native extensions.
//!
//! This binary resolves the distribution version and builds the declared
//! native extensions, exiting non-zero on the first failure.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Run CLI and get exit code
    let exit_code = match extbuild::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
