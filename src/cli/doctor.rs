//! Environment readiness check.

use anyhow::Result;

use crate::config::Config;
use crate::extractor::chromium::find_chromium;

/// Check browser availability, the input file, and the output directory.
pub async fn run(config: &Config) -> Result<()> {
    println!("Bingrab Doctor");
    println!("==============");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    // Check Chromium
    match find_chromium() {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome/Chromium or set BINGRAB_CHROMIUM_PATH."
        ),
    }

    // Check input file
    if config.input_path.is_file() {
        println!("[OK] Input file found: {}", config.input_path.display());
    } else {
        println!(
            "[!!] Input file NOT found: {} — export your clipboard list there or pass --input.",
            config.input_path.display()
        );
    }

    // Check output directory
    if config.output_dir.is_dir() {
        println!("[OK] Output directory exists: {}", config.output_dir.display());
    } else {
        println!(
            "[!!] Output directory does not exist: {}",
            config.output_dir.display()
        );
    }

    Ok(())
}
