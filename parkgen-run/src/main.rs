//! Headless entry point.
//!
//! Grows driveways and bikeways on a sample site, settles random structures
//! against them and prints one report line per evaluation. Logging goes
//! through `env_logger`, so `RUST_LOG=debug` shows grammar and resolver
//! summaries.

mod driver;

use driver::{Driver, DriverSettings};
use parkgen_core::config::Config;

/// Runs the evaluations.
///
/// ### Parameters
/// Positional command-line arguments, both optional:
/// 1. Seed of the random source (default `7`).
/// 2. Number of evaluations (default `5`).
///
/// ### Returns
/// - `Ok(())` once every evaluation has been reported.
/// - `Err` on the first configuration or registration error.
fn main() -> parkgen_core::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(7);
    let evaluations: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(5);

    let mut driver = Driver::new(Config::default(), DriverSettings::default(), seed)?;
    for _ in 0..evaluations {
        let report = driver.evaluate()?;
        println!("{report}");
    }
    Ok(())
}
