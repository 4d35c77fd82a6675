//! Configuration for the serial-sim demo driver.
//!
//! Handles parsing command-line arguments and generating sensible defaults
//! (including randomized defaults that are reproducible with a seed).
//!
//! # Philosophy
//!
//! The tool should work with ZERO arguments, using intelligent defaults.
//! All defaults are printed so runs are reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

/// Baud rates a run may pick at random when none is given.
const COMMON_RATES: [u32; 5] = [9_600, 19_200, 38_400, 57_600, 115_200];

/// Complete configuration for a transfer run.
#[derive(Debug, Clone)]
pub struct Config {
    // === Payload ===
    /// Input file path (None = generate sample payload)
    pub input_file: Option<PathBuf>,

    /// Generated payload size in bytes
    pub payload_bytes: usize,

    // === Link ===
    /// Baud rate (0 = unpaced)
    pub baud: u32,

    /// Outgoing queue capacity in bytes
    pub tx_capacity: usize,

    /// Receive queue capacity in bytes
    pub rx_capacity: usize,

    // === Driver ===
    /// Sleep between polls of the stream, in microseconds
    pub poll_us: u64,

    /// Random seed for reproducible defaults and payload
    pub seed: u64,

    // === Behavior ===
    /// Whether to print the resolved configuration
    pub print_config: bool,

    /// Whether to print the stats summary
    pub print_stats: bool,
}

impl Config {
    /// Parse configuration from command-line arguments.
    ///
    /// If no arguments are provided, generates randomized defaults using a
    /// time-based seed. If --seed is provided, uses that seed for all
    /// randomness (fully deterministic).
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let mut input_file: Option<PathBuf> = None;
        let mut payload_bytes: Option<usize> = None;
        let mut baud: Option<u32> = None;
        let mut tx_capacity: Option<usize> = None;
        let mut rx_capacity: Option<usize> = None;
        let mut poll_us: Option<u64> = None;
        let mut seed: Option<u64> = None;
        let mut print_config = false;
        let mut print_stats = true;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--in" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--in requires a path".to_string());
                    }
                    input_file = Some(PathBuf::from(&args[i]));
                }
                "--bytes" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--bytes requires a number".to_string());
                    }
                    payload_bytes = Some(args[i].parse().map_err(|_| "invalid bytes")?);
                }
                "--baud" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--baud requires a number".to_string());
                    }
                    baud = Some(args[i].parse().map_err(|_| "invalid baud")?);
                }
                "--unpaced" => {
                    baud = Some(0);
                }
                "--tx-capacity" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--tx-capacity requires a number".to_string());
                    }
                    tx_capacity = Some(args[i].parse().map_err(|_| "invalid tx-capacity")?);
                }
                "--rx-capacity" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--rx-capacity requires a number".to_string());
                    }
                    rx_capacity = Some(args[i].parse().map_err(|_| "invalid rx-capacity")?);
                }
                "--poll-us" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--poll-us requires a number".to_string());
                    }
                    poll_us = Some(args[i].parse().map_err(|_| "invalid poll-us")?);
                }
                "--seed" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--seed requires a number".to_string());
                    }
                    seed = Some(args[i].parse().map_err(|_| "invalid seed")?);
                }
                "--print-config" => {
                    print_config = true;
                }
                "--no-stats" => {
                    print_stats = false;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {
                    return Err(format!("unknown argument: {}", args[i]));
                }
            }
            i += 1;
        }

        if baud == Some(u32::MAX) {
            return Err("baud 4294967295 is reserved (disables the link)".to_string());
        }
        if let Some(0) = tx_capacity {
            return Err("tx-capacity must be at least 1".to_string());
        }
        if let Some(0) = rx_capacity {
            return Err("rx-capacity must be at least 1".to_string());
        }

        // Determine seed (explicit or time-based)
        let seed = seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|t| t.as_millis() as u64)
                .unwrap_or(0)
        });

        // Generate defaults using seed
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let config = Config {
            input_file,
            payload_bytes: payload_bytes.unwrap_or_else(|| rng.gen_range(256..=2048)),
            baud: baud.unwrap_or_else(|| COMMON_RATES[rng.gen_range(0..COMMON_RATES.len())]),
            tx_capacity: tx_capacity.unwrap_or(64),
            rx_capacity: rx_capacity.unwrap_or(32),
            poll_us: poll_us.unwrap_or(200),
            seed,
            print_config,
            print_stats,
        };

        Ok(config)
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!(
            "Payload: {}",
            self.input_file
                .as_ref()
                .and_then(|p| p.to_str())
                .map_or_else(
                    || format!("generated, {} bytes", self.payload_bytes),
                    |p| format!("file {}", p),
                )
        );
        println!("Seed: {}", self.seed);
        println!();
        println!("=== Link ===");
        if self.baud == 0 {
            println!("Baud: unpaced (instantaneous)");
        } else {
            println!("Baud: {}", self.baud);
        }
        println!("TX queue capacity: {} bytes", self.tx_capacity);
        println!("RX queue capacity: {} bytes", self.rx_capacity);
        println!();
        println!("=== Driver ===");
        println!("Poll interval: {} us", self.poll_us);
        println!();
    }
}

fn print_help() {
    println!("serial-sim: pump a payload through a software-simulated serial line");
    println!();
    println!("USAGE:");
    println!("    serial-sim [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --in <PATH>          Payload file (default: generate sample)");
    println!("    --bytes <N>          Generated payload size (default: random 256-2048)");
    println!("    --seed <N>           Random seed for determinism");
    println!();
    println!("    --baud <N>           Baud rate (default: random common rate)");
    println!("    --unpaced            Instantaneous transfer (same as --baud 0)");
    println!("    --tx-capacity <N>    Outgoing queue capacity (default: 64)");
    println!("    --rx-capacity <N>    Receive queue capacity (default: 32)");
    println!();
    println!("    --poll-us <N>        Poll interval in microseconds (default: 200)");
    println!();
    println!("    --print-config       Print resolved configuration");
    println!("    --no-stats           Don't print the stats summary");
    println!("    --help, -h           Print this help");
    println!();
    println!("EXAMPLES:");
    println!("    serial-sim                          # Run with random defaults");
    println!("    serial-sim --seed 42                # Deterministic run");
    println!("    serial-sim --baud 9600 --bytes 512  # 512 bytes at 9600 baud");
    println!("    serial-sim --in cmd.txt --unpaced   # File payload, no pacing");
    println!();
}
