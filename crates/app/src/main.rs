//! serial-sim demo driver.
//!
//! Pumps a payload through the software-simulated serial line against the
//! real system clock: writes as outgoing capacity allows, drains reads on
//! every poll, then verifies delivery and reports effective throughput next
//! to the configured rate.

mod config;
mod payload;

use config::Config;
use serial_sim_core::{ByteQueue, LinkStats, SerialStream};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Failures the driver can hit. Stream operations themselves are total;
/// fallibility lives in configuration, file I/O, and end-of-run
/// verification.
#[derive(Debug, Error)]
enum AppError {
    /// Bad or contradictory command-line arguments
    #[error("configuration error: {0}")]
    Config(String),

    /// Payload file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Received bytes don't match what was sent, beyond counted overruns
    #[error("transfer corrupted: {sent} bytes sent, {received} received, {overruns} receive overruns")]
    Corrupted {
        sent: usize,
        received: usize,
        overruns: u64,
    },
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), AppError> {
    let config = Config::from_args(args).map_err(AppError::Config)?;
    if config.print_config {
        config.print();
    }

    let data = match &config.input_file {
        Some(path) => std::fs::read(path)?,
        None => payload::generate_payload(config.seed, config.payload_bytes),
    };

    let mut tx = ByteQueue::with_capacity(config.tx_capacity);
    let mut rx = ByteQueue::with_capacity(config.rx_capacity);
    let mut stream = SerialStream::with_rx_buffer(&mut tx, &mut rx);
    stream.begin(config.baud);

    let started = Instant::now();
    let mut sent = 0usize;
    let mut received = Vec::with_capacity(data.len());

    loop {
        while sent < data.len() && stream.write(data[sent]) == 1 {
            sent += 1;
        }
        while let Some(byte) = stream.read() {
            received.push(byte);
        }
        if sent == data.len() && stream.queued() == 0 && stream.available() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_micros(config.poll_us));
    }

    let elapsed = started.elapsed();
    let stats = stream.stats();

    verify(&data, &received, stats)?;

    if config.print_stats {
        print_summary(&config, &data, &received, stats, elapsed);
    }
    Ok(())
}

/// Every sent byte must be accounted for: delivered in order, or evicted
/// by a counted receive overrun.
fn verify(data: &[u8], received: &[u8], stats: LinkStats) -> Result<(), AppError> {
    let accounted = received.len() as u64 + stats.rx_overruns;
    let intact = if stats.rx_overruns == 0 {
        received == data
    } else {
        accounted == data.len() as u64
    };
    if intact {
        Ok(())
    } else {
        Err(AppError::Corrupted {
            sent: data.len(),
            received: received.len(),
            overruns: stats.rx_overruns,
        })
    }
}

fn print_summary(
    config: &Config,
    data: &[u8],
    received: &[u8],
    stats: LinkStats,
    elapsed: Duration,
) {
    println!("=== Transfer Summary ===");
    println!("Payload: {} bytes", data.len());
    println!("Delivered: {} bytes", received.len());
    if stats.rx_overruns > 0 {
        println!(
            "Lost to receive overruns: {} bytes (raise --rx-capacity or lower --poll-us)",
            stats.rx_overruns
        );
    }
    println!("Elapsed: {:.3} s", elapsed.as_secs_f64());

    if config.baud == 0 {
        println!("Rate: unpaced");
    } else {
        println!("Configured rate: {} baud", config.baud);
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            // ten line bits per byte, matching the pacing model
            let effective_bits = received.len() as f64 * 10.0 / secs;
            println!("Effective rate: {:.0} baud", effective_bits);
        }
    }

    println!();
    println!("=== Link Stats ===");
    println!("Bytes written: {}", stats.bytes_written);
    println!("Bytes released: {}", stats.bytes_released);
    println!("Bytes read: {}", stats.bytes_read);
    println!("Receive overruns: {}", stats.rx_overruns);
    println!("Release passes: {}", stats.release_passes);
}
