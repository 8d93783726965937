//! BB84 key exchange and secure-transmission demo.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;
use serde_json::json;
use std::path::PathBuf;

use bb84::prelude::*;

const CIPHERTEXT_PREVIEW_BITS: usize = 400;

#[derive(Debug, Parser)]
#[command(name = "bb84", about = "BB84 quantum key distribution simulator", version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print the report as JSON
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exchange a key and send a message over it
    Transmit(TransmitArgs),
    /// Run one intercept-resend round and report the QBER it causes
    Simulate {
        /// Number of qubits to send
        #[arg(long, default_value_t = DEFAULT_SIMULATION_QUBITS)]
        qubits: usize,
    },
}

#[derive(Debug, Args)]
struct TransmitArgs {
    /// Message to encrypt
    #[arg(short, long)]
    message: String,

    /// Put an intercept-resend eavesdropper on the channel
    #[arg(long, action = ArgAction::SetTrue)]
    eve: bool,

    #[arg(long)]
    qubits_per_round: Option<usize>,

    #[arg(long)]
    multiplier: Option<usize>,

    #[arg(long)]
    max_rounds: Option<usize>,

    #[arg(long)]
    threshold: Option<f64>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(cli: &Cli) -> Result<Bb84Config> {
    let mut config = match &cli.config {
        Some(path) => Bb84Config::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Bb84Config::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Command::Transmit(args) = &cli.cmd {
        if args.qubits_per_round.is_some() {
            config.qubits_per_round = args.qubits_per_round;
        }
        if let Some(m) = args.multiplier {
            config.multiplier = m;
        }
        if let Some(r) = args.max_rounds {
            config.max_rounds = r;
        }
        if let Some(t) = args.threshold {
            config.threshold = t;
        }
    }
    config.validate().context("invalid settings")?;
    Ok(config)
}

fn print_sample_rows(rows: &[TransmissionRecord]) {
    if rows.is_empty() {
        return;
    }
    println!(
        "{:<5} {:<10} {:<12} {:<10} {:<10} {:<10} {}",
        "Idx", "Alice Bit", "Alice Basis", "Eve Basis", "Bob Basis", "Bob Bit", "Status"
    );
    println!("{}", "-".repeat(72));
    for row in rows {
        let eve = row
            .eavesdropper_basis
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<5} {:<10} {:<12} {:<10} {:<10} {:<10} {}",
            row.index,
            row.sender_bit as u8,
            row.sender_basis,
            eve,
            row.receiver_basis,
            row.receiver_bit as u8,
            row.status()
        );
    }
    println!();
}

fn preview(bits: &[bool]) -> String {
    let text = bits_to_string(&bits[..bits.len().min(CIPHERTEXT_PREVIEW_BITS)]);
    if bits.len() > CIPHERTEXT_PREVIEW_BITS {
        format!("{}...", text)
    } else {
        text
    }
}

fn transmit(args: &TransmitArgs, config: &Bb84Config, as_json: bool) -> Result<()> {
    let mut rng = config.rng();
    let report = run_transmission(&args.message, args.eve, config, &mut rng)?;
    let session = &report.session;

    if as_json {
        let delivery = match &report.delivery {
            Ok(d) => json!({
                "ciphertext": bits_to_string(&d.ciphertext),
                "recovered_message": d.recovered_message,
                "key_fingerprint": d.key_fingerprint,
            }),
            Err(e) => json!({ "aborted": e.to_string() }),
        };
        let out = json!({
            "message_bits": report.message_bits,
            "eavesdropper": report.eavesdropper,
            "threshold": report.threshold,
            "aggregate_qber": report.aggregate_qber,
            "verdict": report.verdict,
            "total_sent": session.total_sent,
            "total_sifted": session.total_sifted,
            "total_errors": session.total_errors,
            "rounds_run": session.rounds_run,
            "sample_rows": session.last_sample_rows,
            "qber_curve": session.last_qber_curve,
            "sifted_indices": session.last_sifted_indices,
            "delivery": delivery,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_sample_rows(&session.last_sample_rows);
    println!("Rounds run:        {}", session.rounds_run);
    println!("Total qubits sent: {}", session.total_sent);
    println!("Sifted key bits:   {}", session.total_sifted);
    println!("Errors:            {}", session.total_errors);
    println!(
        "QBER:              {:.2}% (threshold {:.0}%)",
        report.aggregate_qber * 100.0,
        report.threshold * 100.0
    );
    println!();

    match &report.delivery {
        Ok(d) => {
            println!("Secure channel established.");
            println!("Encrypted (binary): {}", preview(&d.ciphertext));
            println!("Decrypted message:  {}", d.recovered_message);
            println!("Key fingerprint:    {}", d.key_fingerprint);
        }
        Err(reason) => {
            println!("Transmission aborted: {}", reason);
        }
    }
    Ok(())
}

fn simulate(qubits: usize, config: &Bb84Config, as_json: bool) -> Result<()> {
    let mut rng = config.rng();
    let round = simulate_intercept_resend_with(&ProbabilisticBackend, qubits, config.sample_rows, &mut rng)?;

    if as_json {
        let out = json!({
            "total_qubits": round.round_bits,
            "qber": round.qber(),
            "theoretical_qber": THEORETICAL_INTERCEPT_QBER,
            "sifted": round.sifted_count,
            "errors": round.error_count,
            "qber_curve": round.running_qber_curve,
            "sifted_indices": round.sifted_indices,
            "sample_rows": round.sample_rows,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_sample_rows(&round.sample_rows);
    println!("Total qubits sent:  {}", round.round_bits);
    println!("Sifted key length:  {}", round.sifted_count);
    println!("Total errors found: {}", round.error_count);
    println!(
        "Final QBER:         {:.2}% (theory predicts ~{:.0}%)",
        round.qber() * 100.0,
        THEORETICAL_INTERCEPT_QBER * 100.0
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;

    match &cli.cmd {
        Command::Transmit(args) => transmit(args, &config, cli.json),
        Command::Simulate { qubits } => simulate(*qubits, &config, cli.json),
    }
}
