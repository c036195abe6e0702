//! segwal CLI
//!
//! Inspect and append to a WAL directory.

use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use segwal::wal::WalRecovery;
use segwal::{BincodeSerializer, Config, LogRecord, RecordSerializer, Wal};
use tracing_subscriber::{fmt, EnvFilter};

/// segwal CLI
#[derive(Parser, Debug)]
#[command(name = "segwal-cli")]
#[command(about = "Inspect and append to a segmented write-ahead log")]
#[command(version)]
struct Args {
    /// Log directory
    #[arg(short, long, default_value = segwal::config::DEFAULT_LOG_DIR)]
    log_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every record in the log
    Dump {
        /// Start at the most recent checkpoint
        #[arg(long)]
        from_checkpoint: bool,
    },

    /// Check every segment without modifying anything
    Verify,

    /// Append records and sync
    Append {
        /// Payloads to append, one record each
        #[arg(required = true)]
        payloads: Vec<String>,

        /// Mark the last payload as a checkpoint
        #[arg(short, long)]
        checkpoint: bool,

        /// Maximum segment size in bytes
        #[arg(short = 's', long)]
        max_segment_size: Option<u64>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,segwal=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> segwal::Result<()> {
    match args.command {
        Commands::Dump { from_checkpoint } => {
            let wal = Wal::open(Config::builder().log_dir(&args.log_dir).build())?;
            let records = if from_checkpoint {
                wal.read_from_checkpoint()?
            } else {
                wal.read_all()?
            };
            for record in &records {
                print_record(record);
            }
            wal.close()
        }
        Commands::Verify => {
            let serializer: Arc<dyn RecordSerializer> = Arc::new(BincodeSerializer);
            let report = WalRecovery::verify(Path::new(&args.log_dir), &serializer)?;
            for segment in &report.segments {
                println!(
                    "segment-{}: {} records, {} / {} bytes valid{}",
                    segment.segment_no,
                    segment.records_recovered,
                    segment.valid_len,
                    segment.file_len,
                    if segment.was_truncated { " (torn tail)" } else { "" }
                );
            }
            println!(
                "{} segments, {} records, last sequence {}",
                report.segments.len(),
                report.total_records,
                report.last_sequence_no
            );
            Ok(())
        }
        Commands::Append {
            payloads,
            checkpoint,
            max_segment_size,
        } => {
            let mut builder = Config::builder().log_dir(&args.log_dir);
            if let Some(size) = max_segment_size {
                builder = builder.max_segment_size(size);
            }
            let wal = Wal::open(builder.build())?;

            let last = payloads.len() - 1;
            for (i, payload) in payloads.iter().enumerate() {
                let sequence_no = if checkpoint && i == last {
                    wal.write_checkpoint(payload.as_bytes())?
                } else {
                    wal.write(payload.as_bytes())?
                };
                println!("{}", sequence_no);
            }

            wal.sync()?;
            wal.close()
        }
    }
}

fn print_record(record: &LogRecord) {
    println!(
        "{:>10}  {}{:08x}  {}",
        record.sequence_no,
        if record.is_checkpoint { "C " } else { "  " },
        record.checksum,
        String::from_utf8_lossy(&record.payload)
    );
}
