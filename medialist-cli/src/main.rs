use anyhow::Result;
use clap::{Parser, Subcommand};
use medialist_cli::{commands, InspectFormat};
use medialist_core::constants::DUMP_FORMAT_VERSION;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "medialist")]
#[command(about = "Medialist - Pack and inspect versioned media item lists", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a JSON array of items into a binary item list
    Pack {
        /// Input JSON file (array of {"type", "fields"} objects)
        #[arg(short, long)]
        input: String,

        /// Output file for the packed list
        #[arg(short, long)]
        output: String,

        /// Format version to write
        #[arg(long, default_value_t = DUMP_FORMAT_VERSION)]
        format_version: u8,

        /// Omit the CRC32C trailer
        #[arg(long)]
        no_checksum: bool,
    },

    /// Load an item list, tolerating missing types, and show its items
    Inspect {
        /// Input file ("-" for stdin)
        #[arg(short, long)]
        input: String,

        /// Output file for the rendered items
        #[arg(short, long)]
        output: Option<String>,

        /// Show statistics only
        #[arg(long)]
        stats_only: bool,

        /// Item rendering
        #[arg(long, value_enum, default_value_t = InspectFormat::Text)]
        format: InspectFormat,

        /// Treat a format module (and its submodules) as removed
        #[arg(long = "exclude-module")]
        exclude_modules: Vec<String>,

        /// Namespace holding record types (repeatable)
        #[arg(long = "reserved-namespace")]
        reserved_namespaces: Vec<String>,
    },

    /// Check an item list strictly and tolerantly
    Verify {
        /// Input file ("-" for stdin)
        #[arg(short, long)]
        input: String,

        /// Treat a format module (and its submodules) as removed
        #[arg(long = "exclude-module")]
        exclude_modules: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Pack {
            input,
            output,
            format_version,
            no_checksum,
        } => commands::pack::execute(&input, &output, format_version, !no_checksum),

        Commands::Inspect {
            input,
            output,
            stats_only,
            format,
            exclude_modules,
            reserved_namespaces,
        } => commands::inspect::execute(
            &input,
            &commands::inspect::InspectOptions {
                output: output.as_deref(),
                stats_only,
                format,
                exclude_modules: &exclude_modules,
                reserved_namespaces: &reserved_namespaces,
            },
        ),

        Commands::Verify {
            input,
            exclude_modules,
        } => commands::verify::execute(&input, &exclude_modules),
    }
}
