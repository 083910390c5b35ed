//! # Tarjeta CLI
//!
//! Command-line interface for ESC/POS task card printing.
//!
//! ## Usage
//!
//! ```bash
//! # Print a batch of card images, cutting after each
//! tarjeta print card1.png card2.png card3.png
//!
//! # Keep intermediate cards joined, cut only at the end
//! tarjeta print --cut-policy last *.png
//!
//! # 80mm paper, explicit USB ids
//! tarjeta print --paper 80 --vendor 04b8 --product 0202 card.png
//!
//! # Encode without touching a device
//! tarjeta print --dry-run card.png
//!
//! # Check device connectivity, report as JSON
//! tarjeta diag
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tarjeta::{
    TarjetaError,
    diagnostics,
    printer::PrinterConfig,
    protocol::{EncodeOptions, encode},
    render::{RasterOptions, load_image, rasterize},
    session::{CutPolicy, PrintSession},
    transport::UsbTransport,
};

/// Tarjeta - ESC/POS task card printer utility
#[derive(Parser, Debug)]
#[command(name = "tarjeta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print card images as one batch
    Print {
        /// Image files to print, in batch order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// When to cut between cards (the last card is always cut)
        #[arg(long, value_enum, default_value_t = CutChoice::Every)]
        cut_policy: CutChoice,

        /// Feed lines between the raster and the cut
        #[arg(long)]
        feed: Option<u8>,

        /// Paper width in millimeters
        #[arg(long, value_enum, default_value_t = Paper::Mm58)]
        paper: Paper,

        /// Print width in dots (overrides --paper)
        #[arg(long)]
        width_dots: Option<u16>,

        /// USB vendor id (hex)
        #[arg(long, value_parser = parse_hex_u16)]
        vendor: Option<u16>,

        /// USB product id (hex)
        #[arg(long, value_parser = parse_hex_u16)]
        product: Option<u16>,

        /// Rasterize and encode without opening a device
        #[arg(long)]
        dry_run: bool,
    },

    /// Probe the printer and report connectivity as JSON
    Diag {
        /// USB vendor id (hex)
        #[arg(long, value_parser = parse_hex_u16)]
        vendor: Option<u16>,

        /// USB product id (hex)
        #[arg(long, value_parser = parse_hex_u16)]
        product: Option<u16>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CutChoice {
    /// Cut after every card
    Every,
    /// Cut only after the last card
    Last,
}

impl From<CutChoice> for CutPolicy {
    fn from(choice: CutChoice) -> Self {
        match choice {
            CutChoice::Every => CutPolicy::EveryCard,
            CutChoice::Last => CutPolicy::LastCardOnly,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Paper {
    #[value(name = "58")]
    Mm58,
    #[value(name = "80")]
    Mm80,
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches("0x");
    u16::from_str_radix(digits, 16).map_err(|e| format!("not a hex id: {}", e))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), TarjetaError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Print {
            images,
            cut_policy,
            feed,
            paper,
            width_dots,
            vendor,
            product,
            dry_run,
        } => {
            let config = build_config(paper, width_dots, vendor, product, feed);

            if dry_run {
                return dry_run_batch(&images, &config);
            }

            // Load everything up front so a bad file fails before any paper moves
            let mut loaded = Vec::with_capacity(images.len());
            for path in &images {
                loaded.push(load_image(path)?);
            }

            let mut transport = UsbTransport::new(config.clone());
            let outcomes = PrintSession::new(&mut transport, config)
                .on_progress(Box::new(|index, outcome| {
                    if outcome.success {
                        println!("card {}: printed", index + 1);
                    } else {
                        println!(
                            "card {}: FAILED ({})",
                            index + 1,
                            outcome.detail.as_deref().unwrap_or("unknown")
                        );
                    }
                }))
                .print_batch(&loaded, cut_policy.into());

            let failed = outcomes.iter().filter(|o| !o.success).count();
            if failed > 0 {
                return Err(TarjetaError::Transfer(format!(
                    "{} of {} cards failed",
                    failed,
                    outcomes.len()
                )));
            }
            println!("Printed {} cards successfully!", outcomes.len());
        }

        Commands::Diag { vendor, product } => {
            let config = build_config(Paper::Mm58, None, vendor, product, None);
            let mut transport = UsbTransport::new(config);
            let report = diagnostics::collect(&mut transport);
            println!(
                "{}",
                serde_json::to_string_pretty(&report)
                    .map_err(|e| TarjetaError::Encoding(e.to_string()))?
            );
            if !report.all_ok() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn build_config(
    paper: Paper,
    width_dots: Option<u16>,
    vendor: Option<u16>,
    product: Option<u16>,
    feed: Option<u8>,
) -> PrinterConfig {
    let mut config = match paper {
        Paper::Mm58 => PrinterConfig::generic_58mm(),
        Paper::Mm80 => PrinterConfig::generic_80mm(),
    };
    if let Some(dots) = width_dots {
        config = config.with_width_dots(dots);
    }
    if let (Some(vendor_id), Some(product_id)) = (vendor, product) {
        config = config.with_usb_id(vendor_id, product_id);
    }
    if let Some(lines) = feed {
        config.feed_lines = lines;
    }
    config
}

/// Rasterize and encode every image, report frame counts, touch no device
fn dry_run_batch(images: &[PathBuf], config: &PrinterConfig) -> Result<(), TarjetaError> {
    let options = RasterOptions {
        max_upscale: config.max_upscale,
        ..RasterOptions::default()
    };
    for (index, path) in images.iter().enumerate() {
        let image = load_image(path)?;
        let bitmap = rasterize(&image, config.width_dots, &options)?;
        let frames = encode(
            &bitmap,
            config,
            &EncodeOptions {
                cut_after: true,
                feed_lines: config.feed_lines,
            },
        )?;
        let bytes: usize = frames.iter().map(|f| f.len()).sum();
        println!(
            "card {}: {}x{} dots, {} frames, {} bytes",
            index + 1,
            bitmap.width_dots(),
            bitmap.height(),
            frames.len(),
            bytes
        );
    }
    Ok(())
}
