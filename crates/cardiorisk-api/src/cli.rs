//! Command-line interface

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cardiorisk-api")]
#[command(about = "CardioRisk prediction and explanation service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Directory holding the trained model artifacts
    #[arg(short, long)]
    pub artifacts: Option<String>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
