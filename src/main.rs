use addr2yandex::geocode::{Backend, GeocodeResolver};
use addr2yandex::input;
use addr2yandex::output::{self, OutputFormat};
use addr2yandex::run::{generate_rows, RunConfig};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

const API_KEY_FILE: &str = "yandex_api_key.txt";

/// Generate Yandex Maps deep links (public transport) for a list of
/// addresses.
///
/// Reads one address per line, geocodes it (Yandex / Nominatim /
/// Photon, with a local geocache.json), and writes label+link rows.
///
/// Examples:
///   addr2yandex addresses.txt
///   addr2yandex addresses.txt -o links.csv --geocoder photon
///   addr2yandex --prepend "Москва, " --format pairs
#[derive(Parser)]
#[command(name = "addr2yandex", version, about, long_about = None)]
struct Cli {
    /// Input text file with one address per line.
    #[arg(index = 1, default_value = "addresses.txt")]
    input: PathBuf,

    /// Output file path.
    #[arg(short, long, default_value = "links.csv")]
    output: PathBuf,

    /// Yandex domain to use (yandex.ru or yandex.com).
    #[arg(long, default_value = "yandex.ru")]
    domain: String,

    /// Preferred geocoder: "yandex", "nominatim", or "photon".
    #[arg(long, default_value = "yandex", value_parser = parse_backend)]
    geocoder: Backend,

    /// Yandex Geocoder API key. Defaults to yandex_api_key.txt in the
    /// working directory, then the YANDEX_GEOCODER_API_KEY env var.
    #[arg(long)]
    apikey: Option<String>,

    /// Prefix prepended to the geocoding query only, e.g. "Москва, ".
    /// Defaults to the ADDRESS_PREPEND env var.
    #[arg(long)]
    prepend: Option<String>,

    /// Output format: "csv" (Address,Link) or "pairs" (Address/Link).
    #[arg(long, default_value = "csv", value_parser = parse_format)]
    format: OutputFormat,
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    match s.to_lowercase().as_str() {
        "yandex" => Ok(Backend::Yandex),
        "nominatim" => Ok(Backend::Nominatim),
        "photon" => Ok(Backend::Photon),
        _ => Err(format!(
            "Unknown geocoder '{}'. Use 'yandex', 'nominatim', or 'photon'.",
            s
        )),
    }
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "pairs" => Ok(OutputFormat::Pairs),
        _ => Err(format!("Unknown format '{}'. Use 'csv' or 'pairs'.", s)),
    }
}

/// API key from the local key file, else the environment.
fn default_api_key() -> Option<String> {
    if let Ok(text) = fs::read_to_string(API_KEY_FILE) {
        let key = text.lines().next().unwrap_or("").trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }
    std::env::var("YANDEX_GEOCODER_API_KEY")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn main() {
    let cli = Cli::parse();

    if !cli.input.exists() {
        eprintln!("Input file not found: {}", cli.input.display());
        std::process::exit(2);
    }

    let (encoding_used, lines) = input::read_lines_with_fallback(&cli.input).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", cli.input.display(), e);
        std::process::exit(2);
    });
    let addresses = input::filter_addresses(&lines);

    let apikey = cli
        .apikey
        .filter(|k| !k.trim().is_empty())
        .or_else(default_api_key);
    let email = std::env::var("NOMINATIM_EMAIL").ok();
    let resolver = GeocodeResolver::new(apikey, email.as_deref());

    let cfg = RunConfig {
        domain: cli.domain,
        prefer: cli.geocoder,
        prepend: cli
            .prepend
            .or_else(|| std::env::var("ADDRESS_PREPEND").ok())
            .unwrap_or_default(),
    };
    let rows = generate_rows(&addresses, &resolver, &cfg);

    if let Err(e) = output::write_rows(&cli.output, &rows, cli.format) {
        eprintln!("Failed to write {}: {}", cli.output.display(), e);
        std::process::exit(1);
    }

    println!(
        "Read {} addresses from {} (encoding: {}).",
        addresses.len(),
        cli.input.display(),
        encoding_used
    );
    println!("Wrote {} rows to {}.", rows.len(), cli.output.display());
    if !rows.is_empty() {
        println!("Preview:");
        for row in rows.iter().take(5) {
            println!("- {} => {}", row.label, row.url);
        }
    }
}
