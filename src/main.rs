use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cc2olx::cartridge::Cartridge;
use cc2olx::conversion::{convert_cartridge, Conversion};
use cc2olx::olx;
use cc2olx::processors::ProcessorChain;
use cc2olx::settings::{ConversionOptions, CustomBlockContentType};
use clap::Parser;
use tracing::info;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const REPORT_FILE: &str = "conversion.yaml";

/// Convert an extracted Common Cartridge into OLX components
#[derive(Parser)]
#[command(name = "cc2olx", author, version, long_about = None)]
struct Cli {
    /// Directory holding the extracted cartridge and its imsmanifest.xml
    cartridge_dir: PathBuf,

    #[arg(short, long, env = "CC2OLX_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Origin relative links of the course are resolved against
    #[arg(short, long, env = "CC2OLX_RELATIVE_LINKS_SOURCE")]
    relative_links_source: Option<String>,

    /// Content types converted into dedicated XBlocks
    #[arg(long, env = "CC2OLX_CUSTOM_BLOCKS", value_enum, value_delimiter = ',')]
    custom_blocks: Vec<CustomBlockContentType>,

    /// Also write the parsed content of every resource as JSON
    #[arg(long)]
    dump_content: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn create_output_dir(output_dir: &Path) -> Result<()> {
    if fs::metadata(output_dir).is_ok() {
        fs::remove_dir_all(output_dir)?;
    }

    fs::create_dir_all(output_dir)?;
    Ok(())
}

// Resource identifiers are not guaranteed to be valid file names.
fn file_stem(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn write_outputs(conversion: &Conversion, output_dir: &Path, dump_content: bool) -> Result<()> {
    for resource in &conversion.converted {
        let stem = file_stem(&resource.identifier);
        let xml = olx::to_xml_string(&resource.processed.nodes)
            .context(format!("failed to serialize OLX of {}", resource.identifier))?;
        let path = output_dir.join(format!("{}.xml", stem));
        fs::write(&path, xml).context(format!("failed to write {}", path.display()))?;

        if dump_content {
            let path = output_dir.join(format!("{}.json", stem));
            let json = serde_json::to_string_pretty(&resource.processed.content)?;
            fs::write(&path, json).context(format!("failed to write {}", path.display()))?;
        }
    }

    let report = conversion.report();
    let report = serde_yaml_ng::to_string(&report).context("failed to serialize report")?;
    let path = output_dir.join(REPORT_FILE);
    fs::write(&path, report).context(format!("failed to write {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let cartridge = Cartridge::load(&cli.cartridge_dir).context(format!(
        "failed to load cartridge from {}",
        cli.cartridge_dir.display()
    ))?;
    let options = ConversionOptions {
        relative_links_source: cli.relative_links_source,
        content_types_with_custom_blocks: cli.custom_blocks,
    };

    info!(directory = %cli.cartridge_dir.display(), "converting cartridge");
    let conversion = convert_cartridge(&cartridge, &options, &ProcessorChain::default());

    create_output_dir(&cli.output_dir).context("failed to create output directory")?;
    write_outputs(&conversion, &cli.output_dir, cli.dump_content)?;

    println!(
        "converted {BOLD}{}{RESET} resources into {BOLD}{}{RESET}",
        conversion.converted.len(),
        cli.output_dir.display()
    );
    if !conversion.unresolved.is_empty() || !conversion.failed.is_empty() {
        println!(
            "{BOLD}{}{RESET} unresolved, {BOLD}{}{RESET} failed, see {}",
            conversion.unresolved.len(),
            conversion.failed.len(),
            cli.output_dir.join(REPORT_FILE).display()
        );
    }

    Ok(())
}
