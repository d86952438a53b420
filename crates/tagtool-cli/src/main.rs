use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tagfile::cursor::Cursor;
use tagfile::{read_asset, write_asset, Asset, Header, Parsed, ReadOptions, TagSchema};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tagtool", about = "Inspect and rewrite binary tag files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a tag file's header.
    Info {
        /// Path to the tag file.
        file: PathBuf,
    },
    /// Print a tag file as JSON.
    Dump {
        /// Path to the tag file.
        file: PathBuf,
        /// Path to the JSON schema for the file's group.
        #[arg(long)]
        schema: PathBuf,
        /// Treat bytes left after the asset as an error.
        #[arg(long)]
        strict: bool,
        /// Print the full value tree, which `pack` accepts, instead of the
        /// readable projection. NaN and infinite floats print as null and
        /// cannot be packed.
        #[arg(long)]
        raw: bool,
    },
    /// Check that rewriting a tag file reproduces it byte for byte.
    Roundtrip {
        /// Path to the tag file.
        file: PathBuf,
        /// Path to the JSON schema for the file's group.
        #[arg(long)]
        schema: PathBuf,
        /// Treat bytes left after the asset as an error.
        #[arg(long)]
        strict: bool,
    },
    /// Encode a value tree produced by `dump --raw` back into a tag file.
    Pack {
        /// Path to the JSON value tree.
        json: PathBuf,
        /// Path to the JSON schema for the asset's group.
        #[arg(long)]
        schema: PathBuf,
        /// Output path.
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn load_schema(path: &Path) -> Result<TagSchema> {
    let file = File::open(path).with_context(|| format!("failed to open schema: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse schema: {}", path.display()))
}

fn load_asset(file: &Path, schema: &TagSchema, strict: bool) -> Result<(Vec<u8>, Parsed)> {
    let data = fs::read(file).with_context(|| format!("failed to read tag file: {}", file.display()))?;
    let parsed = read_asset(&data, schema, &ReadOptions::from_flags(strict))
        .with_context(|| format!("failed to parse tag file: {}", file.display()))?;
    for warning in &parsed.warnings {
        warn!(file = %file.display(), "{warning}");
    }
    Ok((data, parsed))
}

fn cmd_info(file: &Path) -> Result<()> {
    let data = fs::read(file).with_context(|| format!("failed to read tag file: {}", file.display()))?;
    let header = Header::parse(&mut Cursor::new(&data))
        .with_context(|| format!("failed to parse header: {}", file.display()))?;
    println!("Name:     {}", header.name());
    println!("Group:    {}", header.group);
    println!("Version:  {}", header.version);
    println!("Engine:   {}", header.engine);
    println!("Checksum: {:#010x}", header.checksum);
    println!("Data:     {} bytes at {:#x}", header.data_length, header.data_offset);
    println!("File:     {} bytes", data.len());
    Ok(())
}

fn cmd_dump(file: &Path, schema: &Path, strict: bool, raw: bool) -> Result<()> {
    let schema = load_schema(schema)?;
    let (_, parsed) = load_asset(file, &schema, strict)?;
    let json = if raw {
        serde_json::to_string_pretty(&parsed.asset)?
    } else {
        serde_json::to_string_pretty(&parsed.asset.to_debug_tree())?
    };
    println!("{json}");
    Ok(())
}

fn cmd_roundtrip(file: &Path, schema: &Path, strict: bool) -> Result<()> {
    let schema = load_schema(schema)?;
    let (data, parsed) = load_asset(file, &schema, strict)?;
    let out = write_asset(&parsed.asset, &schema)
        .with_context(|| format!("failed to rewrite tag file: {}", file.display()))?;

    // Trailing bytes are never rewritten.
    let body = &data[..data.len() - parsed.bytes_left()];
    if out.as_slice() != body {
        let at = out
            .iter()
            .zip(body)
            .position(|(a, b)| a != b)
            .unwrap_or(out.len().min(body.len()));
        bail!(
            "{}: rewrite differs at offset {at:#x} ({} bytes read, {} bytes written)",
            file.display(),
            body.len(),
            out.len()
        );
    }
    println!("{}: {} bytes round-trip", file.display(), out.len());
    Ok(())
}

fn cmd_pack(json: &Path, schema: &Path, output: &Path) -> Result<()> {
    let schema = load_schema(schema)?;
    let file = File::open(json).with_context(|| format!("failed to open value tree: {}", json.display()))?;
    let asset: Asset = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse value tree: {}", json.display()))?;
    let bytes = write_asset(&asset, &schema).with_context(|| format!("failed to encode {}", json.display()))?;
    fs::write(output, &bytes).with_context(|| format!("failed to write {}", output.display()))?;
    info!(output = %output.display(), bytes = bytes.len(), "packed");
    println!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Info { file } => cmd_info(file),
        Command::Dump {
            file,
            schema,
            strict,
            raw,
        } => cmd_dump(file, schema, *strict, *raw),
        Command::Roundtrip { file, schema, strict } => cmd_roundtrip(file, schema, *strict),
        Command::Pack { json, schema, output } => cmd_pack(json, schema, output),
    }
}
