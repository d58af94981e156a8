//! CLI tool for persisted relation schemas.
//!
//! Provides commands for:
//! - Listing the type conversion table
//! - Inspecting schema blobs and relation version tables
//! - Structural comparison of two schema blobs

mod cli;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use odb_schema_core::codec::ByteReader;
use odb_schema_core::config::SchemaConfig;
use odb_schema_core::{
    DefaultFieldHandlerFactory, RelationSchema, RelationVersions, TableFieldInfo,
    TypeConversionRegistry,
};
use odb_types::Type;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = match cli.command {
        Commands::Conversions { from } => list_conversions(from),
        Commands::Inspect {
            file,
            config,
            versions,
        } => inspect(&file, config.as_deref(), versions)?,
        Commands::Diff { a, b, config } => diff(&a, &b, config.as_deref())?,
    };
    print!("{}", output);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SchemaConfig> {
    match path {
        Some(path) => SchemaConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(SchemaConfig::default()),
    }
}

fn read_schema(path: &Path, config: &SchemaConfig) -> Result<RelationSchema> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    // Custom handlers of the writing application are unknown here.
    let schema =
        RelationSchema::from_bytes(&bytes, &DefaultFieldHandlerFactory::lenient(), config)
            .with_context(|| format!("Failed to decode schema {}", path.display()))?;
    tracing::debug!("Decoded {} ({} bytes)", path.display(), bytes.len());
    Ok(schema)
}

fn list_conversions(from: Option<Type>) -> String {
    TypeConversionRegistry::global()
        .conversions()
        .filter(|conversion| from.map_or(true, |ty| ty == conversion.from_type()))
        .map(|conversion| {
            format!(
                "{} -> {}\n",
                conversion.from_type(),
                conversion.to_type()
            )
        })
        .collect()
}

fn describe_fields(title: &str, fields: &[TableFieldInfo], out: &mut String) {
    out.push_str(title);
    out.push_str(":\n");
    for field in fields {
        out.push_str(&format!("  {}: {}\n", field.name(), field.handler().name()));
    }
}

fn describe_schema(schema: &RelationSchema, out: &mut String) -> Result<()> {
    describe_fields("primary key", schema.primary_key_fields(), out);
    describe_fields("fields", schema.value_fields(), out);
    if !schema.has_secondary_keys() {
        return Ok(());
    }
    out.push_str("secondary keys:\n");
    for (index, info) in schema.secondary_keys() {
        let fields = schema
            .secondary_key_fields(index)
            .with_context(|| format!("Failed to resolve secondary key '{}'", info.name()))?;
        let names: Vec<&str> = fields.iter().map(|field| field.name()).collect();
        out.push_str(&format!("  #{} {}: ({})\n", index, info.name(), names.join(", ")));
    }
    Ok(())
}

fn inspect(path: &Path, config: Option<&Path>, versions: bool) -> Result<String> {
    let config = load_config(config)?;
    let mut out = String::new();
    if !versions {
        describe_schema(&read_schema(path, &config)?, &mut out)?;
        return Ok(out);
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let table = RelationVersions::load(
        &mut ByteReader::new(&bytes),
        &DefaultFieldHandlerFactory::lenient(),
        &config,
    )
    .with_context(|| format!("Failed to decode version table {}", path.display()))?;
    out.push_str(&format!(
        "relation {} ({} versions)\n",
        table.relation(),
        table.len()
    ));
    for (version, schema) in table.iter() {
        out.push_str(&format!("version {}:\n", version));
        describe_schema(schema, &mut out)?;
    }
    Ok(out)
}

fn diff(a: &Path, b: &Path, config: Option<&Path>) -> Result<String> {
    let config = load_config(config)?;
    let left = read_schema(a, &config)?;
    let right = read_schema(b, &config)?;
    Ok(if left == right {
        "schemas are equal\n".to_string()
    } else {
        "schemas differ\n".to_string()
    })
}
