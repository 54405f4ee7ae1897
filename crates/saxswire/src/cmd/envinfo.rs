use std::collections::BTreeMap;

use saxswire::frame::{Compression, DEFAULT_MAX_PAYLOAD, MAGIC, PROTOCOL_VERSION};
use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct WireInfo {
    magic: String,
    protocol_version: u16,
    default_max_payload: u64,
    compression: Vec<String>,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    version: String,
    target: String,
    rust_version: String,
    git_hash: String,
    os: String,
    arch: String,
    features: Vec<String>,
    wire: WireInfo,
    environment: BTreeMap<String, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let environment = ["SAXSWIRE_LOG_LEVEL", "SAXSWIRE_LOG_FORMAT", "RUST_LOG"]
        .into_iter()
        .map(|key| (key.to_string(), std::env::var(key).ok()))
        .collect();

    let output = EnvInfoOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: target_triple(),
        rust_version: option_env!("RUSTC_VERSION")
            .unwrap_or("unknown")
            .to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        features: active_features(),
        wire: wire_info(),
        environment,
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn wire_info() -> WireInfo {
    let compression = [Compression::None, Compression::Lz4, Compression::Zstd]
        .into_iter()
        .map(|c| {
            let status = if c.is_supported() { "supported" } else { "unsupported" };
            format!("{c} ({status})")
        })
        .collect();

    WireInfo {
        magic: format!("{MAGIC:#010x}"),
        protocol_version: PROTOCOL_VERSION,
        default_max_payload: DEFAULT_MAX_PAYLOAD,
        compression,
    }
}

fn target_triple() -> String {
    option_env!("SAXSWIRE_BUILD_TARGET")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}-unknown-{}", std::env::consts::ARCH, std::env::consts::OS))
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("saxswire environment\n");
            println!("  Version:    {}", output.version);
            println!("  Target:     {}", output.target);
            println!("  Rust:       {}", output.rust_version);
            println!("  Git hash:   {}", output.git_hash);
            println!("  Platform:   {} ({})", output.os, output.arch);
            println!("  Features:   {}", output.features.join(", "));
            println!("\n  Wire format:");
            println!("    magic            {}", output.wire.magic);
            println!("    protocol         {}", output.wire.protocol_version);
            println!("    max payload      {}", output.wire.default_max_payload);
            println!("    compression      {}", output.wire.compression.join(", "));
            println!("\n  Environment:");
            for (k, v) in &output.environment {
                println!("    {:<20} {}", k, v.as_deref().unwrap_or("(not set)"));
            }
        }
    }
}

fn active_features() -> Vec<String> {
    let mut features = vec!["cli".to_string()];
    if cfg!(feature = "async") {
        features.push("async".to_string());
    }
    features
}
