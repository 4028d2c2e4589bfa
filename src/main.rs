use anyhow::{Context, Result};
use clap::Parser;
use recuerdo::cli::{Cli, OutputFormat};
use recuerdo::persist;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print a snapshot in human-readable form
fn print_text(snapshot: &persist::Snapshot) {
    println!(
        "{} [{}] @ {} (seq {}, {} entries)",
        snapshot.tracee,
        snapshot.label,
        snapshot.timestamp_ms,
        snapshot.sequence,
        snapshot.payload.len()
    );
    for (name, value) in snapshot.payload.iter() {
        let origin = value.origin.as_deref().unwrap_or("<unknown>");
        println!(
            "  {name}: {} ({origin}, {} bytes)",
            value.type_name, value.size_bytes
        );
        println!("    {}", value.data);
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let snapshot = persist::load(&args.snapshot)
        .with_context(|| format!("failed to load snapshot {}", args.snapshot.display()))?;

    match args.format {
        OutputFormat::Text => print_text(&snapshot),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&snapshot)
                .context("failed to render snapshot as JSON")?;
            println!("{json}");
        }
    }

    Ok(())
}
