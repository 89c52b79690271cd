//! Batch conversion example
//!
//! Converts the JPEG files passed on the command line and writes one
//! combined `converted_images.zip` next to them.
//!
//! Usage: cargo run --example batch_convert -- photo1.jpg photo2.jpg

use avif_batch::{
    BatchConverter, Config, Event, FileRegistry, LocalConversionService, SourceFile,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: batch_convert <file.jpg> [file.jpg ...]");
        std::process::exit(1);
    }

    let config = Config::default();
    let registry = FileRegistry::new();
    let service = Arc::new(LocalConversionService::new(&config, registry));
    let converter = BatchConverter::new(config, service)?;

    // Print per-file progress as it happens
    let mut events = converter.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::FileRejected { name, reason } => eprintln!("rejected {name}: {reason}"),
                Event::ConversionStarted { name, .. } => println!("converting {name}..."),
                Event::Converted {
                    name,
                    savings_percent,
                    ..
                } => println!("converted {name} ({savings_percent}% smaller)"),
                Event::ConversionFailed { name, error, .. } => {
                    eprintln!("failed {name}: {error}")
                }
                _ => {}
            }
        }
    });

    // Queue every readable candidate
    let mut candidates = Vec::new();
    for path in &paths {
        let data = tokio::fs::read(path).await?;
        let name = std::path::Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        candidates.push(SourceFile::new(name, "image/jpeg", data));
    }
    let added = converter.add_files(candidates).await;
    println!("{added} of {} files queued", paths.len());

    // Strictly sequential conversion, insertion order
    let summary = converter.convert_all().await?;
    println!(
        "done: {} converted, {} failed",
        summary.converted, summary.failed
    );

    if summary.converted > 0 {
        let archive = converter.download_all().await?;
        tokio::fs::write(&archive.filename, archive.data.as_ref()).await?;
        println!("wrote {}", archive.filename);
    }

    Ok(())
}
