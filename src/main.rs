use bounty_crawl::{Bounty, Crawl, CrawlError, CrawlerConfig};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tokio::sync::watch;

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), CrawlError> {
    let config = match &args.config {
        Some(path) => CrawlerConfig::from_file(path)?,
        None => CrawlerConfig::default(),
    };
    let config = args.apply(config);

    let mut sink: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    // Ctrl-C stops new bounties from starting; in-flight ones finish
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::warn!("Interrupt received, finishing in-flight bounties");
            let _ = shutdown_tx.send(true);
        }
    });

    let start_time = std::time::Instant::now();
    let mut run = Crawl::new(config)
        .with_shutdown(shutdown_rx)
        .generate()
        .await?;

    while let Some(bounty) = run.records.recv().await {
        write_record(&mut sink, &bounty)?;
    }
    sink.flush()?;

    let summary = run.finish().await;
    for skipped in &summary.skipped {
        ::log::warn!("Skipped '{}': {}", skipped.slug, skipped.error);
    }
    ::log::info!(
        "Wrote {} of {} bounties in {:.2} seconds",
        summary.emitted,
        summary.discovered,
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

fn write_record(sink: &mut dyn Write, bounty: &Bounty) -> Result<(), CrawlError> {
    serde_json::to_writer(&mut *sink, bounty)?;
    sink.write_all(b"\n")?;
    Ok(())
}
