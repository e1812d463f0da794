//! CLI entry point for `attachrelay`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use attachrelay::classify::classify;
use attachrelay::config::{self, Config};
use attachrelay::deliver::Pipeline;
use attachrelay::emit::{Emitter, MemoryEmitter};
use attachrelay::fetch::FsFetcher;
use attachrelay::model::descriptor::AttachmentDescriptor;
use attachrelay::model::preview::PreviewRecord;
use attachrelay::surface::LocalSurface;

#[derive(Parser)]
#[command(
    name = "attachrelay",
    version,
    about = "Deliver case attachments: inline preview, link navigation or file download"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Deliver attachments described by descriptor JSON files
    Deliver {
        /// Descriptor JSON files
        #[arg(required = true, value_name = "DESCRIPTOR")]
        descriptors: Vec<PathBuf>,

        /// Directory holding one `<id>.json` content envelope per attachment
        #[arg(short, long, value_name = "DIR")]
        content: PathBuf,

        /// Download directory (default: config, then the platform download dir)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Collect previewable attachments into a gallery listing instead of
        /// opening each one
        #[arg(long)]
        gallery: bool,

        /// Context name forwarded to the content service
        #[arg(long, value_name = "NAME")]
        context: Option<String>,
    },
    /// Print the delivery kind for a MIME type
    Classify {
        mime_type: String,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Deliver {
            descriptors,
            content,
            output,
            gallery,
            context,
        } => cmd_deliver(&descriptors, &content, output, gallery, context, &config),
        Commands::Classify { mime_type } => cmd_classify(&mime_type),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "attachrelay.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Deliver one or more attachments through the pipeline.
fn cmd_deliver(
    descriptor_paths: &[PathBuf],
    content_dir: &Path,
    output: Option<PathBuf>,
    gallery: bool,
    context: Option<String>,
    config: &Config,
) -> anyhow::Result<()> {
    // Parse all descriptors up front: a malformed one aborts the run before
    // any side effect fires.
    let mut descriptors = Vec::with_capacity(descriptor_paths.len());
    for path in descriptor_paths {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read '{}': {e}", path.display()))?;
        let descriptor = AttachmentDescriptor::from_json(&raw)
            .map_err(|e| anyhow::anyhow!("'{}': {e}", path.display()))?;
        descriptors.push(descriptor);
    }

    let download_dir = output
        .or_else(|| config.delivery.download_dir.clone())
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let context = context
        .or_else(|| config.delivery.context.clone())
        .unwrap_or_else(|| "default".to_string());

    let emitter = MemoryEmitter::new();
    let surface = LocalSurface::new(&download_dir);
    let pipeline = Pipeline::new(&emitter, &surface);
    let fetcher = FsFetcher::new(content_dir);
    let mut sink: Option<Vec<PreviewRecord>> = gallery.then(Vec::new);

    let pb = ProgressBar::new(descriptors.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Delivering [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let mut delivered = 0usize;
    let mut failed = 0usize;

    for (i, descriptor) in descriptors.iter().enumerate() {
        pb.set_position(i as u64);
        match runtime.block_on(pipeline.deliver(descriptor, &fetcher, &context, sink.as_mut())) {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::warn!(id = %descriptor.id, error = %e, "Delivery failed");
                failed += 1;
            }
        }
    }
    pb.finish_and_clear();

    println!("  Delivered {delivered} attachment(s) to {}", download_dir.display());
    if failed > 0 {
        println!("  {failed} delivery(ies) failed — see log for details");
    }

    if let Some(records) = sink {
        print_gallery(&records);
        // The gallery owns the collected handles; release them once printed.
        for record in &records {
            emitter.revoke(&record.handle);
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} deliveries failed", descriptors.len());
    }
    Ok(())
}

/// Print collected preview records as a listing.
fn print_gallery(records: &[PreviewRecord]) {
    use humansize::{format_size, BINARY};

    if records.is_empty() {
        println!("  No previewable attachments collected.");
        return;
    }

    println!();
    println!("  Gallery ({} preview(s)):", records.len());
    for record in records {
        println!(
            "  {:<28} {:<18} {:>9}  {}",
            record.name,
            record.mime_type,
            format_size(record.handle.buffer().len(), BINARY),
            record.metadata.join(" · "),
        );
        println!("  {:<28} {}", "", record.description);
    }
    println!();
}

/// Print the delivery kind for a MIME type.
fn cmd_classify(mime_type: &str) -> anyhow::Result<()> {
    println!("{}", classify(mime_type));
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "attachrelay", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
