use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use artproof::{BackgroundMode, PreviewOptions, PreviewPipeline, SwatchExtractor, Toolchain};

#[derive(Parser, Debug)]
#[command(name = "artproof", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a watermarked PNG preview plus a JSON metadata record.
    Preview(PreviewArgs),
    /// Extract embedded colors from a vector file without rendering it.
    Colors(ColorsArgs),
    /// Report which converter binaries are available on this host.
    Probe,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Input design file (vector or embroidery).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Also write the companion scalable PDF here, when one is producible.
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Background treatment.
    #[arg(long, value_enum, default_value_t = BackgroundMode::Auto)]
    background: BackgroundMode,

    /// Rasterization resolution for vector sources.
    #[arg(long, default_value_t = 300)]
    dpi: u32,
}

#[derive(Parser, Debug)]
struct ColorsArgs {
    /// Input vector file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Preview(args) => cmd_preview(args),
        Command::Colors(args) => cmd_colors(args),
        Command::Probe => cmd_probe(),
    }
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let options = PreviewOptions {
        background: args.background,
        dpi: args.dpi,
        ..PreviewOptions::default()
    };
    let pipeline = PreviewPipeline::new(Toolchain::probe(), options);
    let result = pipeline.generate(&args.in_path)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &result.png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());

    if let Some(pdf_path) = &args.pdf {
        match &result.pdf {
            Some(bytes) => {
                std::fs::write(pdf_path, bytes)
                    .with_context(|| format!("write pdf '{}'", pdf_path.display()))?;
                eprintln!("wrote {}", pdf_path.display());
            }
            None => eprintln!("no scalable pdf available for this source"),
        }
    }

    serde_json::to_writer_pretty(std::io::stdout().lock(), &result)?;
    println!();
    Ok(())
}

fn cmd_colors(args: ColorsArgs) -> anyhow::Result<()> {
    let ext = artproof::dispatch::extension(&args.in_path).unwrap_or_default();
    let extractor = SwatchExtractor::new(Toolchain::probe());
    let colors = extractor.extract_from_file(&args.in_path, &ext)?;

    match colors {
        Some(set) => serde_json::to_writer_pretty(std::io::stdout().lock(), &set)?,
        None => print!("{}", serde_json::Value::Null),
    }
    println!();
    Ok(())
}

fn cmd_probe() -> anyhow::Result<()> {
    let tools = Toolchain::probe();
    serde_json::to_writer_pretty(std::io::stdout().lock(), &tools)?;
    println!();
    Ok(())
}
