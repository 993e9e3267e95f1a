use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use mdshot::export::{CancelToken, FsSink};
use mdshot::{theme, SessionConfig, ThemeTokens};

/// Render markdown to themed PNG images.
#[derive(Debug, Parser)]
#[command(name = "mdshot", version, about)]
struct Cli {
    /// Markdown input file ("-" reads stdin)
    input: PathBuf,

    /// Output directory for the produced PNG files
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Built-in theme name
    #[arg(short, long, default_value = theme::DEFAULT_THEME)]
    theme: String,

    /// JSON file with a custom theme token set (overrides --theme)
    #[arg(long)]
    theme_file: Option<PathBuf>,

    /// Comma-separated cut-line positions in document pixels, e.g. "300,700"
    #[arg(long)]
    cut: Option<String>,

    /// Preview content-box width in pixels
    #[arg(long, default_value_t = 720)]
    width: u32,

    /// Scale factor for the exported bitmap
    #[arg(long, default_value_t = 2)]
    supersample: u32,

    /// Pacing delay between segment files, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// List the built-in themes and exit
    #[arg(long)]
    list_themes: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list_themes {
        for name in theme::builtin_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let source = if cli.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading markdown from stdin")?;
        buf
    } else {
        fs::read_to_string(&cli.input)
            .with_context(|| format!("reading {}", cli.input.display()))?
    };

    let config = SessionConfig {
        preview_width: cli.width,
        supersample: cli.supersample,
        download_delay_ms: cli.delay_ms,
        theme: cli.theme.clone(),
        ..SessionConfig::default()
    };
    let mut session = mdshot::new_session(config);
    session.set_source(&source);

    if let Some(path) = &cli.theme_file {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let tokens: ThemeTokens =
            serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
        session.set_theme_tokens("custom", tokens);
    }

    if let Some(cuts) = &cli.cut {
        session.toggle_cutting();
        for part in cuts.split(',') {
            let y: u32 = part
                .trim()
                .parse()
                .with_context(|| format!("invalid cut position '{}'", part.trim()))?;
            session
                .add_cut_line(y)
                .with_context(|| format!("placing cut line at y={}", y))?;
        }
    }

    let mut sink = FsSink::new(&cli.out);
    let report = session.export(&mut sink, &CancelToken::new())?;
    if report.files.is_empty() {
        bail!("export produced no files");
    }
    for file in &report.files {
        println!("{}", cli.out.join(file).display());
    }
    Ok(())
}
