//! `php-inspect`: print a file, or decode it as PHP serialized data and
//! print its top-level keys in declaration order.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use php_inspect_core::{
    inspect, InspectConfig, Inspection, JsonReport, KeyScan, ParserConfig, MAX_DEPTH,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod palette;

use palette::{ColorChoice, Palette};

const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(
    name = "php-inspect",
    version,
    about = "Inspect PHP serialized data with its key order preserved"
)]
struct Args {
    /// Input file.
    file: PathBuf,

    /// Refuse files larger than this many bytes.
    #[arg(short = 'm', long, default_value_t = DEFAULT_MAX_SIZE)]
    max_size: u64,

    /// Decode the input as PHP serialized data.
    #[arg(short, long)]
    php: bool,

    /// With --php, print the value as JSON.
    #[arg(long, requires = "php")]
    json: bool,

    /// Record every string token as a key candidate.
    #[arg(long)]
    flat_keys: bool,

    /// Maximum array nesting depth.
    #[arg(
        long,
        default_value_t = MAX_DEPTH as u64,
        value_parser = clap::value_parser!(u64).range(1..=MAX_DEPTH as u64)
    )]
    max_depth: u64,

    /// Also write the uncoloured output to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// When to colour output.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Log more (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn inspect_config(&self) -> InspectConfig {
        InspectConfig {
            parser: ParserConfig {
                max_depth: usize::try_from(self.max_depth).unwrap_or(MAX_DEPTH),
            },
            key_scan: if self.flat_keys {
                KeyScan::Flat
            } else {
                KeyScan::TopLevel
            },
        }
    }
}

/// What goes to stdout, with and without styling.
struct Rendered {
    plain: String,
    painted: String,
}

impl Rendered {
    fn unstyled(text: String) -> Self {
        Self {
            painted: text.clone(),
            plain: text,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let stdout = Palette::resolve(args.color, io::stdout().is_terminal());
    let stderr = Palette::resolve(args.color, io::stderr().is_terminal());

    let data = read_input(&args.file, args.max_size)?;
    let rendered = if args.php {
        render_php(&data, &args, stdout, stderr)?
    } else {
        Rendered::unstyled(String::from_utf8_lossy(&data).into_owned())
    };

    io::stdout()
        .lock()
        .write_all(rendered.painted.as_bytes())
        .context("failed to write to stdout")?;

    if let Some(path) = &args.output {
        fs::write(path, rendered.plain.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote output file");
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_input(path: &Path, max_size: u64) -> Result<Vec<u8>> {
    let size = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();
    if size > max_size {
        bail!(
            "{} is {} bytes, over the limit of {} bytes",
            path.display(),
            size,
            max_size
        );
    }

    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    debug!(path = %path.display(), bytes = data.len(), "Read input");
    Ok(data)
}

fn render_php(data: &[u8], args: &Args, stdout: Palette, stderr: Palette) -> Result<Rendered> {
    let inspection = inspect(data, &args.inspect_config());

    if let Some(e) = inspection.decode_error() {
        eprintln!("{} {}", stderr.error("error:"), e);
        return Ok(Rendered::unstyled(inspection.render_or_raw(data)));
    }
    if let Some(e) = &inspection.key_order_error {
        eprintln!(
            "{} key order unavailable, printing in stored order: {}",
            stderr.warning("warning:"),
            e
        );
    }

    if args.json {
        return render_json(&inspection).map(Rendered::unstyled);
    }

    let plain = inspection.render_or_raw(data);
    Ok(Rendered {
        painted: stdout.report(&plain),
        plain,
    })
}

fn render_json(inspection: &Inspection<'_>) -> Result<String> {
    let Ok(value) = &inspection.value else {
        bail!("no decoded value to convert");
    };
    let report = JsonReport::new(value, &inspection.key_order);
    let mut json = serde_json::to_string_pretty(&report).context("failed to encode JSON")?;
    json.push('\n');
    Ok(json)
}
