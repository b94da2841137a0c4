use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use diagraph::{Direction, ImportanceMode, LayoutConfig};

#[derive(Parser)]
#[command(name = "diagraph", about = "Lay out LLM-annotated diagram graphs as JSON")]
struct Cli {
    /// Input graph document (reads from stdin if not provided)
    file: Option<PathBuf>,

    /// Layout configuration file (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Flow direction: td or lr
    #[arg(long, short = 'd')]
    direction: Option<Direction>,

    /// Force simulation steps
    #[arg(long, short = 'i')]
    iterations: Option<usize>,

    /// Importance source: metadata, degree or auto
    #[arg(long)]
    importance: Option<ImportanceMode>,

    /// Only check that the document conforms to the schema
    #[arg(long, conflicts_with = "metrics")]
    check: bool,

    /// Print structure metrics instead of the layout
    #[arg(long)]
    metrics: bool,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LayoutConfig::load(path).unwrap_or_else(|e| fail(e)),
        None => LayoutConfig::default(),
    };
    if let Some(direction) = cli.direction {
        config.direction = direction;
    }
    if let Some(iterations) = cli.iterations {
        config.iterations = iterations;
    }
    if let Some(importance) = cli.importance {
        config.importance = importance;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let input = match &cli.file {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            fail(format!("failed to read {}: {e}", path.display()))
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .unwrap_or_else(|e| fail(format!("failed to read stdin: {e}")));
            buf
        }
    };

    match run(&cli, &input, &config) {
        Ok(output) => println!("{output}"),
        Err(e) => fail(e),
    }
}

fn run(cli: &Cli, input: &str, config: &LayoutConfig) -> diagraph::Result<String> {
    let pretty = !cli.compact;
    if cli.check {
        let graph = diagraph::check(input)?;
        return graph.to_json(pretty);
    }
    if cli.metrics {
        let graph = diagraph::check(input)?;
        return to_json(&diagraph::metrics::analyze(&graph), pretty);
    }
    let result = diagraph::layout(input, config)?;
    to_json(&result, pretty)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> diagraph::Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("ERROR: {e}");
    std::process::exit(1);
}
