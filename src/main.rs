use anyhow::{Context, Result};
use clap::Parser;
use salesplot::selftest;
use salesplot::{
    FileSurface, OutputFormat, RenderOptions, Renderer, Surface, Table, TracingLog, WriterSurface,
};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "salesplot")]
#[command(about = "Render a bar chart of sales by category from CSV or JSON data", long_about = None)]
struct Args {
    /// Column holding the category labels (must be unique)
    #[arg(long, default_value = "Category")]
    category: String,

    /// Column holding the numeric sales values
    #[arg(long, default_value = "Sales")]
    sales: String,

    /// Input file; stdin when omitted or "-"
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Treat the input as a JSON array of objects instead of CSV
    #[arg(long)]
    json: bool,

    /// JSON file with render options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: png, svg or json
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Bar color name or #rrggbb
    #[arg(long)]
    color: Option<String>,

    /// Bar width as a fraction of the category slot, in (0, 1]
    #[arg(long)]
    bar_width: Option<f64>,

    /// Bar opacity, in [0, 1]
    #[arg(long)]
    bar_alpha: Option<f64>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Run the built-in scenario suite and exit
    #[arg(long)]
    self_test: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.self_test {
        return run_self_test();
    }

    let options = resolve_options(&args)?;
    let table = read_table(&args).context("Failed to read input data")?;

    // The output file is only created once validation has passed
    match &args.output {
        Some(path) => render(&args, &table, FileSurface::new(path, options)),
        None => render(&args, &table, WriterSurface::new(io::stdout().lock(), options)),
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbose {
        0 => EnvFilter::new("salesplot=warn"),
        1 => EnvFilter::new("salesplot=info"),
        _ => EnvFilter::new("salesplot=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Config file first, then command-line overrides
fn resolve_options(args: &Args) -> Result<RenderOptions> {
    let mut options = match &args.config {
        Some(path) => RenderOptions::load(path)?,
        None => RenderOptions::default(),
    };

    if let Some(format) = args.format {
        options.format = format;
    }
    if let Some(width) = args.width {
        options.width = width;
    }
    if let Some(height) = args.height {
        options.height = height;
    }
    if let Some(color) = &args.color {
        options.bar_color = color.clone();
    }
    if let Some(bar_width) = args.bar_width {
        options.bar_width = bar_width;
    }
    if let Some(bar_alpha) = args.bar_alpha {
        options.bar_alpha = bar_alpha;
    }

    options.validate()?;
    Ok(options)
}

fn open_input(args: &Args) -> Result<Box<dyn Read>> {
    match &args.input {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file '{}'", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn read_table(args: &Args) -> Result<Table> {
    let reader = open_input(args)?;

    let table = if args.json {
        let value: serde_json::Value =
            serde_json::from_reader(reader).context("Input is not valid JSON")?;
        Table::from_json(&value)?
    } else {
        Table::from_csv_reader(reader)?
    };

    info!(
        rows = table.height(),
        columns = table.columns().len(),
        "Loaded input table"
    );
    Ok(table)
}

fn render<S: Surface>(args: &Args, table: &Table, surface: S) -> Result<()> {
    let mut renderer = Renderer::new(TracingLog, surface);
    let chart = renderer
        .render(table, &args.category, &args.sales)
        .context("Failed to render sales chart")?;

    info!(bars = chart.bars().len(), "Sales chart written");
    Ok(())
}

fn run_self_test() -> Result<()> {
    let outcomes = selftest::run_suite();
    let failed = outcomes.iter().filter(|o| !o.passed).count();

    for outcome in &outcomes {
        if outcome.passed {
            println!("test {} ... ok", outcome.name);
        } else {
            println!("test {} ... FAILED ({})", outcome.name, outcome.detail);
        }
    }
    println!(
        "\nself-test result: {} passed; {} failed",
        outcomes.len() - failed,
        failed
    );

    if failed > 0 {
        anyhow::bail!("{} of {} self-test scenarios failed", failed, outcomes.len());
    }
    Ok(())
}
