use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use rusty_report::format::format_currency;
use rusty_report::{ReportConfig, ReportRequest, generate_report, pipeline};

/// Build a PDF sales report (KPIs, charts and the full table) from a
/// spreadsheet.
#[derive(Parser, Debug)]
#[command(name = "rusty-report", version, about)]
struct Args {
    /// Input file: .csv, .xlsx, .xls, .ods, .parquet or .json
    input: PathBuf,

    /// Output PDF (defaults to the input name with a .pdf extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name printed as the report's author
    #[arg(short, long, default_value = "Sistema")]
    author: String,

    /// Report title
    #[arg(short, long)]
    title: Option<String>,

    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTML template (Jinja2 syntax)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Directory for temporary chart files
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Drop rows with any missing value before aggregating
    #[arg(long)]
    drop_missing: bool,

    /// Number of categories in the bar chart
    #[arg(long)]
    top_n: Option<usize>,

    /// Print the KPIs and exit without rendering
    #[arg(long)]
    summary: bool,
}

fn build_config(args: &Args) -> Result<ReportConfig> {
    let mut config = match &args.config {
        Some(path) => ReportConfig::from_json_file(path)?,
        None => ReportConfig::default(),
    };
    if let Some(template) = &args.template {
        config.template_path = Some(template.clone());
    }
    if let Some(dir) = &args.work_dir {
        config.work_dir = dir.clone();
    }
    if args.drop_missing {
        config.drop_missing = true;
    }
    if let Some(n) = args.top_n {
        config.top_n = n;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = build_config(&args).context("loading configuration")?;

    if args.summary {
        let (table, kpis) = pipeline::summarize(&args.input, &config)?;
        println!("rows:    {}", table.len());
        println!("total:   {}", format_currency(kpis.total));
        println!("average: {}", format_currency(kpis.average));
        println!("top:     {}", kpis.top_entity);
        return Ok(());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("pdf"));
    let request = ReportRequest {
        author: args.author.clone(),
        title: args.title.clone(),
        generated_at: None,
    };

    let outcome = generate_report(&args.input, &output, &request, &config)
        .with_context(|| format!("generating report for {}", args.input.display()))?;
    println!("{}", outcome.output.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Erro: {e:#}");
            ExitCode::FAILURE
        }
    }
}
