//! lawkit command-line interface
//!
//! Reads a payload from a file or stdin, runs one engine subcommand over it
//! and prints the results as text, JSON or Markdown.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use lawkit_core::core::AnalysisRequest;
use lawkit_core::formatters::{formatter_for, FormatterConfig, OutputFormat};
use lawkit_core::logging::setup::{init_logging, LoggingConfig};
use lawkit_core::sources::{load_file, parse_content, DataFormat};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "lawkit", author, version, about, long_about = None)]
struct Args {
    /// benford (benf), pareto, zipf, normal, poisson, validate, diagnose, generate or analyze
    subcommand: String,

    /// Input file (JSON, CSV or text); reads stdin when omitted or "-"
    file: Option<PathBuf>,

    /// Engine option, repeatable; values are read as JSON when they parse
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    options: Vec<(String, Value)>,

    /// Output format: text, json or markdown
    #[arg(short, long)]
    format: Option<String>,

    /// How stdin and unknown file types are read: json, csv or auto
    #[arg(long, default_value = "auto")]
    input_format: DataFormat,

    /// Law to generate when no payload is given
    #[arg(long, default_value = "benford")]
    law: String,

    /// Seed for generate
    #[arg(long)]
    seed: Option<u64>,

    /// Number of values for generate
    #[arg(long)]
    count: Option<u64>,

    /// Laws for analyze, comma separated
    #[arg(long, value_delimiter = ',')]
    laws: Vec<String>,

    /// Evaluate chunks and datasets in parallel
    #[arg(long)]
    parallel: bool,

    /// Omit per-bin and per-item details
    #[arg(long)]
    brief: bool,

    /// Debug logging for lawkit
    #[arg(short, long)]
    verbose: bool,

    /// Write logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    timestamp: DateTime<Utc>,
    subcommand: &'a str,
    results: Value,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing option name in '{raw}'"));
    }
    let value = value.trim();
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl Args {
    /// Merges `-o` pairs with the dedicated flags; flags win.
    fn engine_options(&self) -> Value {
        let mut options: Map<String, Value> = self.options.iter().cloned().collect();
        if let Some(format) = &self.format {
            options.insert("output_format".into(), Value::from(format.as_str()));
        }
        if let Some(seed) = self.seed {
            options.insert("generate_seed".into(), Value::from(seed));
        }
        if let Some(count) = self.count {
            options.insert("generate_count".into(), Value::from(count));
        }
        if !self.laws.is_empty() {
            options.insert("laws_to_check".into(), Value::from(self.laws.clone()));
        }
        if self.parallel {
            options.insert("enable_parallel_processing".into(), Value::Bool(true));
        }
        if self.brief {
            options.insert("show_details".into(), Value::Bool(false));
        }
        Value::Object(options)
    }

    fn reads_stdin(&self) -> bool {
        match &self.file {
            Some(path) => path.as_os_str() == "-",
            None => true,
        }
    }

    fn payload(&self) -> Result<Value> {
        if self.is_generate() && self.reads_stdin() {
            return Ok(Value::from(self.law.as_str()));
        }
        match &self.file {
            Some(path) if path.as_os_str() != "-" => Ok(load_file(path)?),
            _ => {
                let mut content = String::new();
                std::io::stdin()
                    .read_to_string(&mut content)
                    .context("Failed to read stdin")?;
                Ok(parse_content(&content, self.input_format)?)
            }
        }
    }

    fn is_generate(&self) -> bool {
        self.subcommand.trim().eq_ignore_ascii_case("generate")
    }

    fn logging(&self) -> LoggingConfig {
        let config = if self.verbose {
            LoggingConfig::development()
        } else {
            LoggingConfig::default()
        };
        config.with_json_format(self.json_logs)
    }
}

async fn run(args: &Args) -> Result<String> {
    let payload = args.payload()?;
    let request = AnalysisRequest::parse(&args.subcommand, &payload, &args.engine_options())?;
    debug!(subcommand = %request.subcommand(), "Running request");

    let results = request.run().await?;
    let output = &request.options().output;
    let config = FormatterConfig::from_options(output)
        .with_colors(output.format == OutputFormat::Text && std::io::stdout().is_terminal());
    let rendered = formatter_for(output.format).format_with_config(&results, &config)?;

    if output.format != OutputFormat::Json {
        return Ok(rendered);
    }
    let envelope = Envelope {
        timestamp: Utc::now(),
        subcommand: request.subcommand().as_str(),
        results: serde_json::from_str(&rendered)?,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.logging()).map_err(|e| anyhow!("{e}")) {
        eprintln!("Warning: logging disabled: {e}");
    }

    match run(&args).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
