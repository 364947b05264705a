//! formfill command line
//!
//! Extracts a structured record from a resume PDF and fills job application
//! forms with it.

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use formfill::browser::{BrowserTarget, ConnectionOptions, LaunchOptions};
use formfill::config::FillerConfig;
use formfill::form::{FieldKind, UnfilledField, UserSuppliedValue, UserValue, UserValues};
use formfill::orchestrator::{FillRequest, FormFiller, NoValues, ValueSource};
use formfill::report::{FillReport, PassStatus};
use formfill::resume::{GeminiModel, LinkResolver, PdfExtractor, ResumeParser, ResumeRecord};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "formfill", version, about = "Fill job application forms from a resume")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print machine-readable JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract a resume PDF into a record JSON
    Extract {
        /// Resume PDF
        resume: PathBuf,

        /// Write the record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Fill a form from a record JSON
    Fill {
        /// Record JSON written by `extract`
        #[arg(long)]
        data: PathBuf,

        /// Application form URL
        #[arg(long)]
        url: String,

        #[command(flatten)]
        values: ValueArgs,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// List the fields of a form that stay empty after placing the record, without submitting
    Scan {
        /// Record JSON written by `extract`
        #[arg(long)]
        data: Option<PathBuf>,

        /// Application form URL
        #[arg(long)]
        url: String,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Extract a resume and fill a form with it
    Run {
        /// Resume PDF
        resume: PathBuf,

        /// Application form URL
        #[arg(long)]
        url: String,

        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        values: ValueArgs,

        #[command(flatten)]
        browser: BrowserArgs,
    },
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model to try, in order (repeatable)
    #[arg(long = "model")]
    models: Vec<String>,

    /// Follow redirects of links found in the resume
    #[arg(long)]
    resolve_links: bool,

    /// Ask for important fields the resume lacks
    #[arg(long)]
    ask_missing: bool,
}

#[derive(Args, Debug)]
struct ValueArgs {
    /// JSON file with values for unfilled fields, keyed by their index in `scan` output
    #[arg(long, conflicts_with = "interactive")]
    values: Option<PathBuf>,

    /// Ask for values of unfilled fields in the terminal
    #[arg(long)]
    interactive: bool,
}

#[derive(Args, Debug)]
struct BrowserArgs {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// WebSocket endpoint URL of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Stop before submitting when fields stay unfilled and no values are given
    #[arg(long)]
    pause_when_unfilled: bool,

    /// Submit candidates tried before native form submission
    #[arg(long, default_value_t = 5)]
    max_submit_candidates: usize,
}

impl BrowserArgs {
    fn target(&self) -> BrowserTarget {
        match &self.ws_endpoint {
            Some(endpoint) => BrowserTarget::Connect(ConnectionOptions::new(endpoint.clone())),
            None => {
                let mut options = LaunchOptions::new().headless(!self.headed);
                if let Some(path) = &self.chrome_path {
                    options = options.chrome_path(path.clone());
                }
                BrowserTarget::Launch(options)
            }
        }
    }

    fn config(&self) -> FillerConfig {
        FillerConfig::new()
            .max_submit_candidates(self.max_submit_candidates)
            .pause_when_unfilled(self.pause_when_unfilled)
    }
}

/// Asks for unfilled field values on the terminal
struct TerminalPrompt;

impl ValueSource for TerminalPrompt {
    fn values_for(&mut self, fields: &[UnfilledField]) -> UserValues {
        let mut values = UserValues::new();
        eprintln!("\n{} field(s) still need values (press Enter to skip):", fields.len());

        for (index, field) in fields.iter().enumerate() {
            let required = if field.required { ", required" } else { "" };
            eprintln!("\n[{}] {} ({}{}): {}", index, field.name, field.kind, required, field.display_label());
            if let Some(placeholder) = &field.placeholder {
                eprintln!("    placeholder: {}", placeholder);
            }
            if !field.options.is_empty() {
                eprintln!("    options: {}", field.options.join(" | "));
            }

            let question = if field.kind == FieldKind::Checkbox { "Check it? [y/N]" } else { "Value" };
            let Some(answer) = ask(question) else { break };
            if answer.is_empty() {
                continue;
            }

            let value = if field.kind == FieldKind::Checkbox {
                UserValue::Flag(UserValue::Text(answer).wants_checked())
            } else {
                UserValue::Text(answer)
            };
            values.insert(index, UserSuppliedValue::new(value, field.clone()));
        }
        values
    }
}

/// One trimmed line from stdin; `None` at end of input
fn ask(question: &str) -> Option<String> {
    eprint!("{}: ", question);
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Could not parse {}", path.display()))
}

fn extract(resume: &Path, model: &ModelArgs) -> anyhow::Result<ResumeRecord> {
    let mut extractor = PdfExtractor::new();
    if model.resolve_links {
        extractor = extractor.with_resolver(LinkResolver::new()?);
    }
    let mut gemini = GeminiModel::new(model.api_key.clone())?;
    if !model.models.is_empty() {
        gemini = gemini.with_models(model.models.clone());
    }

    let mut record = ResumeParser::new(extractor, gemini).parse(resume)?;
    if let Some(raw) = &record.raw_response {
        log::warn!("Model output was not valid JSON, raw response:\n{}", raw);
    }

    let missing = record.missing_fields();
    if model.ask_missing && !missing.is_empty() {
        eprintln!("Missing fields: {}", missing.join(", "));
        for field in missing {
            let question = if field == "skills" { "skills (comma-separated)".to_string() } else { field.to_string() };
            match ask(&question) {
                Some(answer) if !answer.is_empty() => {
                    record.set_field(field, &answer);
                }
                Some(_) => {}
                None => break,
            }
        }
    }
    Ok(record)
}

fn fill(
    record: &ResumeRecord,
    url: &str,
    values: &ValueArgs,
    browser: &BrowserArgs,
) -> anyhow::Result<FillReport> {
    let mut request = FillRequest::new(url).known_values(record.known_values());
    if let Some(path) = &values.values {
        request = request.user_values(read_json(path)?);
    }

    let filler = FormFiller::new(browser.config());
    let report = if values.interactive {
        filler.run_with_source(&browser.target(), &request, &mut TerminalPrompt)
    } else {
        filler.run_with_source(&browser.target(), &request, &mut NoValues)
    };
    Ok(report)
}

fn print_report(report: &FillReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report.summary());
    }
    if report.status == PassStatus::Failed {
        bail!("form pass failed");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        Commands::Extract { resume, output, model } => {
            let record = extract(resume, model)?;
            let json = serde_json::to_string_pretty(&record)?;
            match output {
                Some(path) => {
                    std::fs::write(path, json).with_context(|| format!("Could not write {}", path.display()))?;
                    log::info!("Record written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Fill { data, url, values, browser } => {
            let record: ResumeRecord = read_json(data)?;
            print_report(&fill(&record, url, values, browser)?, cli.json)?;
        }
        Commands::Scan { data, url, browser } => {
            let record = match data {
                Some(path) => read_json(path)?,
                None => ResumeRecord::default(),
            };
            let request = FillRequest::new(url.as_str()).known_values(record.known_values());
            let fields = FormFiller::new(browser.config()).scan_with(&browser.target(), &request)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&fields)?);
            } else if fields.is_empty() {
                println!("Every field is filled");
            } else {
                for (index, field) in fields.iter().enumerate() {
                    let required = if field.required { ", required" } else { "" };
                    println!("[{}] {} ({}{}): {}", index, field.name, field.kind, required, field.display_label());
                }
            }
        }
        Commands::Run { resume, url, model, values, browser } => {
            let record = extract(resume, model)?;
            print_report(&fill(&record, url, values, browser)?, cli.json)?;
        }
    }

    Ok(())
}
