//! Curriculum Ingest CLI - preview and import pasted curriculum data
//!
//! # Main Commands
//!
//! ```bash
//! curriculum-ingest preview dump.sql                # Parse and show the preview batch as JSON
//! curriculum-ingest preview plan.csv --schema semesters --regulation-id 3
//! curriculum-ingest import subjects.json           # Parse and submit to the curriculum API
//! curriculum-ingest serve                          # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! curriculum-ingest tokenize "'O''Brien', 3, NULL"  # Show how a value list is split
//! curriculum-ingest aliases --schema subjects      # Show accepted column spellings
//! ```

use clap::{Args, Parser, Subcommand};
use curriculum_ingest::api::logs::LOG_BROADCASTER;
use curriculum_ingest::parser::{coerce_token, scan_tokens};
use curriculum_ingest::{
    describe_aliases, ingest, read_input_file, Config, HttpImportClient, ImportContext, ImportSession,
    ImportState, IngestOptions, IngestResult, InputFormat, TargetSchema,
};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "curriculum-ingest")]
#[command(about = "Turn pasted SQL, CSV or JSON into subject and semester bulk imports", long_about = None)]
struct Cli {
    /// Do not echo pipeline logs to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse input and print the preview batch
    Preview {
        /// Input file, or `-` for stdin
        input: PathBuf,

        #[command(flatten)]
        ingest: IngestArgs,

        /// Print the batch as CSV instead of JSON
        #[arg(long)]
        csv: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse input and submit the batch to the curriculum API
    Import {
        /// Input file, or `-` for stdin
        input: PathBuf,

        #[command(flatten)]
        ingest: IngestArgs,

        /// Override INGEST_API_URL
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Split a SQL value list into typed tokens
    Tokenize {
        /// Text between the parentheses of VALUES (...)
        values: String,
    },

    /// Show accepted source column names per canonical field
    Aliases {
        #[arg(short, long, default_value = "subjects")]
        schema: TargetSchema,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: INGEST_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
struct IngestArgs {
    /// Target schema: subjects or semesters
    #[arg(short, long, default_value = "subjects")]
    schema: TargetSchema,

    /// Input format: auto, sql, csv or json
    #[arg(short, long, default_value = "auto")]
    format: InputFormat,

    /// Regulation id for rows that do not carry one
    #[arg(long)]
    regulation_id: Option<i64>,

    /// Department id for rows that do not carry one
    #[arg(long)]
    department_id: Option<i64>,

    /// Semester number for rows that do not carry one
    #[arg(long)]
    semester: Option<i64>,

    /// Fail on the first row missing a required field instead of skipping it
    #[arg(long)]
    strict: bool,
}

impl IngestArgs {
    fn options(&self, config: &Config) -> IngestOptions {
        IngestOptions {
            schema: self.schema,
            format: self.format,
            context: ImportContext::new(self.regulation_id, self.department_id, self.semester),
            strict: self.strict || config.strict,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if cli.quiet {
        LOG_BROADCASTER.set_echo(false);
    }

    let result = match Config::from_env() {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Preview {
            input,
            ingest,
            csv,
            output,
        } => cmd_preview(&input, &ingest.options(&config), csv, output.as_deref()),

        Commands::Import {
            input,
            ingest,
            api_url,
        } => {
            let config = match api_url {
                Some(url) => Config {
                    api_url: url.trim_end_matches('/').to_string(),
                    ..config
                },
                None => config,
            };
            cmd_import(&input, &ingest.options(&config), &config).await
        }

        Commands::Tokenize { values } => cmd_tokenize(&values),

        Commands::Aliases { schema } => {
            print!("{}", describe_aliases(schema));
            Ok(())
        }

        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            curriculum_ingest::server::start_server(config).await?;
            Ok(())
        }
    }
}

fn read_input(input: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    let decoded = read_input_file(input)?;
    eprintln!("Reading {} ({})", input.display(), decoded.encoding);
    Ok(decoded.text)
}

fn run_ingest(input: &Path, options: &IngestOptions) -> Result<IngestResult, Box<dyn std::error::Error>> {
    let text = read_input(input)?;
    let result = ingest(&text, options)?;
    eprintln!("{}", result.batch.summary());
    Ok(result)
}

fn cmd_preview(
    input: &Path,
    options: &IngestOptions,
    csv: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = run_ingest(input, options)?;

    let rendered = if csv {
        result.batch.to_csv()?
    } else {
        serde_json::to_string_pretty(&result.batch)?
    };
    write_output(&rendered, output)
}

async fn cmd_import(input: &Path, options: &IngestOptions, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(input)?;
    let client = HttpImportClient::from_config(config)?;

    let mut session = ImportSession::new();
    if let ImportState::Failed { error, .. } = session.parse(&text, options)? {
        return Err(error.to_string().into());
    }
    if let Some(batch) = session.batch() {
        eprintln!("{}", batch.summary());
    }

    match session.submit_with(&client).await? {
        ImportState::Imported { count } => {
            eprintln!("Done: {} record(s) imported", count);
            Ok(())
        }
        ImportState::Failed { error, .. } => Err(error.to_string().into()),
        other => Err(format!("unexpected session state: {}", other.name()).into()),
    }
}

fn cmd_tokenize(values: &str) -> Result<(), Box<dyn std::error::Error>> {
    for (i, token) in scan_tokens(values).iter().enumerate() {
        let kind = if token.quoted { "quoted" } else { "bare" };
        println!("[{}] {:<6} {}", i, kind, coerce_token(token));
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
