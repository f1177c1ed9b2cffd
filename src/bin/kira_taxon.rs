use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_taxon::client::{Resolution, TaxonomyClient};
use kira_taxon::config::ConfigLoader;
use kira_taxon::domain::TaxonId;
use kira_taxon::error::TaxonError;
use kira_taxon::output::{JsonOutput, OutputMode, render_record, render_resolution};
use kira_taxon::preprocess::{DefaultPreprocessor, NamePreprocessor};

#[derive(Parser)]
#[command(name = "kira-taxon")]
#[command(about = "Resolve organism names to NCBI taxonomy ids and lineages")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print the search term each raw name is normalized to")]
    Normalize(NormalizeArgs),
    #[command(about = "Resolve organism names to taxon records")]
    Resolve(ResolveArgs),
    #[command(about = "Fetch the lineage of a taxonomy id")]
    Lineage(LineageArgs),
}

#[derive(Args)]
struct NormalizeArgs {
    #[arg(required = true)]
    names: Vec<String>,
}

#[derive(Args, Clone)]
struct ClientArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ResolveArgs {
    #[arg(required = true)]
    names: Vec<String>,

    #[arg(long = "rank")]
    ranks: Vec<String>,

    #[command(flatten)]
    client: ClientArgs,
}

#[derive(Args)]
struct LineageArgs {
    taxid: String,

    #[command(flatten)]
    client: ClientArgs,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(err) = report.downcast_ref::<TaxonError>() {
                return ExitCode::from(map_exit_code(err));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &TaxonError) -> u8 {
    match error {
        TaxonError::NoMatch(_) | TaxonError::Ambiguous { .. } => 2,
        TaxonError::EntrezHttp(_) | TaxonError::EntrezStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Normalize(args) => {
            for name in &args.names {
                println!("{name}\t{}", DefaultPreprocessor.preprocess(name));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve(args) => run_resolve(args),
        Commands::Lineage(args) => run_lineage(args),
    }
}

fn output_mode(args: &ClientArgs) -> OutputMode {
    if args.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}

fn run_resolve(args: ResolveArgs) -> miette::Result<ExitCode> {
    let mut config = ConfigLoader::resolve(args.client.config.as_deref())?;
    if !args.ranks.is_empty() {
        config = config.with_accepted_ranks(args.ranks.clone());
    }
    let mut client = TaxonomyClient::new(config)?;
    let mode = output_mode(&args.client);

    for name in &args.names {
        let resolution = client.match_name(name)?;
        match mode {
            OutputMode::Json => JsonOutput::print_resolution(name, &resolution).into_diagnostic()?,
            OutputMode::Text => print!("{}", render_resolution(name, &resolution)),
        }
    }

    let unresolved = client.unresolved();
    if unresolved.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    for (name, resolution) in &unresolved {
        let reason = match resolution {
            Resolution::Ambiguous { .. } => "needs disambiguation",
            _ => "check spelling",
        };
        eprintln!("unresolved: {name} ({reason})");
    }
    Ok(ExitCode::from(2))
}

fn run_lineage(args: LineageArgs) -> miette::Result<ExitCode> {
    let id: TaxonId = args.taxid.parse()?;
    let config = ConfigLoader::resolve(args.client.config.as_deref())?;
    let client = TaxonomyClient::new(config)?;
    let record = client.lineage_for_id(id)?;
    match output_mode(&args.client) {
        OutputMode::Json => JsonOutput::print_record(&record).into_diagnostic()?,
        OutputMode::Text => print!("{}", render_record(&record)),
    }
    Ok(ExitCode::SUCCESS)
}
