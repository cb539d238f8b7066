use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use matchtags::api::{ApiRequest, Cors, Handler};
use matchtags::canonical::resolve_with_mode;
use matchtags::config::Config;
use matchtags::generator::{GenerateError, MatchRequest, ScoreValue, ScorerList, TagGenerator};
use matchtags::logging;

/// matchtags - video tag generator for football highlight uploads
#[derive(Parser)]
#[command(name = "matchtags")]
#[command(about = "Generate deduplicated, length-bounded tags for football highlight videos")]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run the endpoint handler on a raw request body and print the response body
    Invoke(InvokeCommand),
    /// Generate tags from command-line arguments
    Generate(GenerateCommand),
    /// Show how a team name resolves against the nickname directory
    Resolve(ResolveCommand),
}

#[derive(Parser)]
struct InvokeCommand {
    /// Request method
    #[arg(short, long, default_value = "POST")]
    method: String,

    /// File holding the JSON body, or `-` for stdin
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    body: PathBuf,
}

#[derive(Parser)]
struct GenerateCommand {
    /// Home team name
    #[arg(long)]
    home: String,

    /// Away team name
    #[arg(long)]
    away: String,

    #[arg(long)]
    competition: Option<String>,

    #[arg(long, value_name = "N")]
    home_score: Option<u32>,

    #[arg(long, value_name = "N")]
    away_score: Option<u32>,

    /// Goal scorer, repeatable (minute markers like 23' are stripped)
    #[arg(long = "scorer", value_name = "NAME")]
    scorers: Vec<String>,

    /// Language of the category words (es, en)
    #[arg(long, default_value = "es")]
    lang: String,

    /// Character budget for the joined tag string
    #[arg(long, value_name = "N", default_value_t = 500)]
    max_len: usize,

    /// Match date, YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    date: Option<String>,

    /// Free-text context notes
    #[arg(long)]
    notes: Option<String>,

    /// Print the full JSON result instead of the joined string
    #[arg(long)]
    json: bool,

    /// Skip the text-generation tier even if LLM_API_KEY is set
    #[arg(long)]
    no_llm: bool,
}

#[derive(Parser)]
struct ResolveCommand {
    /// Team name as typed
    #[arg(value_name = "NAME")]
    name: String,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match &cli.command {
        Commands::Invoke(cmd) => handle_invoke(cmd),
        Commands::Generate(cmd) => handle_generate(cmd),
        Commands::Resolve(cmd) => handle_resolve(cmd),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let exit_code = if is_user_error(&e) { 1 } else { 2 };
            eprintln!("Error: {e:#}");
            std::process::exit(exit_code);
        }
    }
}

/// Validation failures are the caller's fault; everything else is ours.
fn is_user_error(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<GenerateError>(), Some(GenerateError::Validation(_)))
}

fn load_config() -> Result<Config> {
    Config::from_env().context("Invalid configuration")
}

fn build_generator(config: &Config, with_llm: bool) -> Result<TagGenerator> {
    let cache = config
        .directory_cache()
        .context("Invalid NICKNAMES_SOURCE")?;
    let mut generator = TagGenerator::new(Arc::new(cache), config.tag_policy());

    if with_llm {
        if let Some(text_generator) = config
            .text_generator()
            .context("Failed to configure text generator")?
        {
            generator = generator.with_text_generator(text_generator);
        }
    }

    Ok(generator)
}

/// Exit code 0 for 2xx, 1 for 4xx, 2 otherwise.
fn handle_invoke(cmd: &InvokeCommand) -> Result<i32> {
    let body = read_body(&cmd.body)?;
    let config = load_config()?;
    let handler = Handler::new(
        build_generator(&config, true)?,
        Cors {
            allow_origin: config.cors_allow_origin.clone(),
        },
    );

    let response = handler.handle(&ApiRequest::new(&cmd.method, body));
    if let Some(body) = &response.body {
        println!("{body}");
    }

    Ok(match response.status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    })
}

fn read_body(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read request body from stdin")?;
        Ok(body)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request body from {}", path.display()))
    }
}

fn handle_generate(cmd: &GenerateCommand) -> Result<i32> {
    let config = load_config()?;
    let generator = build_generator(&config, !cmd.no_llm)?;

    let request = MatchRequest {
        competition: cmd.competition.clone(),
        home_score: cmd.home_score.map(ScoreValue::from),
        away_score: cmd.away_score.map(ScoreValue::from),
        scorers: (!cmd.scorers.is_empty()).then(|| ScorerList::from(cmd.scorers.clone())),
        lang: cmd.lang.clone(),
        max_len: cmd.max_len,
        match_date: cmd.date.clone(),
        context_notes: cmd.notes.clone(),
        ..MatchRequest::new(cmd.home.clone(), cmd.away.clone())
    };

    let result = generator.generate(&request)?;
    if cmd.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{json}");
    } else {
        println!("{}", result.tags);
    }
    Ok(0)
}

fn handle_resolve(cmd: &ResolveCommand) -> Result<i32> {
    let config = load_config()?;
    let cache = config
        .directory_cache()
        .context("Invalid NICKNAMES_SOURCE")?;
    let directory = cache.get();

    let (resolution, mode) = resolve_with_mode(&cmd.name, &directory);
    println!("{} (short: {}) [{mode}]", resolution.canonical, resolution.short);
    Ok(0)
}
