use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use crate::client::{ClipClient, ServerResponse, ServiceError};
use crate::config::Config;
use crate::credentials::{ApiKey, KeyStore};
use crate::input::{self, InputSource};
use crate::logging;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const NO_KEY_MESSAGE: &str = "No API key set. Set with netclip --key [key]. \
If you don't have a key, first call netclip --register to obtain one.";

#[derive(Parser, Debug)]
#[command(
    name = "netclip",
    about = "Pipe text in to save a clip; run without input to fetch the last one",
    disable_version_flag = true
)]
struct Cli {
    /// Set the API key (replaces any stored key)
    #[arg(long, value_name = "KEY")]
    key: Option<String>,

    /// Generate a new API key for this machine
    #[arg(long)]
    register: bool,

    /// Show version
    #[arg(short = 'V', long)]
    version: bool,

    /// Fetch the last clip even when stdin is not a terminal
    #[arg(long)]
    get: bool,

    /// Base URL of the clip service
    #[arg(long, env = "NETCLIP_URL", value_name = "URL")]
    url: Option<String>,

    /// Where the API key is stored [default: ~/.netclip_key]
    #[arg(long, env = "NETCLIP_KEY_FILE", value_name = "PATH")]
    key_file: Option<PathBuf>,

    /// Request timeout in seconds (no timeout by default)
    #[arg(
        long,
        env = "NETCLIP_TIMEOUT",
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: Option<u64>,

    /// Log requests to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        Config::resolve(
            self.url.as_deref(),
            self.key_file.as_deref(),
            self.timeout.map(Duration::from_secs),
        )
    }
}

/// How an invocation ended, independent of any error it propagated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Nothing useful could be done, e.g. no API key to act with.
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
        }
    }
}

// -- helpers --

/// `--help` output is a success; any usage error is a plain failure (exit 1).
fn parse_error_outcome(err: &clap::Error) -> Outcome {
    if err.use_stderr() {
        Outcome::Failure
    } else {
        Outcome::Success
    }
}

/// Remote failures are advisory: log them and carry on with an empty envelope.
fn or_empty(result: Result<ServerResponse, ServiceError>) -> ServerResponse {
    result.unwrap_or_else(|e| {
        let e = anyhow::Error::new(e);
        error!("{e:#}");
        ServerResponse::default()
    })
}

// -- command handlers --

fn handle_register(store: &KeyStore, client: &ClipClient, out: &mut impl Write) -> Result<Outcome> {
    if let Some(key) = store.read() {
        writeln!(
            out,
            "You have already registered this machine. Your API key is: {key}"
        )?;
        return Ok(Outcome::Success);
    }

    let response = or_empty(client.register());
    let key = match ApiKey::new(&response.message) {
        Ok(key) if response.is_success() => key,
        _ if response.message.is_empty() => {
            writeln!(out, "Registration failed.")?;
            return Ok(Outcome::Failure);
        }
        _ => {
            writeln!(out, "Registration failed: {}", response.message)?;
            return Ok(Outcome::Failure);
        }
    };

    // The server already issued the key, so a local write failure only warrants a log line.
    if let Err(e) = store.write(&key) {
        error!(
            path = %store.path().display(),
            error = %e,
            "failed to save API key; set it later with --key"
        );
    }
    writeln!(out, "Your API key is: {key}")?;
    Ok(Outcome::Success)
}

fn handle_set_key(store: &KeyStore, raw: &str, out: &mut impl Write) -> Result<Outcome> {
    let key = ApiKey::new(raw).context("invalid --key value")?;
    store
        .write(&key)
        .with_context(|| format!("failed to write API key to {}", store.path().display()))?;
    writeln!(out, "Your API key has been set.")?;
    Ok(Outcome::Success)
}

fn handle_transfer<R: BufRead>(
    client: &ClipClient,
    key: &ApiKey,
    input: InputSource<R>,
    out: &mut impl Write,
) -> Result<Outcome> {
    let result = match input {
        InputSource::Interactive => client.fetch_clip(key),
        InputSource::Piped(reader) => {
            let clip = input::read_clip(reader)?;
            client.save_clip(key, &clip)
        }
    };
    writeln!(out, "{}", or_empty(result).message)?;
    Ok(Outcome::Success)
}

// -- main dispatch --

fn execute<R: BufRead>(cli: Cli, input: InputSource<R>, out: &mut impl Write) -> Result<Outcome> {
    if cli.version {
        writeln!(out, "{VERSION}")?;
        return Ok(Outcome::Success);
    }

    let config = cli.config()?;
    let store = KeyStore::new(config.key_file());
    let client = ClipClient::new(&config);

    if cli.register {
        return handle_register(&store, &client, out);
    }
    if let Some(raw) = cli.key.as_deref() {
        return handle_set_key(&store, raw, out);
    }

    let Some(key) = store.read() else {
        writeln!(out, "{NO_KEY_MESSAGE}")?;
        return Ok(Outcome::Failure);
    };

    let input = if cli.get {
        InputSource::Interactive
    } else {
        input
    };
    handle_transfer(&client, &key, input, out)
}

/// Parse CLI arguments and perform a single netclip invocation.
pub fn run<I, T>(args: I) -> Result<ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            err.print().context("failed to print usage")?;
            return Ok(parse_error_outcome(&err).into());
        }
    };
    logging::init(cli.verbose);

    let stdout = std::io::stdout();
    let outcome = execute(cli, InputSource::stdin(), &mut stdout.lock())?;
    Ok(outcome.into())
}
