use std::{fs, path::PathBuf, time::Duration};

use structopt::StructOpt;
use sudslib::{KeywordError, LibraryOptions, SudsBackend, SudsLibrary};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod run;
mod table;

use run::Runner;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to read keyword table")]
    IoError(#[from] std::io::Error),

    #[error("Line {line}: {message}")]
    Table { line: usize, message: String },

    #[error("Line {line}: variable '${{{name}}}' is not set")]
    UnknownVariable { line: usize, name: String },

    #[error("Line {line}: keyword '{keyword}' failed")]
    Keyword {
        line: usize,
        keyword: String,
        #[source]
        source: KeywordError,
    },

    #[error("Line {line}: {message}")]
    Assertion { line: usize, message: String },
}

#[derive(StructOpt)]
struct Args {
    /// Network timeout in seconds for every client created.
    #[structopt(short, long, default_value = "90")]
    timeout: u64,

    /// Log as JSON lines.
    #[structopt(long)]
    json: bool,

    /// Pipe-separated keyword table to run.
    table: PathBuf,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    init_logging(args.json);

    let source = fs::read_to_string(&args.table)?;
    let steps = table::parse(&source)?;

    let curdir = args
        .table
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| ".".to_owned(), |parent| parent.display().to_string());

    let library = SudsLibrary::with_backend(
        SudsBackend,
        LibraryOptions {
            timeout: Some(Duration::from_secs(args.timeout)),
            ..LibraryOptions::default()
        },
    );

    let mut runner = Runner::new(library, &curdir);
    if let Err(error) = runner.run_all(&steps) {
        tracing::error!(error = %error, cause = ?std::error::Error::source(&error), "Table failed");
        return Err(error);
    }

    tracing::info!(
        steps = steps.len(),
        clients = runner.library().client_count(),
        "Table passed"
    );
    Ok(())
}
