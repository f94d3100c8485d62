//! `vamdc` — query VAMDC database nodes from the command line.
//!
//! Subcommands:
//!
//! - **`query`** — send a free-text query and print the XSAMS document.
//! - **`species`** — list every species the node holds.
//! - **`transitions`** — radiative transitions of one species.
//! - **`species-data`** — everything the node holds for one species.
//! - **`head`** — the node's statistics for a query, as JSON.
//! - **`last-modified`** — when the data behind a query last changed.
//!
//! The node is given either by registry identifier (`--node`, resolved
//! through the JSON node list in `VAMDC_NODES_FILE` / `--nodes-file`) or by
//! base address (`--url`).

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use vamdc::SPECIES_QUERY;
use vamdc_client::{
    get_species_data, get_transitions, Client, ClientConfig, Method, QueryResult, Request,
    RequestError, RequestOptions,
};

/// vamdc — VAMDC node query CLI
#[derive(Parser)]
#[command(name = "vamdc", version, about, long_about = None)]
struct Cli {
    /// Registry identifier or name of the node to query.
    #[arg(long, global = true, value_name = "ID", conflicts_with = "url")]
    node: Option<String>,

    /// Base address of the node, for nodes that are not in the node list.
    #[arg(long, global = true, value_name = "BASE_URL")]
    url: Option<String>,

    /// JSON node list used to resolve --node. Overrides VAMDC_NODES_FILE.
    #[arg(long, global = true, value_name = "PATH")]
    nodes_file: Option<PathBuf>,

    /// Seconds to wait for the node. Overrides VAMDC_TIMEOUT_SECS.
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Do not validate TLS certificates.
    #[arg(long, global = true)]
    insecure: bool,

    /// Write the document to FILE instead of stdout.
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a query and print the returned document.
    Query {
        /// Query text, e.g. "SELECT ALL WHERE AtomSymbol = 'Fe'".
        text: String,

        /// Send with GET from the start instead of POST.
        #[arg(long)]
        get: bool,
    },

    /// List all species of the node.
    Species,

    /// List radiative transitions of a species.
    Transitions {
        /// Species id: an integer or "<db>-<id>".
        species_id: String,
    },

    /// Fetch all data for a species.
    ///
    /// Tries the node-local species id first, then the VAMDC species id.
    SpeciesData {
        #[arg(long, value_name = "ID")]
        species_id: Option<String>,

        #[arg(long, value_name = "VAMDC_ID")]
        vamdc_species_id: Option<String>,
    },

    /// Print the node's statistics headers for a query as JSON.
    Head {
        /// Query text; defaults to the species listing.
        text: Option<String>,
    },

    /// Print the last-modified time of the data behind a query.
    LastModified {
        /// Query text; defaults to the species listing.
        text: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vamdc_client=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().unwrap_or_else(|e| fatal(&e.to_string()));
    if let Some(secs) = cli.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if cli.insecure {
        config.verify_https = false;
    }
    if cli.nodes_file.is_some() {
        config.nodes_file = cli.nodes_file.clone();
    }

    let mut request = open_request(&cli, config);

    match cli.command {
        Command::Query { ref text, get } => {
            request.set_query(text.as_str());
            let mut options = RequestOptions::default();
            if get {
                options = options.with_method(Method::GET);
            }
            let outcome = request.execute(options);
            emit(&request, outcome, cli.output.as_ref());
        }

        Command::Species => {
            let outcome = request.get_species();
            emit(&request, outcome, cli.output.as_ref());
        }

        Command::Transitions { ref species_id } => {
            // Plain integers are accepted as-is; anything else goes through
            // prefix stripping.
            let outcome = match species_id.parse::<i64>() {
                Ok(id) => get_transitions(&mut request, id),
                Err(_) => get_transitions(&mut request, species_id.as_str()),
            };
            emit(&request, outcome, cli.output.as_ref());
        }

        Command::SpeciesData {
            ref species_id,
            ref vamdc_species_id,
        } => {
            if species_id.is_none() && vamdc_species_id.is_none() {
                fatal("species-data needs --species-id and/or --vamdc-species-id");
            }
            let outcome = get_species_data(
                &mut request,
                species_id.as_deref(),
                vamdc_species_id.as_deref(),
            );
            emit(&request, outcome, cli.output.as_ref());
        }

        Command::Head { ref text } => {
            request.set_query(text.as_deref().unwrap_or(SPECIES_QUERY));
            let headers = request
                .head_request(None)
                .unwrap_or_else(|e| fatal(&e.to_string()));
            let map: serde_json::Map<String, serde_json::Value> = headers
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&map).unwrap_or_else(|e| fatal(&e.to_string()))
            );
        }

        Command::LastModified { ref text } => {
            request.set_query(text.as_deref().unwrap_or(SPECIES_QUERY));
            match request.get_last_modified() {
                Ok(Some(t)) => println!("{}", t.to_rfc3339()),
                Ok(None) => println!("unknown"),
                Err(RequestError::NoContent) => {
                    eprintln!("vamdc: node has no content for this query");
                    process::exit(1);
                }
                Err(e) => fatal(&e.to_string()),
            }
        }
    }
}

/// Build a session for `--url` or `--node`.
fn open_request(cli: &Cli, config: ClientConfig) -> Request {
    if let Some(url) = &cli.url {
        let mut request = Request::new(&config);
        request.set_base_url(url);
        return request;
    }

    let Some(node) = &cli.node else {
        fatal("either --node or --url is required");
    };
    let client = Client::from_config(config).unwrap_or_else(|e| fatal(&e.to_string()));
    client
        .request(node.as_str())
        .unwrap_or_else(|e| fatal(&e.to_string()))
}

/// Write a query result to `output` (or stdout), or report why there is none.
fn emit(
    request: &Request,
    outcome: Result<Option<QueryResult<String>>, RequestError>,
    output: Option<&PathBuf>,
) {
    let result = match outcome {
        Ok(Some(result)) => result,
        Ok(None) => {
            eprintln!(
                "vamdc: no result (status {} {})",
                request.status(),
                request.reason()
            );
            process::exit(1);
        }
        Err(e) => fatal(&e.to_string()),
    };

    let written = match output {
        Some(path) => fs::write(path, &result.content),
        None => io::stdout().write_all(&result.content),
    };
    if let Err(e) = written {
        fatal(&format!("failed to write document: {e}"));
    }
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("vamdc: {}", msg);
    process::exit(2);
}
