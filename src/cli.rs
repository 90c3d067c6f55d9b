//! Command-line harness for trying schemas and catalogs by hand.
//!
//! This is a developer tool only. The library contract is the typed API in
//! `config`, `domain` and `adapters`; nothing there reads flags or
//! environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// formwire developer harness: render form schemas and call catalog endpoints
#[derive(Parser, Debug, Clone)]
#[command(name = "formwire", version, about, long_about = None)]
pub struct Cli {
    /// Path to the settings file
    #[arg(short, long, env = "FORMWIRE_CONFIG", default_value = "formwire.toml", global = true)]
    pub config: PathBuf,

    /// Base URL for relative endpoint URLs
    #[arg(long, env = "FORMWIRE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Bearer token for endpoints that require auth
    #[arg(long, env = "FORMWIRE_TOKEN", global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Render a form schema to HTML
    Render {
        schema: PathBuf,
        /// Write the HTML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a JSON value set against a form schema
    Check {
        schema: PathBuf,
        /// JSON object keyed by control name
        #[arg(short, long)]
        data: String,
    },
    /// List the endpoints of a catalog
    Endpoints { catalog: PathBuf },
    /// Call one endpoint and print the result envelope
    Call {
        catalog: PathBuf,
        endpoint: String,
        /// JSON payload
        #[arg(short, long, default_value = "{}")]
        payload: String,
        /// Serve requests from a fixture file instead of the network
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
}
