//! CLI argument parsing for keystore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ks")]
#[command(author, version, about = "Client-local key/value storage", long_about = None)]
pub struct Cli {
    /// Path to the storage file (default: <data dir>/npswidget/storage.json)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value stored under a key
    Get {
        #[arg(required = true)]
        key: String,
    },

    /// Store a value under a key
    Set {
        #[arg(required = true)]
        key: String,

        #[arg(required = true)]
        value: String,
    },

    /// Remove a key
    Remove {
        #[arg(required = true)]
        key: String,
    },

    /// List all keys
    List,

    /// Remove every key
    Clear,
}
