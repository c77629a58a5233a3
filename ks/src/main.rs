use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use keystore::cli::{Cli, Command};
use keystore::{FileStorage, LocalStorage};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let path = cli.path.unwrap_or_else(keystore::default_path);
    let storage = FileStorage::open(&path).context("Failed to open storage")?;

    info!("keystore opened at {}", path.display());

    match cli.command {
        Command::Get { key } => match storage.get_item(&key)? {
            Some(value) => println!("{}", value),
            None => {
                eprintln!("{} No value for key: {}", "✗".red(), key);
                std::process::exit(1);
            }
        },
        Command::Set { key, value } => {
            storage.set_item(&key, &value)?;
            println!("{} Set {}", "✓".green(), key.cyan());
        }
        Command::Remove { key } => {
            storage.remove_item(&key)?;
            println!("{} Removed {}", "✓".green(), key.cyan());
        }
        Command::List => {
            let keys = storage.keys()?;
            if keys.is_empty() {
                println!("No keys found");
            } else {
                for key in keys {
                    println!("{}", key);
                }
            }
        }
        Command::Clear => {
            storage.clear()?;
            println!("{} Cleared {}", "✓".green(), path.display());
        }
    }

    Ok(())
}
