//! Terminal stand-ins for the browser surfaces

use colored::*;
use tracing::info;

use crate::app::{Navigator, Prompter};

/// Prints the URL a new tab would open
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn open_new_context(&self, url: &str) {
        info!(%url, "Opening review page");
        println!("{} {}", "→ open".cyan(), url);
    }
}

/// Prints alerts to stderr
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn alert(&self, message: &str) {
        eprintln!("{} {}", "!".yellow().bold(), message);
    }
}
