// ⚙️ Configuration - command line with environment fallbacks
//
// Every option can also come from the environment (`POI_CATALOG`,
// `POI_LOG_LEVEL`, `POI_SELECTION_MODE`), which is how the map editor
// launches the picker.

use crate::catalog::{default_taxonomy, load_taxonomy};
use crate::selection::SelectionMode;
use crate::taxonomy::Taxonomy;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// POI taxonomy browser and type picker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON catalog to load (built-in demo catalog when omitted)
    #[arg(short, long, env = "POI_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, env = "POI_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the taxonomy
    Browse {
        /// Print JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Pick a POI type interactively
    Select {
        /// Screen to start on: `category` or `poi-type`
        #[arg(long, env = "POI_SELECTION_MODE", default_value = "category", value_parser = parse_mode)]
        mode: SelectionMode,

        /// Category a `poi-type` session is scoped to
        #[arg(long)]
        category: Option<String>,

        /// Explicit type keys for a `poi-type` session (comma separated)
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        /// Key of the type the feature currently has
        #[arg(long)]
        current: Option<String>,
    },
}

fn parse_mode(raw: &str) -> Result<SelectionMode, String> {
    raw.parse::<SelectionMode>().map_err(|e| e.to_string())
}

impl Args {
    /// Subcommand to run; `select` on the category screen by default
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Select {
            mode: SelectionMode::CategoryScreen,
            category: None,
            types: Vec::new(),
            current: None,
        })
    }

    /// Taxonomy from the configured catalog file or the built-in one
    pub fn load_taxonomy(&self) -> Result<Taxonomy> {
        match &self.catalog {
            Some(path) => load_taxonomy(path),
            None => default_taxonomy(),
        }
    }
}
