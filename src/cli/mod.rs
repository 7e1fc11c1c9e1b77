pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "staywatch")]
#[command(about = "Nightly rental price tracker", long_about = None)]
pub struct Cli {
    /// SQLite database file (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Show the browser window while scraping
    #[arg(long, global = true)]
    pub headed: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply global flags on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref db) = self.db {
            config.store.db_path = Some(db.clone());
        }
        if self.headed {
            config.scraper.headless = false;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape prices for rooms over a window of check-in dates
    Scrape {
        /// Room id to scrape (repeatable); defaults to the stored rooms
        #[arg(short, long = "room")]
        rooms: Vec<String>,

        /// First check-in date (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// Number of consecutive check-in dates
        #[arg(short, long)]
        days: u32,

        /// Listings visited at once; 1 runs them one by one
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Also write the results as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Scrape explicit listing URLs
    ScrapeUrl {
        /// Listing URLs carrying check_in and check_out parameters
        #[arg(required = true)]
        urls: Vec<String>,

        /// Listings visited at once; 1 runs them one by one
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Also write the results as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage the stored room ids
    Rooms {
        #[command(subcommand)]
        action: RoomAction,
    },
    /// List stored prices
    Prices {
        /// Only show this room
        #[arg(short, long)]
        room: Option<String>,
    },
    /// Show recent run summaries
    Runs {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum RoomAction {
    /// Add room ids
    Add {
        #[arg(required = true)]
        room_ids: Vec<String>,
    },
    /// Remove room ids
    Remove {
        #[arg(required = true)]
        room_ids: Vec<String>,
    },
    /// List stored room ids
    List,
}
