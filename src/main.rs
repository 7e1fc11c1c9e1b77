use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use staywatch::app::AppContext;
use staywatch::cli::commands::{self, ScrapeRequest};
use staywatch::cli::{Cli, Commands, RoomAction};
use staywatch::config::Config;
use staywatch::scraper::ChromeLauncher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("staywatch=info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    cli.apply_overrides(&mut config);
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Scrape {
            rooms,
            start,
            days,
            concurrency,
            output,
        } => {
            let request = ScrapeRequest {
                room_ids: rooms,
                start_date: start,
                days,
                concurrency,
            };
            let launcher = ChromeLauncher::new(ctx.config.scraper.clone());
            let report = commands::scrape(&ctx, &launcher, &request).await?;
            commands::print_report(&report);
            if let Some(path) = output {
                commands::export_json(&report.outcomes, &path)?;
            }
        }
        Commands::ScrapeUrl {
            urls,
            concurrency,
            output,
        } => {
            let launcher = ChromeLauncher::new(ctx.config.scraper.clone());
            let report = commands::scrape_urls(&ctx, &launcher, &urls, concurrency).await?;
            commands::print_report(&report);
            if let Some(path) = output {
                commands::export_json(&report.outcomes, &path)?;
            }
        }
        Commands::Rooms { action } => match action {
            RoomAction::Add { room_ids } => commands::add_rooms(&ctx, &room_ids)?,
            RoomAction::Remove { room_ids } => commands::remove_rooms(&ctx, &room_ids)?,
            RoomAction::List => commands::list_rooms(&ctx)?,
        },
        Commands::Prices { room } => {
            commands::list_prices(&ctx, room.as_deref())?;
        }
        Commands::Runs { limit } => {
            commands::list_runs(&ctx, limit)?;
        }
    }

    Ok(())
}
