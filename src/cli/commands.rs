use std::path::Path;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::app::{AppContext, Result, StaywatchError};
use crate::domain::task::parse_date;
use crate::domain::{NormalizedRecord, RunSummary, ScrapeOutcome, ScrapeTask};
use crate::normalizer::Normalizer;
use crate::planner::plan_tasks;
use crate::scraper::{Launcher, Orchestrator};
use crate::store::Store;

/// A scrape over stored or explicit rooms for a window of check-in dates.
#[derive(Debug, Clone, Default)]
pub struct ScrapeRequest {
    /// Empty means "every stored room"
    pub room_ids: Vec<String>,
    pub start_date: String,
    pub days: u32,
    pub concurrency: Option<usize>,
}

/// Everything one run produced.
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<ScrapeOutcome>,
    pub records: Vec<NormalizedRecord>,
    /// Rows written to the store; 0 when persisting failed.
    pub stored: usize,
    pub summary: RunSummary,
}

pub async fn scrape<L: Launcher>(ctx: &AppContext, launcher: &L, request: &ScrapeRequest) -> Result<RunReport> {
    let start = parse_date(&request.start_date)?;
    if request.days == 0 {
        return Err(StaywatchError::InvalidRequest(
            "days must be greater than zero".into(),
        ));
    }
    let concurrency = resolve_concurrency(ctx, request.concurrency)?;

    let mut room_ids = dedup(request.room_ids.iter().map(|id| id.trim().to_string()));
    room_ids.retain(|id| !id.is_empty());
    if room_ids.is_empty() {
        room_ids = ctx.store.room_ids()?;
    }
    if room_ids.is_empty() {
        return Err(StaywatchError::InvalidRequest(
            "No room ids given and none stored; add some with `staywatch rooms add`".into(),
        ));
    }

    let tasks = plan_tasks(&room_ids, start, request.days, &ctx.config.planner)?;
    info!(
        rooms = room_ids.len(),
        days = request.days,
        "Planned {} tasks",
        tasks.len()
    );

    execute_run(ctx, launcher, room_ids, tasks, concurrency).await
}

pub async fn scrape_urls<L: Launcher>(
    ctx: &AppContext,
    launcher: &L,
    urls: &[String],
    concurrency: Option<usize>,
) -> Result<RunReport> {
    let concurrency = resolve_concurrency(ctx, concurrency)?;
    if urls.is_empty() {
        return Err(StaywatchError::InvalidRequest("No URLs given".into()));
    }

    let tasks = urls
        .iter()
        .map(|url| ScrapeTask::from_url(url))
        .collect::<Result<Vec<_>>>()?;
    let room_ids = dedup(tasks.iter().map(|t| t.room_id.clone()));

    execute_run(ctx, launcher, room_ids, tasks, concurrency).await
}

/// Orchestrate, normalize, persist and summarize one run.
///
/// Only a browser launch failure is returned as an error; the summary is
/// recorded either way. Store failures are logged and do not fail the run.
pub async fn execute_run<L: Launcher>(
    ctx: &AppContext,
    launcher: &L,
    room_ids: Vec<String>,
    tasks: Vec<ScrapeTask>,
    concurrency: usize,
) -> Result<RunReport> {
    let started = Instant::now();
    let mut summary = RunSummary::new(room_ids);

    let orchestrator = Orchestrator::new(ctx.config.scraper.clone().with_concurrency(concurrency));
    let outcomes = match orchestrator.run(launcher, &tasks).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!("Scrape run aborted: {}", e);
            summary.record_fatal(e.to_string());
            summary.finish(started.elapsed());
            record_summary(ctx, &summary);
            return Err(e);
        }
    };

    for outcome in &outcomes {
        summary.record(outcome);
    }

    let records = ctx.normalizer.normalize_all(&outcomes);
    let stored = match ctx.store.upsert_prices(&records) {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to store {} prices: {}", records.len(), e);
            0
        }
    };

    summary.finish(started.elapsed());
    record_summary(ctx, &summary);

    Ok(RunReport {
        outcomes,
        records,
        stored,
        summary,
    })
}

fn resolve_concurrency(ctx: &AppContext, requested: Option<usize>) -> Result<usize> {
    match requested {
        Some(0) => Err(StaywatchError::InvalidRequest(
            "concurrency must be at least 1".into(),
        )),
        Some(c) => Ok(c),
        None => Ok(ctx.config.scraper.concurrency.max(1)),
    }
}

fn record_summary(ctx: &AppContext, summary: &RunSummary) {
    if let Err(e) = ctx.store.record_run(summary) {
        warn!("Failed to record run summary: {}", e);
    }
}

fn dedup<I: IntoIterator<Item = String>>(ids: I) -> Vec<String> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

pub fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        if outcome.is_success() {
            println!(
                "  {} {}  {} + {}",
                outcome.room_id, outcome.date_range, outcome.price_text, outcome.fee_text
            );
        } else {
            println!(
                "  {} {}  {}",
                outcome.room_id,
                outcome.date_range,
                outcome.status.describe()
            );
        }
    }
    print_summary(&report.summary);
    println!("Stored {} prices", report.stored);
}

pub fn print_summary(summary: &RunSummary) {
    println!(
        "Run complete in {}: {} succeeded, {} failed ({} rooms)",
        summary.execution_time_display(),
        summary.successful_count,
        summary.failed_count,
        summary.room_ids.len()
    );
    if !summary.failed_room_ids.is_empty() {
        println!("Rooms with failures: {}", summary.failed_room_ids.join(", "));
    }
    for message in &summary.error_messages {
        eprintln!("  ! {}", message);
    }
}

#[derive(Debug, Serialize)]
struct RoomExport {
    room_id: String,
    host_name: String,
    label: String,
    url: String,
    data: Vec<PriceExport>,
}

#[derive(Debug, Serialize)]
struct PriceExport {
    #[serde(with = "rust_decimal::serde::float_option")]
    price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    fee: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    total: Option<Decimal>,
    date_range: String,
}

/// Write outcomes as JSON grouped by room, one entry per date range.
pub fn export_json(outcomes: &[ScrapeOutcome], path: &Path) -> Result<()> {
    let normalizer = Normalizer::new();
    let mut rooms: Vec<RoomExport> = Vec::new();

    for outcome in outcomes {
        let index = match rooms.iter().position(|r| r.room_id == outcome.room_id) {
            Some(index) => index,
            None => {
                rooms.push(RoomExport {
                    room_id: outcome.room_id.clone(),
                    host_name: outcome.host_name.clone(),
                    label: outcome.label.clone(),
                    url: outcome.url.to_string(),
                    data: Vec::new(),
                });
                rooms.len() - 1
            }
        };

        let date_range = outcome.date_range.to_string();
        let room = &mut rooms[index];
        if room.data.iter().any(|d| d.date_range == date_range) {
            continue;
        }

        let record = normalizer.normalize(outcome);
        room.data.push(PriceExport {
            price: record.as_ref().and_then(|r| r.price),
            fee: record.as_ref().and_then(|r| r.fee),
            total: record.as_ref().and_then(|r| r.total),
            date_range,
        });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&rooms)?)?;
    info!("Wrote {} rooms to {}", rooms.len(), path.display());

    Ok(())
}

pub fn add_rooms(ctx: &AppContext, room_ids: &[String]) -> Result<()> {
    for room_id in room_ids {
        if ctx.store.add_room(room_id)? {
            println!("Added room: {}", room_id);
        } else {
            println!("Room already exists: {}", room_id);
        }
    }
    Ok(())
}

pub fn remove_rooms(ctx: &AppContext, room_ids: &[String]) -> Result<()> {
    for room_id in room_ids {
        if ctx.store.remove_room(room_id)? {
            println!("Removed room: {}", room_id);
        } else {
            println!("Room not found: {}", room_id);
        }
    }
    Ok(())
}

pub fn list_rooms(ctx: &AppContext) -> Result<()> {
    let rooms = ctx.store.room_ids()?;

    if rooms.is_empty() {
        println!("No rooms");
        return Ok(());
    }

    for room_id in rooms {
        println!("{}", room_id);
    }
    Ok(())
}

pub fn list_prices(ctx: &AppContext, room_id: Option<&str>) -> Result<()> {
    let records = ctx.store.get_prices(room_id)?;

    if records.is_empty() {
        println!("No prices");
        return Ok(());
    }

    let show = |value: Option<Decimal>| value.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
    for record in records {
        println!(
            "{} {}  price {}  fee {}  total {}",
            record.room_id,
            record.date_range,
            show(record.price),
            show(record.fee),
            show(record.total)
        );
    }
    Ok(())
}

pub fn list_runs(ctx: &AppContext, limit: usize) -> Result<()> {
    let runs = ctx.store.recent_runs(limit)?;

    if runs.is_empty() {
        println!("No runs");
        return Ok(());
    }

    for run in runs {
        println!(
            "#{} {}  {} ok, {} failed, {}",
            run.id,
            run.recorded_at.format("%Y-%m-%d %H:%M"),
            run.successful_count,
            run.failed_count,
            run.execution_time
        );
        if !run.failed_room_ids.is_empty() {
            println!("  failed rooms: {}", run.failed_room_ids.join(", "));
        }
        if !run.html_sidebar.is_empty() {
            println!("  {} sidebar snapshots kept", run.html_sidebar.len());
        }
    }
    Ok(())
}
