use crate::cache::{Cache, CachedSection};
use crate::clock::{Clock, add_days_in, date_start_in};
use crate::config::Config;
use crate::logging;
use crate::section::{Section, SectionQuery, SectionState};
use crate::source::JsonFileSource;
use crate::window::{DateRange, TimelineFilter};
use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use clap::Parser;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "daybook", version, about = "Show upcoming and overdue events grouped by day")]
pub struct Args {
    /// JSON file holding an array of events
    pub events: PathBuf,

    /// Preset range: all, overdue, next7days, next30days, next3months, next6months
    #[arg(long, conflicts_with_all = ["from", "to", "days"])]
    pub filter: Option<TimelineFilter>,

    /// First day to show (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Day after the last one to show (YYYY-MM-DD)
    #[arg(long, conflicts_with = "days")]
    pub to: Option<NaiveDate>,

    /// Number of days to show, starting at --from
    #[arg(long)]
    pub days: Option<i64>,

    /// Only show events whose due time has passed
    #[arg(long)]
    pub overdue: bool,

    /// Restrict to one course id
    #[arg(long)]
    pub course: Option<i64>,

    #[arg(long)]
    pub search: Option<String>,

    /// Maximum number of extra pages to load after the first one
    #[arg(long, default_value_t = 10)]
    pub pages: usize,

    /// Print the last cached result for this query instead of reading events
    #[arg(long)]
    pub offline: bool,

    /// Print the section state as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(short, long, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

pub async fn run() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(args.verbose, args.quiet)?;

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let tz = config.tz()?;
    let options = config.section_options()?;
    let clock = options.clock.clone();
    let query = build_query(&args, &config, clock.as_ref(), &tz)?;
    info!(?query, "resolved query");

    if args.offline {
        let Some(entry) = Cache::load(&query)? else {
            bail!("no cached timeline for this query");
        };
        return print_state(&entry.state, &tz, args.json);
    }

    let source = JsonFileSource::open(&args.events, config.page_size)
        .await
        .with_context(|| format!("failed to read events from {}", args.events.display()))?;
    if source.is_empty() {
        warn!(path = %source.path().display(), "events file holds no events");
    } else {
        info!(path = %source.path().display(), events = source.len(), "opened events file");
    }
    let mut section = Section::fetch_first(source, query.clone(), options).await?;
    let pages = section.load_all(args.pages).await?;
    let state = section.snapshot();
    info!(pages, events = state.event_count(), "timeline ready");

    let entry = CachedSection {
        query,
        saved_at: clock.now(),
        state: (*state).clone(),
    };
    if let Err(e) = Cache::save(&entry) {
        warn!(error = %e, "could not cache timeline");
    }

    print_state(&state, &tz, args.json)
}

pub fn build_query(args: &Args, config: &Config, clock: &dyn Clock, tz: &Tz) -> Result<SectionQuery> {
    let (range, preset_overdue) = match args.filter {
        Some(filter) => {
            let range = filter
                .range(clock)
                .ok_or_else(|| anyhow!("the {filter} range is out of bounds"))?;
            (range, filter.overdue())
        }
        None => {
            let from = match args.from {
                Some(date) => local_day_start(date, tz)?,
                None => clock.today(),
            };
            let to = match (args.to, args.days.or(config.lookahead_days)) {
                (Some(date), _) => Some(local_day_start(date, tz)?),
                (None, Some(days)) => match add_days_in(tz, from, days) {
                    Some(to) => Some(to),
                    None => bail!("{days} days from the start is out of range"),
                },
                (None, None) => None,
            };
            if let Some(to) = to
                && to <= from
            {
                bail!("the range must end after it starts");
            }
            (DateRange { from, to }, false)
        }
    };

    let mut query = SectionQuery::new(range).overdue(preset_overdue || args.overdue || config.overdue);
    if let Some(search) = &args.search {
        query = query.search(search.clone());
    }
    if let Some(course) = args.course {
        query = query.course(course);
    }
    Ok(query)
}

fn local_day_start(date: NaiveDate, tz: &Tz) -> Result<i64> {
    date_start_in(tz, date).ok_or_else(|| anyhow!("{} does not exist in {}", date, tz))
}

fn print_state(state: &SectionState, tz: &Tz, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
    } else {
        print!("{}", render(state, tz));
    }
    Ok(())
}

/// Plain-text listing of the buckets, one heading per day.
pub fn render(state: &SectionState, tz: &Tz) -> String {
    let mut out = String::new();
    if state.buckets.is_empty() {
        out.push_str("No events.\n");
    }
    for bucket in &state.buckets {
        let heading = tz
            .timestamp_opt(bucket.day_timestamp, 0)
            .single()
            .map(|d| d.format("%a %d %b %Y").to_string())
            .unwrap_or_else(|| bucket.day_timestamp.to_string());
        let _ = writeln!(out, "{}", heading);

        for ev in &bucket.events {
            let time = tz
                .timestamp_opt(ev.timesort(), 0)
                .single()
                .map(|d| d.format("%H:%M").to_string())
                .unwrap_or_default();
            let marker = if ev.overdue { " [overdue]" } else { "" };
            let title = ev.icon_title.as_deref().unwrap_or(&ev.module_name);
            let _ = write!(out, "  {}{} {}", time, marker, ev.event.name);
            if !title.is_empty() {
                let _ = write!(out, " ({})", title);
            }
            if let Some(course) = &ev.event.course
                && !course.fullname.is_empty()
            {
                let _ = write!(out, " - {}", course.fullname);
            }
            out.push('\n');
        }
    }
    if state.can_load_more {
        out.push_str("(more events available)\n");
    }
    out
}
