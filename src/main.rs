mod config;
mod generate;

use anyhow::Result;
use catholic_calendar_core::RomcalBridge;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_CALENDAR, DEFAULT_LOCALE, FeedOverrides};

#[derive(Parser, Debug)]
#[command(name = "catholic-calendar", version)]
#[command(
    about = "Generate an iCalendar feed using the modern Roman Catholic liturgical calendar from romcal"
)]
struct Cli {
    /// Gregorian years to include in the exported calendar
    #[arg(required = true)]
    years: Vec<i32>,

    /// Path to the .ics file that should be produced
    #[arg(short, long)]
    output: PathBuf,

    /// Locale identifier understood by romcal [default: en]
    #[arg(long)]
    locale: Option<String>,

    /// Which romcal calendar to use (e.g. general, unitedStates) [default: general]
    #[arg(long)]
    calendar: Option<String>,

    /// Name exposed to calendar clients [default: General Roman Calendar]
    #[arg(long)]
    name: Option<String>,

    /// Value to use for the PRODID property
    #[arg(long, allow_hyphen_values = true)]
    prodid: Option<String>,

    /// Domain used for generating deterministic event UIDs [default: catholic.calendar]
    #[arg(long)]
    domain: Option<String>,

    /// Time zone identifier exposed via X-WR-TIMEZONE [default: UTC]
    #[arg(long)]
    timezone: Option<String>,

    /// Calendar METHOD property; pass "" to omit it [default: PUBLISH]
    #[arg(long)]
    method: Option<String>,

    /// REFRESH-INTERVAL duration; pass "" to omit it [default: P1D]
    #[arg(long)]
    refresh_interval: Option<String>,

    /// X-PUBLISHED-TTL duration; pass "" to omit it [default: P1D]
    #[arg(long)]
    published_ttl: Option<String>,

    /// Path to the romcal bridge script [default: scripts/romcal_fetch.mjs next to the binary]
    #[arg(long)]
    romcal_script: Option<String>,

    /// Include optional memorials returned by romcal (default)
    #[arg(long, conflicts_with = "exclude_optional")]
    include_optional: bool,

    /// Exclude optional memorials
    #[arg(long)]
    exclude_optional: bool,

    /// Read defaults from this TOML file instead of ~/.config/catholic-calendar/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn include_optional(&self, file: &config::Config) -> bool {
        if self.exclude_optional {
            false
        } else if self.include_optional {
            true
        } else {
            file.include_optional.unwrap_or(true)
        }
    }

    fn bridge(&self, file: &config::Config) -> RomcalBridge {
        let script = self
            .romcal_script
            .as_deref()
            .or(file.romcal_script.as_deref())
            .map(config::expand_path)
            .unwrap_or_else(RomcalBridge::default_script_path);

        let locale = self
            .locale
            .clone()
            .or_else(|| file.locale.clone())
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        let calendar = self
            .calendar
            .clone()
            .or_else(|| file.calendar.clone())
            .unwrap_or_else(|| DEFAULT_CALENDAR.to_string());

        RomcalBridge::new(script)
            .locale(locale)
            .calendar(calendar)
            .include_optional(self.include_optional(file))
    }

    fn feed_overrides(&self) -> FeedOverrides {
        FeedOverrides {
            name: self.name.clone(),
            prodid: self.prodid.clone(),
            domain: self.domain.clone(),
            timezone: self.timezone.clone(),
            method: self.method.clone(),
            refresh_interval: self.refresh_interval.clone(),
            published_ttl: self.published_ttl.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file = config::load_config(cli.config.as_deref())?;
    let feed = file.feed_config(cli.feed_overrides());
    let bridge = cli.bridge(&file);

    tracing::debug!(script = %bridge.script().display(), years = ?cli.years, "generating calendar");

    let path = generate::generate_calendar(&bridge, &cli.years, &feed, &cli.output).await?;
    println!("Calendar written to {}", path.display());

    Ok(())
}
