use std::io::{self, Write};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use expire_align::{ExpiryCalculator, IntervalType};

#[derive(Parser)]
#[command(name = "expire-align", version, about = "Compute grid-aligned cache expiration times")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the next aligned expiry (or several chained ones)
    Next {
        /// Grid spacing, in units of --unit
        #[arg(short, long, allow_negative_numbers = true)]
        interval: i64,

        /// Alignment unit: second, minute or hour
        #[arg(short, long)]
        unit: String,

        /// Reference time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,

        /// IANA timezone whose wall clock the grid aligns to
        #[arg(long, default_value = "UTC")]
        tz: String,

        /// Number of chained expiries to print
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the boundary grid for an interval
    Grid {
        /// Grid spacing, in units of --unit
        #[arg(short, long, allow_negative_numbers = true)]
        interval: i64,

        /// Alignment unit: second, minute or hour
        #[arg(short, long)]
        unit: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct ExpiryOutput {
    expire_at: String,
    expire_at_utc: String,
    minutes_until: f64,
}

#[derive(Serialize)]
struct GridOutput<'a> {
    interval: i64,
    interval_type: IntervalType,
    boundaries: &'a [u32],
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Next {
            interval,
            unit,
            at,
            tz,
            count,
            json,
        } => cmd_next(interval, &unit, at.as_deref(), &tz, count, json),
        Commands::Grid {
            interval,
            unit,
            json,
        } => cmd_grid(interval, &unit, json),
    }
}

fn cmd_next(interval: i64, unit: &str, at: Option<&str>, tz: &str, count: usize, json: bool) -> Result<()> {
    let interval_type: IntervalType = unit.parse()?;
    let timezone: Tz = tz
        .parse()
        .map_err(|_| anyhow!("invalid timezone: '{tz}'"))?;

    let reference = at
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&timezone))
                .with_context(|| format!("invalid reference time: '{s}'"))
        })
        .transpose()?;

    debug!(interval, %interval_type, timezone = tz, count, "Computing expiry schedule");

    let calc = ExpiryCalculator::new().with_timezone(timezone);
    let schedule = calc.upcoming(interval, interval_type, reference, count)?;

    let outputs: Vec<ExpiryOutput> = schedule
        .iter()
        .map(|entry| ExpiryOutput {
            expire_at: entry.expire_at.to_rfc3339(),
            expire_at_utc: entry.expire_at.with_timezone(&Utc).to_rfc3339(),
            minutes_until: entry.minutes_until,
        })
        .collect();

    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &outputs)?;
        writeln!(stdout)?;
    } else {
        for out in &outputs {
            writeln!(stdout, "{}\t{:.3}", out.expire_at, out.minutes_until)?;
        }
    }
    Ok(())
}

fn cmd_grid(interval: i64, unit: &str, json: bool) -> Result<()> {
    let interval_type: IntervalType = unit.parse()?;
    let calc = ExpiryCalculator::new();
    let grid = calc.cache().grid(interval, interval_type)?;

    let mut stdout = io::stdout().lock();
    if json {
        let out = GridOutput {
            interval,
            interval_type,
            boundaries: &grid[..],
        };
        serde_json::to_writer_pretty(&mut stdout, &out)?;
        writeln!(stdout)?;
    } else {
        let line: Vec<String> = grid.iter().map(u32::to_string).collect();
        writeln!(stdout, "{}", line.join(","))?;
    }
    Ok(())
}
