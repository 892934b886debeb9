//! CLI definition and dispatch.

use chrono::{Duration, NaiveDate, Utc};
use clap::{ArgAction, Parser, Subcommand};
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::assembler::{merge, resample, session_date, Period};
use crate::domain::backtest::{run_backtest, BacktestSettings, BacktestSummary};
use crate::domain::config_validation::{resolve_timezone, validate_config, DEFAULT_WATCHLIST};
use crate::domain::digest::{format_alert, format_daily_report};
use crate::domain::enriched::{compute, EnrichedBar};
use crate::domain::error::WarroomError;
use crate::domain::rule_weights::{RuleWeights, ScoringConfig, ScoringThresholds};
use crate::domain::scoring::score;
use crate::domain::watchlist::{parse_codes, screen_codes};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportPort, ScanRow};

#[derive(Parser, Debug)]
#[command(name = "warroom", about = "Multi-factor stock scoring and walk-forward backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score the latest bar of one instrument
    Score {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(long, default_value = "daily")]
        period: Period,
        /// Ignore any live quote file
        #[arg(long)]
        no_quote: bool,
    },
    /// Replay the scoring engine over recent history
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(long)]
        lookback: Option<usize>,
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<i32>,
    },
    /// Score every watchlist code and print the alert digest
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated codes, overriding [watchlist] codes
        #[arg(long)]
        codes: Option<String>,
    },
    /// Validate a configuration file and report data coverage
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the stderr log subscriber. Reports go to stdout.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Score {
            config,
            code,
            period,
            no_quote,
        } => run_score(&config, &code, period, !no_quote),
        Command::Backtest {
            config,
            code,
            lookback,
            threshold,
        } => run_backtest_command(&config, &code, lookback, threshold),
        Command::Scan { config, codes } => run_scan(&config, codes.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, WarroomError> {
    tracing::info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

pub fn resolve_data_path(config: &dyn ConfigPort) -> Result<PathBuf, WarroomError> {
    config
        .get_string("data", "path")
        .filter(|p| !p.trim().is_empty())
        .map(|p| PathBuf::from(p.trim()))
        .ok_or_else(|| WarroomError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })
}

/// Watchlist codes: the override if given, else `[watchlist] codes`, else the default list.
pub fn resolve_codes(
    override_codes: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, WarroomError> {
    let raw = match override_codes {
        Some(codes) => codes.to_string(),
        None => config
            .get_string("watchlist", "codes")
            .unwrap_or_else(|| DEFAULT_WATCHLIST.to_string()),
    };
    Ok(parse_codes(&raw)?)
}

fn read_i32(config: &dyn ConfigPort, section: &str, key: &str, default: i32) -> Result<i32, WarroomError> {
    let value = config.get_int(section, key, default as i64);
    i32::try_from(value).map_err(|_| WarroomError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: "out of range".into(),
    })
}

macro_rules! read_weights {
    ($config:expr, $target:expr, $($field:ident),+ $(,)?) => {
        $(
            $target.$field = read_i32(
                $config,
                "scoring",
                concat!("weight_", stringify!($field)),
                $target.$field,
            )?;
        )+
    };
}

macro_rules! read_levels {
    ($config:expr, $target:expr, $($field:ident),+ $(,)?) => {
        $(
            $target.$field = $config.get_double("scoring", stringify!($field), $target.$field);
        )+
    };
}

/// Rule weights (`weight_<rule>`) and thresholds from `[scoring]`, over the canonical defaults.
pub fn build_scoring_config(config: &dyn ConfigPort) -> Result<ScoringConfig, WarroomError> {
    let mut weights = RuleWeights::default();
    read_weights!(
        config,
        weights,
        revenue_growth,
        revenue_decline,
        above_trend_ma,
        below_trend_ma,
        trend_ma_falling,
        golden_cross,
        golden_cross_low,
        below_ma60,
        below_ma60_low,
        climactic_selloff,
        bearish_engulfing,
        kd_cross_up,
        kd_cross_up_bearish,
        kd_cross_down,
        macd_turn_up,
        breakout,
        breakout_high,
        bollinger_break,
        connected_buy_high,
        connected_buy_stretched,
        connected_buy,
        ignition,
        first_inflow,
        outflow,
        margin_heavy,
        margin_elevated,
        divergent_positioning,
        falling_knife,
        obv_confirm,
        volume_divergence,
        no_trend,
        trend_strengthening,
        overheated,
        hot,
        oversold,
    );

    let mut thresholds = ScoringThresholds::default();
    thresholds.strong_buy_score =
        read_i32(config, "scoring", "strong_buy_score", thresholds.strong_buy_score)?;
    thresholds.bullish_score = read_i32(config, "scoring", "bullish_score", thresholds.bullish_score)?;
    thresholds.sell_score = read_i32(config, "scoring", "sell_score", thresholds.sell_score)?;
    read_levels!(
        config,
        thresholds,
        revenue_yoy_pct,
        low_position,
        high_position,
        climactic_drop_pct,
        climactic_volume_mult,
        kd_cross_up_below,
        kd_cross_down_above,
        connected_buy_bias,
        large_outflow_lots,
        margin_heavy_pct,
        margin_elevated_pct,
        foreign_sell_lots,
        margin_jump_lots,
        volume_divergence_ratio,
        adx_no_trend,
        adx_trending,
        adx_strong,
        bias_overheated,
        bias_hot,
        bias_oversold,
        stop_atr_mult,
    );
    thresholds.floor_no_trend_penalty = config.get_bool(
        "scoring",
        "floor_no_trend_penalty",
        thresholds.floor_no_trend_penalty,
    );

    Ok(ScoringConfig {
        weights,
        thresholds,
    })
}

pub fn build_backtest_settings(config: &dyn ConfigPort) -> Result<BacktestSettings, WarroomError> {
    let defaults = BacktestSettings::default();
    let lookback = config.get_int("backtest", "lookback_bars", defaults.lookback_bars as i64);
    let lookback_bars = usize::try_from(lookback)
        .ok()
        .filter(|v| *v >= 2)
        .ok_or_else(|| WarroomError::ConfigInvalid {
            section: "backtest".into(),
            key: "lookback_bars".into(),
            reason: "must be at least 2".into(),
        })?;
    Ok(BacktestSettings {
        lookback_bars,
        score_threshold: read_i32(config, "backtest", "score_threshold", defaults.score_threshold)?,
    })
}

/// Calendar days of history to request per period.
fn history_days(period: Period) -> i64 {
    match period {
        Period::Daily => 730,
        Period::Weekly => 365 * 5,
        Period::Monthly => 365 * 12,
    }
}

/// Fetch, merge, resample and enrich one instrument's series.
///
/// Overlays are daily figures, so they are only attached to daily series.
pub fn load_enriched(
    data_port: &dyn DataPort,
    code: &str,
    period: Period,
    as_of: NaiveDate,
    use_quote: bool,
) -> Result<Vec<EnrichedBar>, WarroomError> {
    let start = as_of - Duration::days(history_days(period));
    let history = data_port.fetch_ohlcv(code, start, as_of)?;
    if history.is_empty() {
        return Err(WarroomError::NoData {
            code: code.to_string(),
        });
    }

    let quote = if use_quote {
        data_port.fetch_quote(code)?
    } else {
        None
    };
    if let Some(q) = &quote {
        tracing::debug!(code, price = q.price, spread = ?q.spread(), "live quote");
    }
    let merged = merge(history, quote.as_ref(), as_of);
    let bars = resample(&merged, period);

    let overlays = if period == Period::Daily {
        Some(data_port.fetch_overlays(code, start)?)
    } else {
        None
    };
    tracing::info!(code, bars = bars.len(), %period, "series assembled");
    Ok(compute(&bars, overlays.as_ref()))
}

fn run_score(config_path: &PathBuf, code: &str, period: Period, use_quote: bool) -> Result<(), WarroomError> {
    let config = load_config(config_path)?;
    let scoring = build_scoring_config(&config)?;
    let tz = resolve_timezone(&config)?;
    let data_port = CsvAdapter::new(resolve_data_path(&config)?);
    let as_of = session_date(Utc::now(), tz);

    let code = code.trim().to_uppercase();
    let series = load_enriched(&data_port, &code, period, as_of, use_quote)?;
    let result = score(&series, period, &scoring)?;
    let close = series.last().map(|e| e.close()).unwrap_or_default();

    let mut out = io::stdout().lock();
    TextReportAdapter.write_score(&mut out, &code, close, &result)?;
    out.flush()?;
    Ok(())
}

fn run_backtest_command(
    config_path: &PathBuf,
    code: &str,
    lookback: Option<usize>,
    threshold: Option<i32>,
) -> Result<(), WarroomError> {
    let config = load_config(config_path)?;
    let scoring = build_scoring_config(&config)?;
    let mut settings = build_backtest_settings(&config)?;
    if let Some(n) = lookback {
        if n < 2 {
            return Err(WarroomError::ConfigInvalid {
                section: "backtest".into(),
                key: "lookback_bars".into(),
                reason: "must be at least 2".into(),
            });
        }
        settings.lookback_bars = n;
    }
    if let Some(t) = threshold {
        settings.score_threshold = t;
    }

    let tz = resolve_timezone(&config)?;
    let data_port = CsvAdapter::new(resolve_data_path(&config)?);
    let as_of = session_date(Utc::now(), tz);

    let code = code.trim().to_uppercase();
    let series = load_enriched(&data_port, &code, Period::Daily, as_of, false)?;
    let result = run_backtest(&series, Period::Daily, &settings, &scoring)?;
    let summary = BacktestSummary::compute(&result.trades);
    tracing::info!(
        code = %code,
        cutoffs = result.evaluations.len(),
        trades = summary.trades,
        "backtest complete"
    );

    let mut out = io::stdout().lock();
    TextReportAdapter.write_backtest(&mut out, &code, &result, &summary)?;
    out.flush()?;
    Ok(())
}

fn run_scan(config_path: &PathBuf, override_codes: Option<&str>) -> Result<(), WarroomError> {
    let config = load_config(config_path)?;
    let scoring = build_scoring_config(&config)?;
    let tz = resolve_timezone(&config)?;
    let data_port = CsvAdapter::new(resolve_data_path(&config)?);
    let as_of = session_date(Utc::now(), tz);

    let codes = resolve_codes(override_codes, &config)?;
    let screened = screen_codes(&data_port, codes)?;

    // instruments share nothing, so each is scored on its own worker
    let rows: Vec<ScanRow> = screened
        .codes
        .par_iter()
        .filter_map(|code| {
            let scored = load_enriched(&data_port, code, Period::Daily, as_of, true).and_then(
                |series| {
                    let close = series.last().map(|e| e.close()).unwrap_or_default();
                    score(&series, Period::Daily, &scoring).map(|result| ScanRow {
                        code: code.clone(),
                        close,
                        result,
                    })
                },
            );
            match scored {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::warn!(code = %code, error = %e, "scan failed for code");
                    None
                }
            }
        })
        .collect();

    let mut out = io::stdout().lock();
    TextReportAdapter.write_scan(&mut out, &rows)?;

    let alerts: Vec<String> = rows
        .iter()
        .filter_map(|row| format_alert(&row.code, &row.result, row.close))
        .collect();
    if let Some(report) = format_daily_report(as_of, &alerts) {
        writeln!(out)?;
        writeln!(out, "{}", report)?;
    }
    out.flush()?;
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), WarroomError> {
    let config = load_config(config_path)?;
    build_scoring_config(&config)?;
    let settings = build_backtest_settings(&config)?;
    let tz = resolve_timezone(&config)?;
    let data_path = resolve_data_path(&config)?;
    let codes = resolve_codes(None, &config)?;

    eprintln!("Configuration is valid");
    eprintln!("  timezone: {}", tz);
    eprintln!(
        "  backtest: lookback {} bars, threshold {}",
        settings.lookback_bars, settings.score_threshold
    );

    let data_port = CsvAdapter::new(data_path);
    for code in &codes {
        match data_port.get_data_range(code)? {
            Some((first, last, count)) => println!("{}: {} bars, {} to {}", code, count, first, last),
            None => println!("{}: no data found", code),
        }
    }
    Ok(())
}
