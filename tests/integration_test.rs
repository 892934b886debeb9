//! End-to-end tests over the assembled pipeline.
//!
//! Tests cover:
//! - Hand-built scenarios scored through the real indicator stack
//! - Walk-forward backtest isolation from future bars
//! - Series assembly through a mock data port (quote merge, resampling, overlays)
//! - The CSV adapter feeding the full pipeline
//! - Watchlist screening and the alert digest

mod common;

use common::*;
use warroom::adapters::csv_adapter::CsvAdapter;
use warroom::cli::load_enriched;
use warroom::domain::assembler::Period;
use warroom::domain::backtest::{run_backtest, BacktestSettings, BacktestSummary};
use warroom::domain::digest::{format_alert, format_daily_report};
use warroom::domain::enriched::{compute, EnrichedBar};
use warroom::domain::error::WarroomError;
use warroom::domain::overlay::{MarginPoint, OverlayPoint, Overlays};
use warroom::domain::quote::LiveQuote;
use warroom::domain::rule_weights::ScoringConfig;
use warroom::domain::scoring::{score, Decision};
use warroom::domain::watchlist::{screen_codes, SkipReason, WatchlistError};
use chrono::Datelike;

mod scenarios {
    use super::*;

    #[test]
    fn breakout_from_a_low_base_is_strong_buy() {
        let bars = bars_from_closes(date(2024, 1, 1), &breakout_closes());
        let series = compute(&bars, None);
        let result = score(&series[..=60], Period::Daily, &ScoringConfig::default()).unwrap();

        // 103 is ~4% of the 99..201 range, so the cross counts as a low-position cross
        assert_eq!(result.delta_for("golden_cross"), Some(4));
        assert_eq!(result.delta_for("breakout"), Some(3));
        assert_eq!(result.delta_for("above_trend_ma"), Some(2));
        assert!(result.score >= 6, "score {}", result.score);
        assert_eq!(result.decision, Decision::StrongBuy);
        assert!(result.stop_loss.is_some());
        assert!(result
            .actionable()
            .any(|f| f.text.starts_with("Donchian breakout above 101.00")));
    }

    #[test]
    fn climactic_selloff_after_a_flat_month() {
        let start = date(2024, 3, 1);
        let mut bars = bars_from_closes(start, &[100.0; 30]);
        bars.push(OhlcvBar {
            date: start + chrono::Duration::days(30),
            open: 100.0,
            high: 101.0,
            low: 95.0,
            close: 96.0,
            volume: 3000,
        });
        let series = compute(&bars, None);
        let result = score(&series, Period::Daily, &ScoringConfig::default()).unwrap();

        assert_eq!(result.delta_for("climactic_selloff"), Some(-4));
        assert_eq!(result.delta_for("below_trend_ma"), Some(-2));
        assert!(result.score <= -3, "score {}", result.score);
        assert_eq!(result.decision, Decision::Sell);
        assert!(result.actionable().any(|f| f.text.starts_with("Climactic sell-off")));
    }

    #[test]
    fn custom_bands_change_classification_only() {
        let bars = bars_from_closes(date(2024, 1, 1), &breakout_closes());
        let series = compute(&bars, None);
        let default = score(&series[..=60], Period::Daily, &ScoringConfig::default()).unwrap();

        let mut strict = ScoringConfig::default();
        strict.thresholds.strong_buy_score = default.score + 1;
        let result = score(&series[..=60], Period::Daily, &strict).unwrap();

        assert_eq!(result.score, default.score);
        assert_eq!(result.breakdown, default.breakdown);
        assert_eq!(result.decision, Decision::Bullish);
    }

    fn plain(i: i64, close: f64) -> EnrichedBar {
        EnrichedBar {
            bar: OhlcvBar {
                date: date(2024, 5, 1) + chrono::Duration::days(i),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            },
            ma5: None,
            ma10: None,
            ma20: None,
            ma60: None,
            vol_ma5: None,
            k: None,
            d: None,
            macd_hist: None,
            bb_upper: None,
            bb_lower: None,
            bias_20: None,
            donchian_high: None,
            donchian_low: None,
            atr: None,
            obv: None,
            obv_ma20: None,
            adx: None,
            rsi: None,
            margin_utilization: 0.0,
            price_position: 50.0,
            overlay: OverlayPoint::default(),
        }
    }

    /// Prior bar under its MA20 with MA5 below; the latest bar crosses both.
    fn reclaim_with_cross() -> (EnrichedBar, EnrichedBar) {
        let mut prev = plain(0, 100.0);
        prev.ma5 = Some(99.0);
        prev.ma20 = Some(100.0);
        let mut curr = plain(1, 103.0);
        curr.ma5 = Some(101.0);
        curr.ma20 = Some(100.0);
        (prev, curr)
    }

    #[test]
    fn decision_bands_through_the_engine() {
        let config = ScoringConfig::default();

        // reclaim +2, golden cross +3, OBV +1
        let (prev, mut curr) = reclaim_with_cross();
        curr.obv = Some(5000.0);
        curr.obv_ma20 = Some(4000.0);
        let result = score(&[prev, curr], Period::Daily, &config).unwrap();
        assert_eq!(result.score, 6);
        assert_eq!(result.decision, Decision::StrongBuy);

        let (prev, curr) = reclaim_with_cross();
        let result = score(&[prev, curr], Period::Daily, &config).unwrap();
        assert_eq!(result.score, 5);
        assert_eq!(result.decision, Decision::Bullish);

        // below MA20 -2, MA20 turning down -1
        let mut prev = plain(0, 100.0);
        prev.ma20 = Some(101.0);
        let mut curr = plain(1, 96.0);
        curr.ma20 = Some(100.0);
        let result = score(&[prev.clone(), curr.clone()], Period::Daily, &config).unwrap();
        assert_eq!(result.score, -3);
        assert_eq!(result.decision, Decision::Sell);

        prev.ma20 = Some(100.0);
        let result = score(&[prev, curr], Period::Daily, &config).unwrap();
        assert_eq!(result.score, -2);
        assert_eq!(result.decision, Decision::Hold);
    }

    #[test]
    fn breakdown_sums_to_score() {
        let bars = bars_from_closes(date(2023, 1, 2), &wave_closes(300));
        let series = compute(&bars, None);
        for end in [30, 61, 120, 250, 299] {
            let result = score(&series[..=end], Period::Daily, &ScoringConfig::default()).unwrap();
            let total: i32 = result.breakdown.iter().map(|(_, d)| d).sum();
            assert_eq!(total, result.score, "cutoff {end}");
        }
    }
}

mod backtest_isolation {
    use super::*;

    #[test]
    fn evaluations_match_scoring_each_prefix() {
        let bars = bars_from_closes(date(2023, 1, 2), &wave_closes(200));
        let series = compute(&bars, None);
        let settings = BacktestSettings {
            lookback_bars: 120,
            score_threshold: 2,
        };
        let config = ScoringConfig::default();
        let result = run_backtest(&series, Period::Daily, &settings, &config).unwrap();

        assert_eq!(result.evaluations.len(), 119);
        assert_eq!(result.evaluations.first().unwrap().index, 80);
        assert_eq!(result.evaluations.last().unwrap().index, 198);

        for eval in &result.evaluations {
            let prefix = compute(&bars[..=eval.index], None);
            let direct = score(&prefix, Period::Daily, &config).unwrap();
            assert_eq!(direct.score, eval.score, "cutoff {}", eval.index);
            assert_eq!(direct.decision, eval.decision);
        }
    }

    #[test]
    fn rewriting_the_future_leaves_past_verdicts_alone() {
        let bars = bars_from_closes(date(2023, 1, 2), &wave_closes(200));
        let mut crashed = bars.clone();
        for b in crashed.iter_mut().skip(150) {
            b.open = 10.0;
            b.high = 11.0;
            b.low = 9.0;
            b.close = 10.0;
        }

        let settings = BacktestSettings {
            lookback_bars: 150,
            score_threshold: 6,
        };
        let config = ScoringConfig::default();
        let a = run_backtest(&compute(&bars, None), Period::Daily, &settings, &config).unwrap();
        let b = run_backtest(&compute(&crashed, None), Period::Daily, &settings, &config).unwrap();

        let before = |evals: &[warroom::domain::backtest::CutoffEvaluation]| {
            evals
                .iter()
                .filter(|e| e.index < 150)
                .cloned()
                .collect::<Vec<_>>()
        };
        assert_eq!(before(&a.evaluations), before(&b.evaluations));
    }

    #[test]
    fn trades_enter_on_the_next_open() {
        let bars = bars_from_closes(date(2024, 1, 1), &breakout_closes());
        let series = compute(&bars, None);
        let settings = BacktestSettings {
            lookback_bars: 20,
            score_threshold: 6,
        };
        let result = run_backtest(&series, Period::Daily, &settings, &ScoringConfig::default()).unwrap();

        let trade = result
            .trades
            .iter()
            .find(|t| t.signal_date == bars[60].date)
            .expect("breakout bar should signal");
        assert_eq!(trade.entry_index, 61);
        assert_eq!(trade.entry_date, bars[61].date);
        assert_eq!(trade.entry_price, bars[61].open);
        assert_eq!(trade.return_5, Some((bars[66].close - bars[61].open) / bars[61].open * 100.0));
        // only eight bars follow the entry
        assert_eq!(trade.return_10, None);
        assert_eq!(trade.return_20, None);

        let summary = BacktestSummary::compute(&result.trades);
        assert_eq!(summary.trades, result.trades.len());
    }

    #[test]
    fn short_series_has_no_cutoffs() {
        let bars = bars_from_closes(date(2024, 1, 1), &[100.0]);
        let result = run_backtest(
            &compute(&bars, None),
            Period::Daily,
            &BacktestSettings::default(),
            &ScoringConfig::default(),
        )
        .unwrap();
        assert!(result.evaluations.is_empty());
        assert!(result.trades.is_empty());
    }
}

mod assembly_pipeline {
    use super::*;

    fn history() -> Vec<OhlcvBar> {
        bars_from_closes(date(2024, 1, 1), &wave_closes(200))
    }

    #[test]
    fn quote_after_last_bar_opens_a_session_bar() {
        let bars = history();
        let as_of = bars.last().unwrap().date.succ_opt().unwrap();
        let port = MockDataPort::new()
            .with_bars("2330", bars.clone())
            .with_quote("2330", LiveQuote::at(150.0));

        let series = load_enriched(&port, "2330", Period::Daily, as_of, true).unwrap();
        assert_eq!(series.len(), bars.len() + 1);
        let last = series.last().unwrap();
        assert_eq!(last.bar.date, as_of);
        assert_eq!(last.bar.close, 150.0);
        assert_eq!(last.bar.volume, 0);
    }

    #[test]
    fn quote_is_ignored_when_disabled() {
        let bars = history();
        let as_of = bars.last().unwrap().date.succ_opt().unwrap();
        let port = MockDataPort::new()
            .with_bars("2330", bars.clone())
            .with_quote("2330", LiveQuote::at(150.0));

        let series = load_enriched(&port, "2330", Period::Daily, as_of, false).unwrap();
        assert_eq!(series.len(), bars.len());
    }

    #[test]
    fn weekly_series_ends_on_fridays_without_overlays() {
        let bars = history();
        let as_of = bars.last().unwrap().date;
        let overlays = Overlays {
            margin: vec![MarginPoint {
                date: bars[0].date,
                balance: 400.0,
                limit: 800.0,
            }],
            ..Overlays::default()
        };
        let port = MockDataPort::new()
            .with_bars("2330", bars)
            .with_overlays("2330", overlays);

        let weekly = load_enriched(&port, "2330", Period::Weekly, as_of, false).unwrap();
        assert!(weekly
            .iter()
            .all(|e| e.bar.date.weekday() == chrono::Weekday::Fri));
        assert!(weekly.iter().all(|e| e.margin_utilization == 0.0));

        let daily = load_enriched(&port, "2330", Period::Daily, as_of, false).unwrap();
        assert_eq!(daily.last().unwrap().margin_utilization, 50.0);
    }

    #[test]
    fn missing_history_is_no_data() {
        let port = MockDataPort::new();
        let err = load_enriched(&port, "9999", Period::Daily, date(2024, 6, 1), true).unwrap_err();
        assert!(matches!(err, WarroomError::NoData { code } if code == "9999"));
    }

    #[test]
    fn data_port_errors_propagate() {
        let port = MockDataPort::new().with_error("2330", "connection refused");
        let err = load_enriched(&port, "2330", Period::Daily, date(2024, 6, 1), true).unwrap_err();
        assert!(matches!(err, WarroomError::Data { .. }));
    }
}

mod csv_pipeline {
    use super::*;

    #[test]
    fn csv_directory_feeds_scoring() {
        let dir = tempfile::TempDir::new().unwrap();
        let bars = bars_from_closes(date(2024, 1, 1), &breakout_closes());
        write_bar_csv(dir.path(), "2330", &bars[..=60]);
        std::fs::write(
            dir.path().join("2330_margin.csv"),
            "date,balance,limit\n2024-01-01,100,1000\n",
        )
        .unwrap();

        let port = CsvAdapter::new(dir.path().to_path_buf());
        let as_of = bars[60].date;
        let series = load_enriched(&port, "2330", Period::Daily, as_of, true).unwrap();
        assert_eq!(series.len(), 61);
        assert_eq!(series.last().unwrap().margin_utilization, 10.0);

        let result = score(&series, Period::Daily, &ScoringConfig::default()).unwrap();
        assert_eq!(result.decision, Decision::StrongBuy);
        assert_eq!(result.delta_for("golden_cross"), Some(4));
    }

    #[test]
    fn screening_skips_thin_and_missing_codes() {
        let dir = tempfile::TempDir::new().unwrap();
        write_bar_csv(
            dir.path(),
            "2330",
            &bars_from_closes(date(2024, 1, 1), &wave_closes(40)),
        );
        write_bar_csv(
            dir.path(),
            "2408",
            &bars_from_closes(date(2024, 1, 1), &wave_closes(10)),
        );
        let port = CsvAdapter::new(dir.path().to_path_buf());

        let codes = vec!["2330".to_string(), "2408".to_string(), "2454".to_string()];
        let screened = screen_codes(&port, codes).unwrap();
        assert_eq!(screened.codes, vec!["2330"]);
        assert_eq!(screened.skipped.len(), 2);
        assert_eq!(
            screened.skipped[0].reason,
            SkipReason::InsufficientBars { bars: 10 }
        );
        assert_eq!(screened.skipped[1].reason, SkipReason::NoData);
    }

    #[test]
    fn screening_fails_when_nothing_survives() {
        let port = MockDataPort::new();
        let err = screen_codes(&port, vec!["2330".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            WarroomError::Watchlist(WatchlistError::AllCodesFailed)
        ));
    }
}

mod digest {
    use super::*;

    #[test]
    fn breakout_produces_an_alert() {
        let bars = bars_from_closes(date(2024, 1, 1), &breakout_closes());
        let series = compute(&bars, None);
        let result = score(&series[..=60], Period::Daily, &ScoringConfig::default()).unwrap();

        let alert = format_alert("2330", &result, series[60].close()).unwrap();
        assert!(alert.starts_with("[2330 signal] STRONG BUY\n"));
        assert!(alert.contains("Golden cross (MA5 over MA20) from a low position"));
        assert!(alert.contains("Close: 103"));
        assert!(alert.contains("Stop-loss: "));

        let report = format_daily_report(bars[60].date, &[alert]).unwrap();
        assert!(report.starts_with("Daily war-room report (2024-03-01)\n"));
    }
}
