//! Auxiliary overlay series aligned to bar dates.
//!
//! Flows are daily figures: a bar with no reported flow gets zero. Margin and
//! revenue are levels reported intermittently, so the most recent report on or
//! before the bar date carries forward. Before the first report the margin
//! balance and revenue growth are undefined.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Net buying in lots (shares bought minus sold) for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPoint {
    pub date: NaiveDate,
    pub institutional: f64,
    pub foreign: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarginPoint {
    pub date: NaiveDate,
    pub balance: f64,
    pub limit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub yoy_pct: f64,
}

/// Raw overlays as delivered by the chip-data collaborator. Every series is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlays {
    pub flows: Vec<FlowPoint>,
    pub margin: Vec<MarginPoint>,
    pub revenue: Vec<RevenuePoint>,
}

/// Overlay values for a single bar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverlayPoint {
    pub institutional_net: f64,
    pub foreign_net: f64,
    /// `None` until the first margin report.
    pub margin_balance: Option<f64>,
    pub margin_limit: f64,
    pub revenue_yoy: Option<f64>,
}

impl Overlays {
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty() && self.margin.is_empty() && self.revenue.is_empty()
    }

    /// One `OverlayPoint` per bar, in bar order.
    pub fn align(&self, bars: &[OhlcvBar]) -> Vec<OverlayPoint> {
        let flows: BTreeMap<NaiveDate, &FlowPoint> =
            self.flows.iter().map(|p| (p.date, p)).collect();
        let margin: BTreeMap<NaiveDate, &MarginPoint> =
            self.margin.iter().map(|p| (p.date, p)).collect();
        let revenue: BTreeMap<NaiveDate, &RevenuePoint> =
            self.revenue.iter().map(|p| (p.date, p)).collect();

        bars.iter()
            .map(|bar| {
                let mut point = OverlayPoint::default();
                if let Some(flow) = flows.get(&bar.date) {
                    point.institutional_net = flow.institutional;
                    point.foreign_net = flow.foreign;
                }
                if let Some((_, m)) = margin.range(..=bar.date).next_back() {
                    point.margin_balance = Some(m.balance);
                    point.margin_limit = m.limit;
                }
                if let Some((_, r)) = revenue.range(..=bar.date).next_back() {
                    point.revenue_yoy = Some(r.yoy_pct);
                }
                point
            })
            .collect()
    }
}
