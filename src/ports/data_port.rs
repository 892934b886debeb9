//! Data access port trait.
//!
//! Implementations supply history, live quotes and overlays for one
//! instrument. A missing quote or overlay is not an error.

use crate::domain::error::WarroomError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::overlay::Overlays;
use crate::domain::quote::LiveQuote;
use chrono::NaiveDate;

pub trait DataPort: Send + Sync {
    /// Bars with `start_date <= date <= end_date`, in ascending date order.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, WarroomError>;

    fn fetch_quote(&self, code: &str) -> Result<Option<LiveQuote>, WarroomError>;

    /// Overlay records dated on or after `start_date`. Margin and revenue also
    /// include the latest report before it, which still applies in the window.
    fn fetch_overlays(&self, code: &str, start_date: NaiveDate) -> Result<Overlays, WarroomError>;

    /// First date, last date and bar count, or `None` when the code has no history.
    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, WarroomError>;
}
