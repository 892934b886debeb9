//! Live quote snapshot supplied by the market-data collaborator.

/// One price level of the order book.
#[derive(Debug, Clone, PartialEq)]
pub struct BookLevel {
    pub price: f64,
    pub volume: u64,
}

/// Intraday snapshot. Not part of the bar history until merged.
///
/// `bids` and `asks` are ordered best-first.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveQuote {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl LiveQuote {
    /// A quote with an empty order book.
    pub fn at(price: f64) -> Self {
        Self {
            price,
            change: 0.0,
            change_percent: 0.0,
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    /// Best ask minus best bid, when both sides are quoted.
    pub fn spread(&self) -> Option<f64> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }
}
