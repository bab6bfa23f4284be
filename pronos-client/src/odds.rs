//! Decimal odds of single and combined predictions

use std::fmt;

/// Reads odds as typed by a user. Accepts a comma as decimal separator.
pub fn parse_odds(text: &str) -> Option<f64> {
    let text = text.trim().replace(',', ".");
    match text.parse::<f64>() {
        Ok(odds) if odds.is_finite() && odds > 0.0 => Some(odds),
        _ => None,
    }
}

/// Product of the odds of every leg of a prediction.
///
/// Zero when there is no valid odds at all.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CombinedOdds(f64);

impl CombinedOdds {
    pub fn of<I>(odds: I) -> CombinedOdds
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut valid = odds
            .into_iter()
            .flatten()
            .filter(|o| o.is_finite() && *o > 0.0)
            .peekable();
        if valid.peek().is_none() {
            return CombinedOdds(0.0);
        }
        CombinedOdds(valid.product())
    }

    pub fn from_texts<'a, I>(texts: I) -> CombinedOdds
    where
        I: IntoIterator<Item = &'a str>,
    {
        CombinedOdds::of(texts.into_iter().map(parse_odds))
    }

    /// Exact product
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Product rounded to two decimals, as displayed
    pub fn rounded(&self) -> f64 {
        (self.0 * 100.0).round() / 100.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl fmt::Display for CombinedOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
    }
}
