//! Kelly criterion position sizing

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Kelly criterion calculator for trades with asymmetric average win/loss
#[derive(Debug, Clone)]
pub struct KellyCalculator {
    /// Average return of a winning trade (0.10 = 10%)
    pub average_win: Decimal,
    /// Average loss of a losing trade as a positive fraction
    pub average_loss: Decimal,
}

impl KellyCalculator {
    /// Create a new Kelly calculator
    pub fn new(average_win: Decimal, average_loss: Decimal) -> Self {
        Self {
            average_win,
            average_loss,
        }
    }

    /// Fraction of capital to commit at the given win rate.
    ///
    /// With payoff ratio `b = average_win / average_loss`:
    /// `f* = (p * b - q) / b`. Never negative.
    pub fn fraction(&self, win_rate: Decimal) -> Decimal {
        if self.average_loss <= dec!(0) || self.average_win <= dec!(0) {
            return dec!(0);
        }
        let b = self.average_win / self.average_loss;
        let p = win_rate;
        let q = Decimal::ONE - p;
        ((p * b - q) / b).max(dec!(0))
    }
}

impl Default for KellyCalculator {
    fn default() -> Self {
        Self::new(dec!(0.10), dec!(0.08))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelly_fraction() {
        let calc = KellyCalculator::default();
        // b = 1.25, f = (0.6 * 1.25 - 0.4) / 1.25 = 0.28
        assert_eq!(calc.fraction(dec!(0.6)), dec!(0.28));
    }

    #[test]
    fn test_kelly_no_edge() {
        let calc = KellyCalculator::new(dec!(0.10), dec!(0.10));
        assert_eq!(calc.fraction(dec!(0.5)), dec!(0));
        assert_eq!(calc.fraction(dec!(0.3)), dec!(0));
    }

    #[test]
    fn test_kelly_degenerate_inputs() {
        let calc = KellyCalculator::new(dec!(0.10), dec!(0));
        assert_eq!(calc.fraction(dec!(0.9)), dec!(0));
    }
}
