//! Technical indicator library
//!
//! Pure functions over close/high/low/volume series, oldest first. Nothing
//! here panics or returns an error: insufficient history degrades to a
//! documented neutral value.

mod moving_average;
mod oscillators;
mod snapshot;
mod trend;
mod volatility;

pub use moving_average::{ema, ema_series, macd, sma, Macd};
pub use oscillators::{rsi, stochastic, williams_r, Stochastic};
pub use snapshot::IndicatorSnapshot;
pub use trend::{
    classify_volume, identify_trend, identify_window_trend, TrendSignal, VolumeSignal,
    HEAVY_VOLUME_RATIO,
};
pub use volatility::{
    atr, bollinger_bands, return_volatility, returns, std_dev, BollingerBands,
};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn short_inputs_stay_finite(
            values in proptest::collection::vec(1.0f64..100_000.0, 0..25),
            period in 1usize..60,
        ) {
            prop_assert!(rsi(&values, period).is_finite());
            prop_assert!(sma(&values, period).is_finite());
            prop_assert!(ema(&values, period).is_finite());
            let bands = bollinger_bands(&values, period, 2.0);
            prop_assert!(bands.upper.is_finite() && bands.lower.is_finite());
        }

        #[test]
        fn rsi_stays_in_range(values in proptest::collection::vec(1.0f64..1_000.0, 0..80)) {
            let value = rsi(&values, 14);
            prop_assert!((0.0..=100.0).contains(&value));
        }
    }
}
