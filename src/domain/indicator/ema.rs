//! Exponential Moving Average.
//!
//! α = 2/(n+1), seeded with the SMA of the first n values, then
//! EMA[i] = EMA[i-1] + (V[i] - EMA[i-1]) * α.
//! Output is tail-aligned: index 0 is source position n-1.

use crate::domain::error::CrosstraderError;

pub fn calculate_ema(values: &[f64], period: usize) -> Result<Vec<f64>, CrosstraderError> {
    if values.is_empty() {
        return Err(CrosstraderError::EmptySeries);
    }
    if period == 0 || period > values.len() {
        return Err(CrosstraderError::InvalidPeriod {
            period,
            len: values.len(),
        });
    }

    let alpha = smoothing_factor(period);
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(ema);
    for &value in &values[period..] {
        ema += (value - ema) * alpha;
        out.push(ema);
    }
    Ok(out)
}

pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ema_full_period_is_mean() {
        let values = [4.0, 8.0, 15.0, 16.0, 23.0, 42.0];
        let ema = calculate_ema(&values, values.len()).unwrap();
        assert_eq!(ema.len(), 1);
        assert_relative_eq!(ema[0], 108.0 / 6.0);
    }

    #[test]
    fn ema_hand_computed_terms() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let ema = calculate_ema(&values, 3).unwrap();

        // α = 0.5, seed = mean(1, 2, 3)
        assert_eq!(ema.len(), 8);
        assert_relative_eq!(ema[0], 2.0);
        assert_relative_eq!(ema[1], 2.0 + (4.0 - 2.0) * 0.5);
        assert_relative_eq!(ema[2], 3.0 + (5.0 - 3.0) * 0.5);
        assert_relative_eq!(ema[3], 4.0 + (6.0 - 4.0) * 0.5);
        assert_relative_eq!(ema[7], 9.0);
    }

    #[test]
    fn ema_period_1_tracks_input() {
        let values = [10.0, 20.0, 30.0];
        let ema = calculate_ema(&values, 1).unwrap();
        assert_eq!(ema, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_equal_prices() {
        let ema = calculate_ema(&[100.0; 5], 3).unwrap();
        for v in ema {
            assert_relative_eq!(v, 100.0);
        }
    }

    #[test]
    fn ema_period_0() {
        let err = calculate_ema(&[10.0, 20.0], 0).unwrap_err();
        assert!(matches!(err, CrosstraderError::InvalidPeriod { period: 0, len: 2 }));
    }

    #[test]
    fn ema_period_longer_than_series() {
        let err = calculate_ema(&[10.0, 20.0], 3).unwrap_err();
        assert!(matches!(err, CrosstraderError::InvalidPeriod { period: 3, len: 2 }));
    }

    #[test]
    fn ema_empty_values() {
        let err = calculate_ema(&[], 3).unwrap_err();
        assert!(matches!(err, CrosstraderError::EmptySeries));
    }

    #[test]
    fn ema_smoothing_factor() {
        assert_relative_eq!(smoothing_factor(10), 2.0 / 11.0);
    }
}
