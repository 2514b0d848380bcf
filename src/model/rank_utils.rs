use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

/// Arithmetic mean; None for an empty slice.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }

    let sum: Decimal = values.iter().sum();
    Some(sum / Decimal::from(values.len()))
}

/// Mean of the `n` highest values (or of all values when fewer are available).
pub fn top_n_mean(values: &[Decimal], n: usize) -> Option<Decimal> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.cmp(a));
    sorted.truncate(n);

    mean(&sorted)
}

pub fn floor_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToNegativeInfinity)
}

pub fn ceil_to_usize(value: Decimal) -> usize {
    value.ceil().to_usize().unwrap_or(0)
}

pub fn clamp_share(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use crate::model::rank_utils::{ceil_to_usize, clamp_share, floor_dp, mean, top_n_mean};
    use rust_decimal::Decimal;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(
            mean(&[Decimal::from(3000), Decimal::from(3100), Decimal::from(3200)]),
            Some(Decimal::from(3100))
        );
    }

    #[test]
    fn test_top_n_mean_picks_highest() {
        let values = [Decimal::from(10), Decimal::from(40), Decimal::from(20), Decimal::from(30)];

        assert_eq!(top_n_mean(&values, 2), Some(Decimal::from(35)));
        assert_eq!(top_n_mean(&values, 10), Some(Decimal::from(25)));
        assert_eq!(top_n_mean(&values, 0), None);
    }

    #[test]
    fn test_floor_dp() {
        assert_eq!(floor_dp(Decimal::new(6666, 4), 2), Decimal::new(66, 2));
        assert_eq!(floor_dp(Decimal::new(6, 1), 2), Decimal::new(60, 2));
    }

    #[test]
    fn test_ceil_to_usize() {
        assert_eq!(ceil_to_usize(Decimal::new(42, 1)), 5);
        assert_eq!(ceil_to_usize(Decimal::from(6)), 6);
    }

    #[test]
    fn test_clamp_share() {
        assert_eq!(clamp_share(Decimal::new(-25, 2)), Decimal::ZERO);
        assert_eq!(clamp_share(Decimal::new(125, 2)), Decimal::ONE);
        assert_eq!(clamp_share(Decimal::new(40, 2)), Decimal::new(40, 2));
    }
}
