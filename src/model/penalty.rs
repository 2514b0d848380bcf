use rust_decimal::Decimal;

use crate::model::{
    config::FormulaConfig,
    constants::MISSED_SHARE_DECIMALS,
    rank_utils::{ceil_to_usize, clamp_share, floor_dp},
    season::NonFinishCount
};

/// Attendance standing of one athlete at one race index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attendance {
    pub races_counted: usize,
    pub races_attended: usize,
    pub missed_fraction: Decimal,
    pub penalty: Decimal
}

/// # How this works
/// - Every race counts while the season is young (`race_index` within the
///     best-share exemption).
/// - Past that, only the best `ceil(race_index × counted_race_share)` races count,
///     and the athlete is expected to attend that many.
/// - The missed share `1 − attended / counted` picks a penalty band. During
///     the exemption period nobody who has raced is penalised; an athlete
///     known only from a prior-season seed misses everything.
pub fn attendance(config: &FormulaConfig, race_index: usize, races_attended: usize) -> Attendance {
    let races_counted = races_counted(config, race_index);
    let missed_fraction = missed_fraction(config, race_index, races_attended, races_counted);

    Attendance {
        races_counted,
        races_attended,
        missed_fraction,
        penalty: config.penalty_for(missed_fraction)
    }
}

pub fn races_counted(config: &FormulaConfig, race_index: usize) -> usize {
    if race_index <= config.races_exempt_from_best_share {
        return race_index;
    }

    ceil_to_usize(Decimal::from(race_index) * config.counted_race_share).max(1)
}

/// Floored to two places and clamped to [0, 1]. Zero while exempt, one
/// without any attended race.
pub fn missed_fraction(config: &FormulaConfig, race_index: usize, races_attended: usize, races_counted: usize) -> Decimal {
    if races_attended == 0 && races_counted > 0 {
        return Decimal::ONE;
    }

    if race_index <= config.races_exempt_from_best_share || races_counted == 0 {
        return Decimal::ZERO;
    }

    let attended_share = Decimal::from(races_attended) / Decimal::from(races_counted);
    clamp_share(floor_dp(Decimal::ONE - attended_share, MISSED_SHARE_DECIMALS))
}

/// Combined not-started and withdrawn penalty: `1 − (1 − p_ns)(1 − p_wd)`.
pub fn non_finish_penalty(config: &FormulaConfig, counts: NonFinishCount) -> Decimal {
    let not_started = config.not_started_penalty(counts.not_started);
    let withdrawn = config.withdrawn_penalty(counts.withdrawn);

    Decimal::ONE - (Decimal::ONE - not_started) * (Decimal::ONE - withdrawn)
}

/// The frozen end-of-season rank: zeroed when too many races were missed.
pub fn final_rank(config: &FormulaConfig, current_rank: Decimal, missed_fraction: Decimal) -> Decimal {
    if missed_fraction >= config.final_rank_reset_share {
        Decimal::ZERO
    } else {
        current_rank
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        bands::BandTable,
        config::FormulaConfig,
        penalty::{attendance, final_rank, missed_fraction, non_finish_penalty, races_counted},
        season::NonFinishCount
    };
    use rust_decimal::Decimal;

    #[test]
    fn test_every_race_counts_during_exemption() {
        let config = FormulaConfig::default();

        for race_index in 1..=5 {
            assert_eq!(races_counted(&config, race_index), race_index);
        }
    }

    #[test]
    fn test_counted_races_after_exemption() {
        let config = FormulaConfig::default();

        // ceil(6 × 0.6) = 4, ceil(8 × 0.6) = 5, ceil(10 × 0.6) = 6
        assert_eq!(races_counted(&config, 6), 4);
        assert_eq!(races_counted(&config, 8), 5);
        assert_eq!(races_counted(&config, 10), 6);
    }

    #[test]
    fn test_skipping_three_of_five_counted_races() {
        let config = FormulaConfig::default();

        // Race 8 counts 5 races; attending 2 misses 60%
        let standing = attendance(&config, 8, 2);

        assert_eq!(standing.races_counted, 5);
        assert_eq!(standing.missed_fraction, Decimal::new(60, 2));
        assert_eq!(standing.penalty, Decimal::new(30, 2));
    }

    #[test]
    fn test_missed_fraction_is_floored() {
        let config = FormulaConfig::default();

        // 1 − 1/3 = 0.666.. floors to 0.66
        assert_eq!(missed_fraction(&config, 6, 1, 3), Decimal::new(66, 2));
    }

    #[test]
    fn test_missed_fraction_zero_during_exemption() {
        let config = FormulaConfig::default();

        let standing = attendance(&config, 4, 1);

        assert_eq!(standing.missed_fraction, Decimal::ZERO);
        assert_eq!(standing.penalty, Decimal::ZERO);
    }

    #[test]
    fn test_zero_attendance_gets_maximum_penalty() {
        let config = FormulaConfig::default();

        let standing = attendance(&config, 9, 0);

        assert_eq!(standing.missed_fraction, Decimal::ONE);
        assert_eq!(standing.penalty, Decimal::new(50, 2));
    }

    #[test]
    fn test_zero_attendance_penalised_during_exemption() {
        let config = FormulaConfig::default();

        for race_index in 1..=5 {
            let standing = attendance(&config, race_index, 0);

            assert_eq!(standing.missed_fraction, Decimal::ONE);
            assert_eq!(standing.penalty, Decimal::new(50, 2));
        }
    }

    #[test]
    fn test_over_attendance_clamps_to_zero() {
        let config = FormulaConfig::default();

        // Race 10 counts 6 races; attending all 10 would give a negative share
        assert_eq!(missed_fraction(&config, 10, 10, 6), Decimal::ZERO);
    }

    #[test]
    fn test_penalty_bands_cover_every_share() {
        let config = FormulaConfig::default();
        let expected = [(0, 0), (19, 0), (20, 10), (39, 10), (40, 20), (59, 20), (60, 30), (79, 30), (80, 50), (100, 50)];

        for (missed, penalty) in expected {
            assert_eq!(
                config.penalty_for(Decimal::new(missed, 2)),
                Decimal::new(penalty, 2),
                "missed {}%",
                missed
            );
        }

        for missed in 0..=100 {
            assert!(config.missed_race_penalties.band_index(Decimal::new(missed, 2)).is_some());
        }
    }

    #[test]
    fn test_custom_penalty_table() {
        let mut config = FormulaConfig::default();
        config.missed_race_penalties = BandTable::new(&[(Decimal::ZERO, Decimal::ZERO), (Decimal::new(50, 2), Decimal::ONE)]);

        assert_eq!(attendance(&config, 10, 3).penalty, Decimal::ONE);
        assert_eq!(attendance(&config, 10, 4).penalty, Decimal::ZERO);
    }

    #[test]
    fn test_final_rank_reset() {
        let config = FormulaConfig::default();
        let rank = Decimal::new(8512, 2);

        assert_eq!(final_rank(&config, rank, Decimal::new(85, 2)), Decimal::ZERO);
        assert_eq!(final_rank(&config, rank, Decimal::new(80, 2)), Decimal::ZERO);
        assert_eq!(final_rank(&config, rank, Decimal::new(79, 2)), rank);
    }

    #[test]
    fn test_non_finish_penalty_combines_both_tables() {
        let mut config = FormulaConfig::default();
        let counts = NonFinishCount {
            not_started: 2,
            withdrawn: 1
        };

        assert_eq!(non_finish_penalty(&config, counts), Decimal::ZERO);

        config.not_started_penalties = BandTable::new(&[(0, Decimal::ZERO), (2, Decimal::new(10, 2))]);
        config.withdrawn_penalties = BandTable::new(&[(0, Decimal::ZERO), (1, Decimal::new(20, 2))]);

        // 1 − 0.9 × 0.8
        assert_eq!(non_finish_penalty(&config, counts), Decimal::new(28, 2));
        assert_eq!(non_finish_penalty(&config, NonFinishCount::default()), Decimal::ZERO);
    }
}
