// Reference time may not drift above this multiple of the winner's time
pub const REFERENCE_TIME_CAP_PERCENT: i64 = 115;

// Finishers averaged into the reference time, by finisher count
pub const FINISHER_REFERENCE_BANDS: [(usize, usize); 4] = [(0, 2), (5, 3), (7, 4), (9, 5)];

// Peers averaged into the comparative rank, by participant count (withdrawals included).
// None takes every participant.
pub const COMPARATIVE_REFERENCE_BANDS: [(usize, Option<usize>); 4] = [(0, None), (6, Some(5)), (7, Some(6)), (9, Some(7))];

// Missed-race share (percent) -> penalty (percent)
pub const MISSED_RACE_PENALTY_BANDS: [(i64, i64); 5] = [(0, 0), (20, 10), (40, 20), (60, 30), (80, 50)];

pub const RACES_EXEMPT_FROM_BEST_SHARE: usize = 5;
pub const RACES_BEFORE_COMPARATIVE_RANK: usize = 2;
pub const COUNTED_RACE_SHARE_PERCENT: i64 = 60;
pub const FINAL_RANK_RESET_SHARE_PERCENT: i64 = 80;

pub const MASS_START_COEFFICIENT_PERCENT: i64 = 100;
pub const INDIVIDUAL_START_COEFFICIENT_PERCENT: i64 = 50;

// Decimal places kept for displayed ranks and for the floored missed-race share
pub const DISPLAY_DECIMALS: u32 = 2;
pub const MISSED_SHARE_DECIMALS: u32 = 2;

// Race number up to which forest and sprint ranks keep every race and skip the comparative rank
pub const FOREST_RACES_EXEMPT_FROM_BEST_SHARE: usize = 4;
pub const FOREST_RACES_BEFORE_COMPARATIVE_RANK: usize = 2;
pub const SPRINT_RACES_EXEMPT_FROM_BEST_SHARE: usize = 3;
pub const SPRINT_RACES_BEFORE_COMPARATIVE_RANK: usize = 2;

// Non-finished entries over the season -> penalty (percent). No penalty unless configured.
pub const NON_FINISH_PENALTY_BANDS: [(usize, i64); 1] = [(0, 0)];
