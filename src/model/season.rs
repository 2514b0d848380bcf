use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    model::{
        config::FormulaConfig,
        error::StateError,
        penalty::{attendance, final_rank, non_finish_penalty},
        rank_tracker::RankTracker,
        rank_utils::top_n_mean,
        scorer::{GroupScore, RaceScorer},
        structures::{
            athlete::AthleteId,
            current_rank::{CurrentRankState, PriorSeasonRank, RankSource},
            race::Race,
            race_result::RaceStatus,
            ranking_snapshot::RankingSnapshot
        }
    },
    utils::progress_utils::progress_bar
};

/// Records and races dropped along the way.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionTally {
    pub records: usize,
    pub groups: usize,
    pub races: usize,
    /// Excluded records per reason
    pub reasons: BTreeMap<String, usize>
}

/// Entries that never reached a placement.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NonFinishCount {
    pub not_started: usize,
    pub withdrawn: usize
}

/// The accumulator threaded through the season, one race at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeasonState {
    pub race_index: usize,
    pub tracker: RankTracker,
    pub last_race: Option<(String, NaiveDate)>,
    pub final_race_id: Option<String>,
    pub seen_race_ids: BTreeSet<String>,
    pub tally: ExclusionTally,
    pub non_finishes: BTreeMap<AthleteId, NonFinishCount>
}

/// One race's output: the rank table after it plus the scoring detail behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRace {
    pub snapshot: RankingSnapshot,
    pub groups: Vec<GroupScore>
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonResult {
    pub races: Vec<ProcessedRace>,
    pub state: SeasonState
}

impl SeasonResult {
    pub fn snapshots(&self) -> impl Iterator<Item = &RankingSnapshot> {
        self.races.iter().map(|r| &r.snapshot)
    }

    pub fn latest(&self) -> Option<&RankingSnapshot> {
        self.races.last().map(|r| &r.snapshot)
    }

    /// The snapshot of the designated final race, if the season got that far.
    pub fn final_snapshot(&self) -> Option<&RankingSnapshot> {
        self.snapshots().find(|s| s.is_final)
    }
}

pub struct SeasonAggregator<'a> {
    config: &'a FormulaConfig,
    scorer: RaceScorer<'a>
}

impl<'a> SeasonAggregator<'a> {
    pub fn new(config: &'a FormulaConfig) -> SeasonAggregator<'a> {
        SeasonAggregator {
            config,
            scorer: RaceScorer::new(config)
        }
    }

    pub fn initial_state(&self, prior: &[PriorSeasonRank]) -> SeasonState {
        let mut state = SeasonState::default();
        let seeded = state.tracker.seed(prior);

        if !prior.is_empty() {
            info!(seeded, offered = prior.len(), "Seeded prior season final ranks");
        }

        state
    }

    /// Runs the whole season from scratch. Races must already be in date order.
    pub fn run(&self, races: &[Race], prior: &[PriorSeasonRank]) -> Result<SeasonResult, StateError> {
        let bar = progress_bar(races.len() as u64, "Processing races".to_string());
        let mut processed = Vec::with_capacity(races.len());
        let mut state = self.initial_state(prior);

        for race in races {
            let (next, output) = self.process_race(state, race)?;
            state = next;
            processed.extend(output);

            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }

        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }

        info!(
            races = processed.len(),
            athletes = state.tracker.len(),
            excluded_records = state.tally.records,
            excluded_groups = state.tally.groups,
            excluded_races = state.tally.races,
            "Season processed"
        );
        for (reason, count) in &state.tally.reasons {
            info!(reason = %reason, count, "Excluded records");
        }

        Ok(SeasonResult {
            races: processed,
            state
        })
    }

    /// # Season transition
    ///
    /// Consumes the state as of the previous race and returns the state
    /// after `race`, plus the race's snapshot.
    ///
    /// 1. Check ordering: strictly later date, unseen id, nothing after the final race.
    /// 2. Score the race against the ranks as they stood before it.
    /// 3. Append each athlete's race rank to their history.
    /// 4. Recompute every known athlete: counted races, missed share, penalties,
    ///     and current rank as the penalised mean of their best counted ranks.
    ///     A prior-season seed is one of those ranks on the first race only.
    /// 5. On the final race, freeze the final rank.
    ///
    /// A race without a single scorable category is excluded and does not
    /// advance the race index; the returned output is then None, unless it is
    /// the final race: the standing ranks are frozen as final ranks instead.
    pub fn process_race(
        &self,
        mut state: SeasonState,
        race: &Race
    ) -> Result<(SeasonState, Option<ProcessedRace>), StateError> {
        Self::check_order(&state, race)?;

        state.seen_race_ids.insert(race.id.clone());
        state.last_race = Some((race.id.clone(), race.date));
        Self::count_non_finishes(&mut state, race);

        let race_index = state.race_index + 1;
        let score = self.scorer.score_race(race, race_index, &state.tracker);

        state.tally.records += score.excluded_records.len();
        state.tally.groups += score.skipped_groups.len();
        for excluded in &score.excluded_records {
            *state.tally.reasons.entry(excluded.reason.to_string()).or_default() += 1;
        }

        if score.athlete_ranks.is_empty() {
            warn!(race_id = %race.id, date = %race.date, "Excluding race without scorable results");
            state.tally.races += 1;

            if !race.is_final {
                return Ok((state, None));
            }

            let snapshot = self.close_season(&mut state, race);
            return Ok((
                state,
                Some(ProcessedRace {
                    snapshot,
                    groups: Vec::new()
                })
            ));
        }

        state.race_index = race_index;
        state.tracker.record_race(&race.id, race.date, &score.athlete_ranks);

        let states: Vec<CurrentRankState> = state
            .tracker
            .athletes()
            .map(|athlete| {
                let non_finishes = state.non_finishes.get(athlete).copied().unwrap_or_default();
                self.next_state(&state.tracker, athlete, non_finishes, race_index, race.is_final)
            })
            .collect();
        state.tracker.insert_or_update(states);

        if race.is_final {
            state.final_race_id = Some(race.id.clone());
        }

        info!(
            race_id = %race.id,
            date = %race.date,
            race_index,
            participants = score.athlete_ranks.len(),
            groups = score.groups.len(),
            is_final = race.is_final,
            "Processed race"
        );

        let snapshot = RankingSnapshot {
            race_id: race.id.clone(),
            race_date: race.date,
            race_index,
            is_final: race.is_final,
            rows: state.tracker.rows()
        };

        Ok((
            state,
            Some(ProcessedRace {
                snapshot,
                groups: score.groups
            })
        ))
    }

    fn next_state(
        &self,
        tracker: &RankTracker,
        athlete: &AthleteId,
        non_finishes: NonFinishCount,
        race_index: usize,
        is_final: bool
    ) -> CurrentRankState {
        let standing = attendance(self.config, race_index, tracker.races_attended(athlete));
        let ranks: Vec<Decimal> = tracker
            .history(athlete)
            .iter()
            .filter(|e| e.source == RankSource::Race || race_index == 1)
            .map(|e| e.rank)
            .collect();

        let best_mean = top_n_mean(&ranks, standing.races_counted).unwrap_or(Decimal::ZERO);

        let mut state = CurrentRankState {
            athlete: athlete.clone(),
            current_rank: Decimal::ZERO,
            races_counted: standing.races_counted,
            races_attended: standing.races_attended,
            race_index,
            last_race_date: tracker.last_race_date(athlete),
            missed_fraction: standing.missed_fraction,
            penalty: standing.penalty,
            non_finish_penalty: non_finish_penalty(self.config, non_finishes),
            final_rank: None
        };
        state.current_rank = best_mean * state.penalty_factor();
        if is_final {
            state.final_rank = Some(final_rank(self.config, state.current_rank, state.missed_fraction));
        }

        debug!(
            athlete = %athlete,
            race_index,
            history = ranks.len(),
            counted = standing.races_counted,
            missed = %standing.missed_fraction,
            "Updated current rank"
        );

        state
    }

    /// Freezes final ranks from the standing states when the final race
    /// itself had nothing to score.
    fn close_season(&self, state: &mut SeasonState, race: &Race) -> RankingSnapshot {
        let frozen: Vec<CurrentRankState> = state
            .tracker
            .rows()
            .into_iter()
            .map(|mut row| {
                row.final_rank = Some(final_rank(self.config, row.current_rank, row.missed_fraction));
                row
            })
            .collect();
        state.tracker.insert_or_update(frozen);
        state.final_race_id = Some(race.id.clone());

        info!(race_id = %race.id, date = %race.date, "Final race had no scorable results, standing ranks frozen");

        RankingSnapshot {
            race_id: race.id.clone(),
            race_date: race.date,
            race_index: state.race_index,
            is_final: true,
            rows: state.tracker.rows()
        }
    }

    fn check_order(state: &SeasonState, race: &Race) -> Result<(), StateError> {
        if let Some(final_race_id) = &state.final_race_id {
            return Err(StateError::AfterFinalRace {
                race_id: race.id.clone(),
                final_race_id: final_race_id.clone()
            });
        }

        if state.seen_race_ids.contains(&race.id) {
            return Err(StateError::DuplicateRace(race.id.clone()));
        }

        if let Some((_, previous)) = &state.last_race {
            if race.date <= *previous {
                return Err(StateError::OutOfOrder {
                    race_id: race.id.clone(),
                    date: race.date,
                    previous: *previous
                });
            }
        }

        Ok(())
    }

    fn count_non_finishes(state: &mut SeasonState, race: &Race) {
        for record in race.records.iter().filter(|r| r.status != RaceStatus::Finished) {
            let counts = state.non_finishes.entry(record.athlete.clone()).or_default();
            if record.status == RaceStatus::NotStarted {
                counts.not_started += 1;
            } else {
                counts.withdrawn += 1;
            }
        }
    }
}
