use std::collections::BTreeMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::model::structures::{
    athlete::AthleteId,
    current_rank::{CurrentRankState, PriorSeasonRank, RaceRankEntry, RankSource}
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankTracker {
    // Every athlete's latest state, kept sorted by current rank descending
    leaderboard: IndexMap<AthleteId, CurrentRankState>,
    // Race ranks accumulated over the season, seed first
    histories: BTreeMap<AthleteId, Vec<RaceRankEntry>>
}

impl RankTracker {
    pub fn new() -> RankTracker {
        RankTracker {
            leaderboard: IndexMap::new(),
            histories: BTreeMap::new()
        }
    }

    /// Seeds histories and states with last season's final ranks.
    /// Reset (zero) final ranks carry nothing over. Returns the number of seeds kept.
    pub fn seed(&mut self, prior: &[PriorSeasonRank]) -> usize {
        let mut seeded = 0;

        for rank in prior.iter().filter(|r| r.final_rank > Decimal::ZERO) {
            let history = self.histories.entry(rank.athlete.clone()).or_default();
            if history.iter().any(|e| e.source == RankSource::PriorSeason) {
                continue;
            }

            history.insert(
                0,
                RaceRankEntry {
                    source: RankSource::PriorSeason,
                    race_id: None,
                    race_date: None,
                    rank: rank.final_rank
                }
            );

            self.leaderboard.insert(
                rank.athlete.clone(),
                CurrentRankState {
                    athlete: rank.athlete.clone(),
                    current_rank: rank.final_rank,
                    races_counted: 0,
                    races_attended: 0,
                    race_index: 0,
                    last_race_date: None,
                    missed_fraction: Decimal::ZERO,
                    penalty: Decimal::ZERO,
                    non_finish_penalty: Decimal::ZERO,
                    final_rank: None
                }
            );
            seeded += 1;
        }

        self.sort();
        seeded
    }

    /// Appends one race's per-athlete ranks to the histories.
    pub fn record_race(&mut self, race_id: &str, race_date: NaiveDate, ranks: &BTreeMap<AthleteId, Decimal>) {
        for (athlete, rank) in ranks {
            self.histories.entry(athlete.clone()).or_default().push(RaceRankEntry {
                source: RankSource::Race,
                race_id: Some(race_id.to_string()),
                race_date: Some(race_date),
                rank: *rank
            });
        }
    }

    /// Replaces the states of the given athletes, then re-sorts once.
    pub fn insert_or_update(&mut self, states: Vec<CurrentRankState>) {
        for state in states {
            self.leaderboard.insert(state.athlete.clone(), state);
        }

        self.sort();
    }

    pub fn get(&self, athlete: &AthleteId) -> Option<&CurrentRankState> {
        self.leaderboard.get(athlete)
    }

    /// The pre-race rank consulted by the comparative rank.
    pub fn current_rank(&self, athlete: &AthleteId) -> Option<Decimal> {
        self.get(athlete).map(|s| s.current_rank)
    }

    pub fn history(&self, athlete: &AthleteId) -> &[RaceRankEntry] {
        self.histories.get(athlete).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Athletes with any history, in identity order.
    pub fn athletes(&self) -> impl Iterator<Item = &AthleteId> {
        self.histories.keys()
    }

    pub fn races_attended(&self, athlete: &AthleteId) -> usize {
        self.history(athlete)
            .iter()
            .filter(|e| e.source == RankSource::Race)
            .count()
    }

    pub fn last_race_date(&self, athlete: &AthleteId) -> Option<NaiveDate> {
        self.history(athlete).iter().rev().find_map(|e| e.race_date)
    }

    /// Leaderboard rows, highest current rank first.
    pub fn rows(&self) -> Vec<CurrentRankState> {
        self.leaderboard.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.leaderboard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaderboard.is_empty()
    }

    fn sort(&mut self) {
        // Ties fall back to identity order so snapshots are reproducible
        self.leaderboard
            .sort_by(|k1, v1, k2, v2| v2.current_rank.cmp(&v1.current_rank).then_with(|| k1.cmp(k2)));
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            rank_tracker::RankTracker,
            structures::current_rank::{PriorSeasonRank, RankSource}
        },
        utils::test_utils::{generate_athlete, generate_rank_state}
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    #[test]
    fn test_seed_skips_reset_ranks() {
        let mut tracker = RankTracker::new();
        let prior = vec![
            PriorSeasonRank {
                athlete: generate_athlete("A"),
                final_rank: Decimal::from(85)
            },
            PriorSeasonRank {
                athlete: generate_athlete("B"),
                final_rank: Decimal::ZERO
            },
        ];

        assert_eq!(tracker.seed(&prior), 1);
        assert_eq!(tracker.current_rank(&generate_athlete("A")), Some(Decimal::from(85)));
        assert_eq!(tracker.current_rank(&generate_athlete("B")), None);
        assert_eq!(tracker.history(&generate_athlete("A"))[0].source, RankSource::PriorSeason);
        assert_eq!(tracker.races_attended(&generate_athlete("A")), 0);
    }

    #[test]
    fn test_record_race_appends_history() {
        let mut tracker = RankTracker::new();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let ranks = BTreeMap::from([(generate_athlete("A"), Decimal::from(90))]);

        tracker.record_race("r1", date, &ranks);
        tracker.record_race("r2", date.succ_opt().unwrap(), &ranks);

        let athlete = generate_athlete("A");
        assert_eq!(tracker.history(&athlete).len(), 2);
        assert_eq!(tracker.races_attended(&athlete), 2);
        assert_eq!(tracker.last_race_date(&athlete), date.succ_opt());
        assert!(tracker.history(&generate_athlete("Z")).is_empty());
    }

    #[test]
    fn test_rows_sorted_descending_with_stable_ties() {
        let mut tracker = RankTracker::new();
        tracker.insert_or_update(vec![
            generate_rank_state("C", 70),
            generate_rank_state("B", 90),
            generate_rank_state("A", 70),
        ]);

        let order: Vec<String> = tracker.rows().iter().map(|r| r.athlete.surname.clone()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);

        tracker.insert_or_update(vec![generate_rank_state("C", 95)]);
        assert_eq!(tracker.rows()[0].athlete.surname, "C");
        assert_eq!(tracker.len(), 3);
    }
}
