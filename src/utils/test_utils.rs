use crate::model::{
    config::FormulaConfig,
    rank_tracker::RankTracker,
    structures::{
        age_category::AgeCategory,
        athlete::{AthleteId, Sex},
        current_rank::CurrentRankState,
        race::Race,
        race_result::{RaceResultRecord, RaceStatus},
        race_type::{RaceLevel, RaceType},
        ranking_snapshot::RankingSnapshot
    }
};
use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;

const CATEGORIES: [&str; 4] = ["M21", "W21", "M35", "W18"];

pub fn generate_athlete(name: &str) -> AthleteId {
    generate_athlete_with_sex(name, Sex::Male)
}

pub fn generate_athlete_with_sex(name: &str, sex: Sex) -> AthleteId {
    AthleteId::new(name, name, 2000, sex)
}

/// Weekly races starting 2024-04-07.
pub fn generate_race_date(index: usize) -> NaiveDate {
    let start = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    start + Duration::weeks(index as i64)
}

fn generate_record(name: &str, category: &str, status: RaceStatus) -> RaceResultRecord {
    let category: AgeCategory = category.parse().unwrap();
    let base_group_rank = FormulaConfig::default()
        .base_group_rank(&category)
        .unwrap_or(Decimal::ZERO);

    RaceResultRecord {
        athlete: generate_athlete_with_sex(name, category.sex),
        category,
        race_id: "race-1".to_string(),
        race_date: generate_race_date(1),
        finish_seconds: None,
        placement: None,
        race_type: RaceType::IndividualStart,
        race_level: RaceLevel::Other,
        base_group_rank,
        status
    }
}

/// An individual start finisher; sex follows the category prefix.
pub fn generate_finisher(name: &str, category: &str, seconds: u32, placement: u32) -> RaceResultRecord {
    let mut record = generate_record(name, category, RaceStatus::Finished);
    record.finish_seconds = Some(seconds);
    record.placement = Some(placement);

    record
}

pub fn generate_non_finisher(name: &str, category: &str, status: RaceStatus) -> RaceResultRecord {
    generate_record(name, category, status)
}

/// Race `index` of the season; records are moved onto its id and date.
pub fn generate_race(index: usize, records: Vec<RaceResultRecord>) -> Race {
    let id = format!("race-{}", index);
    let date = generate_race_date(index);
    let records = records
        .into_iter()
        .map(|mut r| {
            r.race_id = id.clone();
            r.race_date = date;
            r
        })
        .collect();

    Race::new(&id, &format!("Test race {}", index), date, records)
}

pub fn generate_rank_state(name: &str, rank: i64) -> CurrentRankState {
    generate_rank_state_with_sex(name, rank, Sex::Male)
}

pub fn generate_rank_state_with_sex(name: &str, rank: i64, sex: Sex) -> CurrentRankState {
    CurrentRankState {
        athlete: generate_athlete_with_sex(name, sex),
        current_rank: Decimal::from(rank),
        races_counted: 1,
        races_attended: 1,
        race_index: 1,
        last_race_date: Some(generate_race_date(1)),
        missed_fraction: Decimal::ZERO,
        penalty: Decimal::ZERO,
        non_finish_penalty: Decimal::ZERO,
        final_rank: None
    }
}

/// A tracker holding the given (male) athletes and current ranks.
pub fn generate_tracker(ranks: &[(&str, i64)]) -> RankTracker {
    let mut tracker = RankTracker::new();
    tracker.insert_or_update(ranks.iter().map(|(name, rank)| generate_rank_state(name, *rank)).collect());

    tracker
}

pub fn generate_snapshot(rows: Vec<CurrentRankState>, is_final: bool) -> RankingSnapshot {
    RankingSnapshot {
        race_id: "race-1".to_string(),
        race_date: generate_race_date(1),
        race_index: 1,
        is_final,
        rows
    }
}

/// `n` random finisher fields of 1 to 12 times each.
pub fn generate_time_fields(n: usize, seed: u64) -> Vec<Vec<u32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..n)
        .map(|_| {
            let size = rng.random_range(1..=12);
            (0..size).map(|_| rng.random_range(1200..=5400)).collect()
        })
        .collect()
}

/// A reproducible season: each athlete keeps one category, enters roughly
/// three races in four, and now and then withdraws or fails to start.
/// The last race is the season final.
pub fn generate_season(n_races: usize, n_athletes: usize, seed: u64) -> Vec<Race> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let athletes: Vec<(String, &str)> = (0..n_athletes)
        .map(|i| (format!("ATHLETE{:03}", i), CATEGORIES[i % CATEGORIES.len()]))
        .collect();

    (1..=n_races)
        .map(|index| {
            let mut records = Vec::new();

            for category in CATEGORIES {
                let mut finishers = Vec::new();

                for (name, _) in athletes.iter().filter(|(_, c)| *c == category) {
                    if !rng.random_bool(0.75) {
                        continue;
                    }

                    match rng.random_range(0..20) {
                        0 => records.push(generate_non_finisher(name, category, RaceStatus::Withdrawn)),
                        1 => records.push(generate_non_finisher(name, category, RaceStatus::NotStarted)),
                        _ => finishers.push((name.clone(), rng.random_range(1800..=4800u32)))
                    }
                }

                for (placement, (name, seconds)) in finishers
                    .into_iter()
                    .sorted_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
                    .enumerate()
                {
                    records.push(generate_finisher(&name, category, seconds, placement as u32 + 1));
                }
            }

            let mut race = generate_race(index, records);
            race.is_final = index == n_races;
            if index % 3 == 0 {
                for record in race.records.iter_mut() {
                    record.race_type = RaceType::MassStart;
                }
            }

            race
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finisher_sex_follows_category() {
        let record = generate_finisher("A", "W21", 3000, 1);

        assert_eq!(record.athlete.sex, Sex::Female);
        assert_eq!(record.base_group_rank, Decimal::from(100));
    }

    #[test]
    fn test_race_dates_increase() {
        assert!(generate_race_date(1) < generate_race_date(2));
        assert_eq!(generate_race_date(1), NaiveDate::from_ymd_opt(2024, 4, 7).unwrap());
    }

    #[test]
    fn test_race_moves_records() {
        let race = generate_race(3, vec![generate_finisher("A", "M21", 3000, 1)]);

        assert_eq!(race.records[0].race_id, "race-3");
        assert_eq!(race.records[0].race_date, race.date);
    }

    #[test]
    fn test_season_is_reproducible() {
        let first = generate_season(5, 20, 1);
        let second = generate_season(5, 20, 1);

        assert_eq!(first, second);
        assert!(first.last().unwrap().is_final);
        assert!(!first[0].is_final);
    }
}
