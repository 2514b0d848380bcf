use std::{collections::BTreeMap, fs, path::Path, str::FromStr};

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::{
    feed::feed_structs::{FeedRace, FeedResult, PriorRankRow, ResultFeed},
    model::{
        config::FormulaConfig,
        error::{RaceDataError, RankError},
        structures::{
            age_category::AgeCategory,
            athlete::AthleteId,
            current_rank::PriorSeasonRank,
            race::Race,
            race_result::{RaceResultRecord, RaceStatus},
            race_type::{RaceLevel, RaceType},
            rank_kind::RankKind
        }
    }
};

/// Which races of the feed belong to the season being ranked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonFilter {
    pub kind: RankKind,
    /// None keeps every race
    pub year: Option<i32>,
    /// Marks the last loaded race as the season final
    pub close_season: bool
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedTally {
    pub rows: usize,
    /// Age groups without a base rank; not an error
    pub ineligible: usize,
    pub rejected: usize,
    pub other_season_races: usize,
    pub reasons: BTreeMap<String, usize>
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFeed {
    /// In date order
    pub races: Vec<Race>,
    pub tally: FeedTally
}

pub fn load_result_feed(
    path: impl AsRef<Path>,
    config: &FormulaConfig,
    filter: &SeasonFilter
) -> Result<LoadedFeed, RankError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| RankError::Io {
        path: path.display().to_string(),
        source
    })?;
    let feed: ResultFeed = serde_json::from_str(&raw).map_err(|source| RankError::Parse {
        path: path.display().to_string(),
        source
    })?;

    let loaded = races_from_feed(feed, config, filter);
    info!(
        path = %path.display(),
        races = loaded.races.len(),
        rows = loaded.tally.rows,
        ineligible = loaded.tally.ineligible,
        rejected = loaded.tally.rejected,
        "Result feed loaded"
    );

    Ok(loaded)
}

/// Converts feed races into scored-ready races: classifies type and level,
/// drops categories without a base rank and rows that cannot be parsed,
/// keeps the configured season only and sorts by date.
pub fn races_from_feed(feed: ResultFeed, config: &FormulaConfig, filter: &SeasonFilter) -> LoadedFeed {
    let mut tally = FeedTally::default();
    let mut races = Vec::new();

    for feed_race in feed.races {
        let season = filter.kind.season_of(feed_race.date);
        if filter.year.is_some_and(|year| year != season) {
            debug!(race_id = %feed_race.id, season, "Skipping race from another season");
            tally.other_season_races += 1;
            continue;
        }

        races.push(convert_race(feed_race, config, &mut tally));
    }

    races.sort_by(|a, b| a.date.cmp(&b.date));

    if filter.close_season {
        if let Some(last) = races.last_mut() {
            last.is_final = true;
        }
    }

    LoadedFeed { races, tally }
}

fn convert_race(feed_race: FeedRace, config: &FormulaConfig, tally: &mut FeedTally) -> Race {
    let race_type = feed_race
        .race_type
        .unwrap_or_else(|| RaceType::from_race_name(&feed_race.name));
    let race_level = feed_race
        .race_level
        .unwrap_or_else(|| RaceLevel::classify(feed_race.heading.as_deref().unwrap_or(&feed_race.name)));

    let mut records = Vec::with_capacity(feed_race.results.len());
    for result in &feed_race.results {
        tally.rows += 1;

        let category: AgeCategory = match result.category.parse() {
            Ok(category) => category,
            Err(e) => {
                reject(tally, &feed_race.id, result, e);
                continue;
            }
        };

        let Some(base_group_rank) = config.base_group_rank(&category) else {
            tally.ineligible += 1;
            continue;
        };

        let finish_seconds = match result.time.as_deref().map(parse_finish_time).transpose() {
            Ok(seconds) => seconds,
            Err(e) => {
                reject(tally, &feed_race.id, result, e);
                continue;
            }
        };

        records.push(RaceResultRecord {
            athlete: AthleteId::new(&result.surname, &result.given_name, result.birth_year, category.sex),
            category,
            race_id: feed_race.id.clone(),
            race_date: feed_race.date,
            finish_seconds: if result.status == RaceStatus::Finished { finish_seconds } else { None },
            placement: result.placement,
            race_type,
            race_level,
            base_group_rank,
            status: result.status
        });
    }

    Race {
        id: feed_race.id,
        name: feed_race.name,
        date: feed_race.date,
        is_final: feed_race.is_final,
        records
    }
}

fn reject(tally: &mut FeedTally, race_id: &str, result: &FeedResult, error: RaceDataError) {
    warn!(
        race_id,
        surname = %result.surname,
        given_name = %result.given_name,
        reason = %error,
        "Rejecting feed row"
    );
    tally.rejected += 1;
    *tally.reasons.entry(error.to_string()).or_default() += 1;
}

/// Accepts `H:MM:SS`, `MM:SS` and plain seconds.
pub fn parse_finish_time(raw: &str) -> Result<u32, RaceDataError> {
    let invalid = || RaceDataError::UnparseableTime(raw.to_string());
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }

    let mut seconds: u32 = 0;
    for (i, part) in parts.iter().enumerate() {
        let value: u32 = part.parse().map_err(|_| invalid())?;
        if i > 0 && value >= 60 {
            return Err(invalid());
        }

        seconds = seconds.checked_mul(60).and_then(|s| s.checked_add(value)).ok_or_else(invalid)?;
    }

    Ok(seconds)
}

/// Reads last season's final ranks. Unparseable rows are logged and skipped.
pub fn load_prior_ranks(path: impl AsRef<Path>) -> Result<Vec<PriorSeasonRank>, RankError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let mut ranks = Vec::new();

    for row in reader.deserialize::<PriorRankRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping prior rank row");
                continue;
            }
        };

        match Decimal::from_str(row.final_rank.trim()) {
            Ok(final_rank) => ranks.push(PriorSeasonRank {
                athlete: AthleteId::new(&row.surname, &row.given_name, row.birth_year, row.sex),
                final_rank
            }),
            Err(_) => warn!(
                surname = %row.surname,
                reason = %RaceDataError::UnparseableRank(row.final_rank.clone()),
                "Skipping prior rank row"
            )
        }
    }

    info!(path = %path.display(), ranks = ranks.len(), "Prior season ranks loaded");

    Ok(ranks)
}

#[cfg(test)]
mod tests {
    use crate::{
        feed::{
            feed_structs::ResultFeed,
            loader::{load_prior_ranks, parse_finish_time, races_from_feed, SeasonFilter}
        },
        model::{
            config::FormulaConfig,
            error::RaceDataError,
            structures::{
                athlete::Sex,
                race_type::{RaceLevel, RaceType},
                rank_kind::RankKind
            }
        }
    };
    use rust_decimal::Decimal;
    use std::fs;

    const FEED: &str = r#"{
        "races": [
            {
                "id": "r2",
                "name": "Spring cup, mass start",
                "heading": "Чемпионат г. Петрозаводска",
                "date": "2024-05-12",
                "results": [
                    { "surname": "Ivanov", "givenName": "Ivan", "birthYear": 2001, "category": "M21", "time": "0:52:10", "placement": 1, "status": "finished" },
                    { "surname": "Petrova", "givenName": "Anna", "category": "Ж21", "time": "55:03", "placement": 1, "status": "finished" },
                    { "surname": "Kid", "givenName": "Small", "birthYear": 2016, "category": "M10", "time": "20:00", "placement": 1, "status": "finished" },
                    { "surname": "Broken", "givenName": "Time", "category": "M21", "time": "5x:00", "placement": 2, "status": "finished" },
                    { "surname": "Late", "givenName": "Sam", "category": "M21", "status": "notStarted" }
                ]
            },
            {
                "id": "r1",
                "name": "Opening sprint",
                "date": "2024-05-05",
                "raceLevel": "clubCup",
                "results": [
                    { "surname": "Ivanov", "givenName": "Ivan", "birthYear": 2001, "category": "X21", "time": "30:00", "placement": 1, "status": "finished" }
                ]
            },
            {
                "id": "old",
                "name": "Last winter",
                "date": "2023-12-17",
                "results": []
            }
        ]
    }"#;

    fn filter(year: Option<i32>) -> SeasonFilter {
        SeasonFilter {
            kind: RankKind::Summer,
            year,
            close_season: true
        }
    }

    #[test]
    fn test_parse_finish_time() {
        assert_eq!(parse_finish_time("1:02:03"), Ok(3723));
        assert_eq!(parse_finish_time("52:10"), Ok(3130));
        assert_eq!(parse_finish_time("3130"), Ok(3130));
        assert_eq!(parse_finish_time("5x:00"), Err(RaceDataError::UnparseableTime("5x:00".to_string())));
        assert!(parse_finish_time("1:60:00").is_err());
        assert!(parse_finish_time("1::00").is_err());
        assert!(parse_finish_time("1:00:00:00").is_err());
    }

    #[test]
    fn test_feed_conversion() {
        let feed: ResultFeed = serde_json::from_str(FEED).unwrap();
        let loaded = races_from_feed(feed, &FormulaConfig::default(), &filter(Some(2024)));

        assert_eq!(loaded.races.len(), 2);
        assert_eq!(loaded.races[0].id, "r1");
        assert!(!loaded.races[0].is_final);
        assert!(loaded.races[1].is_final);
        assert_eq!(loaded.tally.other_season_races, 1);
        assert_eq!(loaded.tally.rows, 6);
        assert_eq!(loaded.tally.ineligible, 1);
        assert_eq!(loaded.tally.rejected, 2);

        let race = &loaded.races[1];
        assert_eq!(race.records.len(), 3);
        assert_eq!(race.records[0].race_type, RaceType::MassStart);
        assert_eq!(race.records[0].race_level, RaceLevel::CityChampionship);
        assert_eq!(race.records[0].finish_seconds, Some(3130));
        assert_eq!(race.records[0].athlete.surname, "IVANOV");
        assert_eq!(race.records[1].athlete.sex, Sex::Female);
        assert_eq!(race.records[1].base_group_rank, Decimal::from(100));
        assert_eq!(race.records[2].finish_seconds, None);
    }

    #[test]
    fn test_without_season_year_every_race_is_kept() {
        let feed: ResultFeed = serde_json::from_str(FEED).unwrap();
        let loaded = races_from_feed(feed, &FormulaConfig::default(), &filter(None));

        assert_eq!(loaded.races.len(), 3);
        assert_eq!(loaded.races[0].id, "old");
        assert!(loaded.races[1].records.is_empty());
        assert_eq!(loaded.tally.reasons.get("unknown sex prefix 'X'"), Some(&1));
    }

    #[test]
    fn test_winter_season_takes_december() {
        let feed: ResultFeed = serde_json::from_str(FEED).unwrap();
        let winter = SeasonFilter {
            kind: RankKind::Winter,
            year: Some(2024),
            close_season: false
        };

        let loaded = races_from_feed(feed, &FormulaConfig::default(), &winter);

        assert_eq!(loaded.races.len(), 3);
        assert!(loaded.races.iter().all(|r| !r.is_final));
    }

    #[test]
    fn test_load_prior_ranks() {
        let path = std::env::temp_dir().join("rank_processor_prior_ranks.csv");
        fs::write(
            &path,
            "surname,given_name,birth_year,sex,final_rank\nIvanov,Ivan,2001,M,85.25\nPetrova,Anna,1999,W,oops\n"
        )
        .unwrap();

        let ranks = load_prior_ranks(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(ranks.len(), 1);
        assert_eq!(ranks[0].athlete.surname, "IVANOV");
        assert_eq!(ranks[0].final_rank, Decimal::new(8525, 2));
    }
}
