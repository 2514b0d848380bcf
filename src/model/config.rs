use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use strum::IntoEnumIterator;
use tracing::info;

use crate::model::{
    bands::{BandTable, Take},
    constants::*,
    error::ConfigError,
    structures::{
        age_category::AgeCategory,
        race_type::{RaceLevel, RaceType},
        rank_kind::RankKind
    }
};

/// Coefficients and thresholds of the rank formula. Loaded and validated
/// once, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FormulaConfig {
    /// Weight of the placement term in the group rank, per start format
    pub race_type_coefficients: BTreeMap<RaceType, Decimal>,
    /// Bonus added to 1 to form the level coefficient. Missing tiers get 0.
    #[serde(default)]
    pub race_level_bonuses: BTreeMap<RaceLevel, Decimal>,
    /// Age group without sex prefix (`"21"`) -> base rank. Shared by both sexes.
    /// Categories absent here are not ranked.
    pub base_group_ranks: BTreeMap<String, Decimal>,
    /// Missed-race share -> penalty, both in [0, 1]
    pub missed_race_penalties: BandTable<Decimal, Decimal>,
    #[serde(default = "default_finisher_reference_bands")]
    pub finisher_reference_bands: BandTable<usize, Take>,
    #[serde(default = "default_comparative_reference_bands")]
    pub comparative_reference_bands: BandTable<usize, Take>,
    /// Up to this race index every race counts toward the current rank
    pub races_exempt_from_best_share: usize,
    /// Up to this race index the comparative rank is the base group rank
    pub races_exempt_from_comparative_rank: usize,
    /// Share of races counted once the exemption period ends
    pub counted_race_share: Decimal,
    /// Missed-race share at or above which the final rank is zeroed
    pub final_rank_reset_share: Decimal,
    #[serde(default = "default_reference_time_cap")]
    pub reference_time_cap: Decimal,
    /// Not-started entries over the season -> penalty in [0, 1]
    #[serde(default = "default_non_finish_penalties")]
    pub not_started_penalties: BandTable<usize, Decimal>,
    /// Withdrawn entries over the season -> penalty in [0, 1]
    #[serde(default = "default_non_finish_penalties")]
    pub withdrawn_penalties: BandTable<usize, Decimal>,
    /// Exemption periods replacing the general ones for a rank kind
    #[serde(default = "default_rank_kind_exemptions")]
    pub rank_kind_exemptions: BTreeMap<RankKind, Exemptions>
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Exemptions {
    pub races_exempt_from_best_share: usize,
    pub races_exempt_from_comparative_rank: usize
}

fn default_finisher_reference_bands() -> BandTable<usize, Take> {
    let bands: Vec<(usize, Take)> = FINISHER_REFERENCE_BANDS
        .iter()
        .map(|&(from, n)| (from, Take::Top(n)))
        .collect();

    BandTable::new(&bands)
}

fn default_comparative_reference_bands() -> BandTable<usize, Take> {
    let bands: Vec<(usize, Take)> = COMPARATIVE_REFERENCE_BANDS
        .iter()
        .map(|&(from, n)| (from, n.map_or(Take::All, Take::Top)))
        .collect();

    BandTable::new(&bands)
}

fn default_reference_time_cap() -> Decimal {
    Decimal::new(REFERENCE_TIME_CAP_PERCENT, 2)
}

fn default_non_finish_penalties() -> BandTable<usize, Decimal> {
    let bands: Vec<(usize, Decimal)> = NON_FINISH_PENALTY_BANDS
        .iter()
        .map(|&(from, penalty)| (from, percent(penalty)))
        .collect();

    BandTable::new(&bands)
}

fn default_rank_kind_exemptions() -> BTreeMap<RankKind, Exemptions> {
    BTreeMap::from([
        (
            RankKind::Forest,
            Exemptions {
                races_exempt_from_best_share: FOREST_RACES_EXEMPT_FROM_BEST_SHARE,
                races_exempt_from_comparative_rank: FOREST_RACES_BEFORE_COMPARATIVE_RANK
            }
        ),
        (
            RankKind::Sprint,
            Exemptions {
                races_exempt_from_best_share: SPRINT_RACES_EXEMPT_FROM_BEST_SHARE,
                races_exempt_from_comparative_rank: SPRINT_RACES_BEFORE_COMPARATIVE_RANK
            }
        )
    ])
}

fn percent(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

impl Default for FormulaConfig {
    fn default() -> Self {
        let race_type_coefficients = BTreeMap::from([
            (RaceType::MassStart, percent(MASS_START_COEFFICIENT_PERCENT)),
            (RaceType::IndividualStart, percent(INDIVIDUAL_START_COEFFICIENT_PERCENT))
        ]);

        let race_level_bonuses = BTreeMap::from([
            (RaceLevel::CityChampionship, percent(10)),
            (RaceLevel::RegionalChampionship, percent(20)),
            (RaceLevel::OnegaSpring, percent(15)),
            (RaceLevel::NationalEvent, percent(30)),
            (RaceLevel::ClubCup, percent(5))
        ]);

        let base_group_ranks = [
            ("12", 60),
            ("14", 70),
            ("16", 80),
            ("18", 90),
            ("21", 100),
            ("35", 90),
            ("45", 80),
            ("55", 70),
            ("65", 60)
        ]
        .iter()
        .map(|&(group, rank)| (group.to_string(), Decimal::from(rank)))
        .collect();

        let penalties: Vec<(Decimal, Decimal)> = MISSED_RACE_PENALTY_BANDS
            .iter()
            .map(|&(from, penalty)| (percent(from), percent(penalty)))
            .collect();

        FormulaConfig {
            race_type_coefficients,
            race_level_bonuses,
            base_group_ranks,
            missed_race_penalties: BandTable::new(&penalties),
            finisher_reference_bands: default_finisher_reference_bands(),
            comparative_reference_bands: default_comparative_reference_bands(),
            races_exempt_from_best_share: RACES_EXEMPT_FROM_BEST_SHARE,
            races_exempt_from_comparative_rank: RACES_BEFORE_COMPARATIVE_RANK,
            counted_race_share: percent(COUNTED_RACE_SHARE_PERCENT),
            final_rank_reset_share: percent(FINAL_RANK_RESET_SHARE_PERCENT),
            reference_time_cap: default_reference_time_cap(),
            not_started_penalties: default_non_finish_penalties(),
            withdrawn_penalties: default_non_finish_penalties(),
            rank_kind_exemptions: default_rank_kind_exemptions()
        }
    }
}

impl FormulaConfig {
    /// Reads, parses and validates a JSON formula configuration.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: FormulaConfig = serde_json::from_str(&raw)?;
        config.validate()?;

        info!(
            path = %path.as_ref().display(),
            groups = config.base_group_ranks.len(),
            "Formula configuration loaded"
        );

        Ok(config)
    }

    /// Validates the whole configuration and reports every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        for race_type in RaceType::iter() {
            match self.race_type_coefficients.get(&race_type) {
                None => errors.push(format!("raceTypeCoefficients: missing {:?}", race_type)),
                Some(c) if c.is_sign_negative() => {
                    errors.push(format!("raceTypeCoefficients.{:?}: must be non-negative", race_type))
                }
                _ => {}
            }
        }

        for (level, bonus) in &self.race_level_bonuses {
            if bonus.is_sign_negative() {
                errors.push(format!("raceLevelBonuses.{:?}: must be non-negative", level));
            }
        }

        if self.base_group_ranks.is_empty() {
            errors.push("baseGroupRanks: table is empty".to_string());
        }
        for (group, rank) in &self.base_group_ranks {
            if *rank <= Decimal::ZERO {
                errors.push(format!("baseGroupRanks.{}: must be positive", group));
            }
        }

        Self::validate_penalties(&self.missed_race_penalties, &mut errors);
        Self::validate_count_penalties("notStartedPenalties", &self.not_started_penalties, &mut errors);
        Self::validate_count_penalties("withdrawnPenalties", &self.withdrawn_penalties, &mut errors);
        Self::validate_count_bands("finisherReferenceBands", &self.finisher_reference_bands, &mut errors);
        Self::validate_count_bands(
            "comparativeReferenceBands",
            &self.comparative_reference_bands,
            &mut errors
        );

        for (name, share) in [
            ("countedRaceShare", self.counted_race_share),
            ("finalRankResetShare", self.final_rank_reset_share)
        ] {
            if !is_share(share) {
                errors.push(format!("{}: {} is not in [0, 1]", name, share));
            }
        }

        if self.counted_race_share.is_zero() {
            errors.push("countedRaceShare: must be above 0".to_string());
        }

        if self.races_exempt_from_comparative_rank < 1 {
            errors.push("racesExemptFromComparativeRank: the first race is always exempt".to_string());
        }

        for (kind, exemptions) in &self.rank_kind_exemptions {
            if exemptions.races_exempt_from_comparative_rank < 1 {
                errors.push(format!(
                    "rankKindExemptions.{:?}.racesExemptFromComparativeRank: the first race is always exempt",
                    kind
                ));
            }
        }

        if self.reference_time_cap < Decimal::ONE {
            errors.push(format!("referenceTimeCap: {} is below 1", self.reference_time_cap));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    fn validate_penalties(table: &BandTable<Decimal, Decimal>, errors: &mut Vec<String>) {
        if table.is_empty() {
            errors.push("missedRacePenalties: table is empty".to_string());
            return;
        }

        if !table.covers(Decimal::ZERO) {
            errors.push("missedRacePenalties: no band starts at 0".to_string());
        }

        if table.has_duplicate_bounds() {
            errors.push("missedRacePenalties: duplicate lower bounds".to_string());
        }

        for (i, band) in table.0.iter().enumerate() {
            if !is_share(band.from) {
                errors.push(format!("missedRacePenalties[{}].from: {} is not in [0, 1]", i, band.from));
            }
            if !is_share(band.value) {
                errors.push(format!("missedRacePenalties[{}].value: {} is not in [0, 1]", i, band.value));
            }
        }
    }

    fn validate_count_penalties(name: &str, table: &BandTable<usize, Decimal>, errors: &mut Vec<String>) {
        if !table.covers(0) {
            errors.push(format!("{}: no band starts at 0", name));
        }

        if table.has_duplicate_bounds() {
            errors.push(format!("{}: duplicate lower bounds", name));
        }

        for (i, band) in table.0.iter().enumerate() {
            if !is_share(band.value) {
                errors.push(format!("{}[{}].value: {} is not in [0, 1]", name, i, band.value));
            }
        }
    }

    fn validate_count_bands(name: &str, table: &BandTable<usize, Take>, errors: &mut Vec<String>) {
        if !table.covers(0) {
            errors.push(format!("{}: no band starts at 0", name));
        }

        if table.has_duplicate_bounds() {
            errors.push(format!("{}: duplicate lower bounds", name));
        }

        for (i, band) in table.0.iter().enumerate() {
            if band.value == Take::Top(0) {
                errors.push(format!("{}[{}].value: must select at least one entry", name, i));
            }
        }
    }

    /// The configuration as seen by one rank kind: its own exemption periods
    /// replace the general ones when configured.
    pub fn for_rank_kind(&self, kind: RankKind) -> FormulaConfig {
        let mut config = self.clone();
        if let Some(exemptions) = self.rank_kind_exemptions.get(&kind) {
            config.races_exempt_from_best_share = exemptions.races_exempt_from_best_share;
            config.races_exempt_from_comparative_rank = exemptions.races_exempt_from_comparative_rank;
        }

        config
    }

    pub fn type_coefficient(&self, race_type: RaceType) -> Decimal {
        self.race_type_coefficients
            .get(&race_type)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// `1 + bonus`; unrecognised tiers carry no bonus.
    pub fn level_coefficient(&self, level: RaceLevel) -> Decimal {
        Decimal::ONE + self.race_level_bonuses.get(&level).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn base_group_rank(&self, category: &AgeCategory) -> Option<Decimal> {
        self.base_group_ranks.get(&category.group).copied()
    }

    pub fn penalty_for(&self, missed_fraction: Decimal) -> Decimal {
        self.missed_race_penalties
            .lookup(missed_fraction)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn not_started_penalty(&self, entries: usize) -> Decimal {
        self.not_started_penalties.lookup(entries).unwrap_or(Decimal::ZERO)
    }

    pub fn withdrawn_penalty(&self, entries: usize) -> Decimal {
        self.withdrawn_penalties.lookup(entries).unwrap_or(Decimal::ZERO)
    }
}

fn is_share(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE
}
