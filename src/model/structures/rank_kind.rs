use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which rank is calculated. Forest and sprint ranks follow the summer
/// calendar but may start their rules at other race numbers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum RankKind {
    Summer,
    /// December races count toward the following year's winter season
    Winter,
    Forest,
    Sprint
}

impl RankKind {
    pub fn season_of(&self, date: NaiveDate) -> i32 {
        match self {
            RankKind::Winter if date.month() == 12 => date.year() + 1,
            _ => date.year()
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankKind::Summer => "Summer rank",
            RankKind::Winter => "Winter rank",
            RankKind::Forest => "Forest rank",
            RankKind::Sprint => "Sprint rank"
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::structures::rank_kind::RankKind;
    use chrono::NaiveDate;

    #[test]
    fn test_december_belongs_to_next_winter() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 17).unwrap();

        assert_eq!(RankKind::Winter.season_of(date), 2024);
        assert_eq!(RankKind::Summer.season_of(date), 2023);
    }

    #[test]
    fn test_other_months_keep_their_year() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 3).unwrap();

        assert_eq!(RankKind::Winter.season_of(date), 2024);
    }

    #[test]
    fn test_forest_and_sprint_follow_calendar_year() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();

        assert_eq!(RankKind::Forest.season_of(date), 2024);
        assert_eq!(RankKind::Sprint.season_of(date), 2024);
        assert_eq!(RankKind::Sprint.label(), "Sprint rank");
    }
}
