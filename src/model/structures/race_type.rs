use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

const MASS_START_MARKERS: [&str; 2] = ["mass start", "общий старт"];
const CHAMPIONSHIP_MARKERS: [&str; 3] = ["championship", "чемпионат", "первенство"];
const CITY_MARKERS: [&str; 2] = ["petrozavodsk", "петрозаводск"];
const REGION_MARKERS: [&str; 2] = ["karelia", "карелия"];
// "Onega spring": the lake word followed by the season word
const ONEGA_SPRING_MARKERS: [(&str, &str); 2] = [("onega", "spring"), ("онежск", "весн")];
const NATIONAL_MARKERS: [&str; 2] = ["all-russian", "всероссийские"];
const CLUB_CUP_MARKERS: [&str; 3] = ["club cup", "клубный кубок", "ккк"];

/// Start format. Drives the placement term of the group rank.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum RaceType {
    MassStart,
    IndividualStart
}

impl RaceType {
    /// Protocols only mark mass starts; everything else is an individual start.
    pub fn from_race_name(name: &str) -> RaceType {
        let lower = name.to_lowercase();
        if MASS_START_MARKERS.iter().any(|m| lower.contains(m)) {
            RaceType::MassStart
        } else {
            RaceType::IndividualStart
        }
    }
}

/// Competition tier. Every tier but `Other` may carry a level bonus.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum RaceLevel {
    CityChampionship,
    RegionalChampionship,
    OnegaSpring,
    NationalEvent,
    ClubCup,
    Other
}

impl RaceLevel {
    pub fn classify(heading: &str) -> RaceLevel {
        let lower = heading.to_lowercase();
        let contains_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

        if contains_any(&CHAMPIONSHIP_MARKERS) && contains_any(&CITY_MARKERS) {
            return RaceLevel::CityChampionship;
        }

        if contains_any(&CHAMPIONSHIP_MARKERS) && contains_any(&REGION_MARKERS) {
            return RaceLevel::RegionalChampionship;
        }

        let onega_spring = ONEGA_SPRING_MARKERS
            .iter()
            .any(|(first, then)| lower.find(first).is_some_and(|i| lower[i + first.len()..].contains(then)));
        if onega_spring {
            return RaceLevel::OnegaSpring;
        }

        if contains_any(&NATIONAL_MARKERS) {
            return RaceLevel::NationalEvent;
        }

        if contains_any(&CLUB_CUP_MARKERS) {
            return RaceLevel::ClubCup;
        }

        RaceLevel::Other
    }
}
