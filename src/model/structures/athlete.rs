use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumIter;

use crate::model::error::RaceDataError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "W")]
    Female
}

impl Sex {
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "W"
        }
    }
}

/// Protocols use either latin or cyrillic sex prefixes.
impl TryFrom<char> for Sex {
    type Error = RaceDataError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_uppercase().next().unwrap_or(c) {
            'M' | 'М' => Ok(Sex::Male),
            'W' | 'F' | 'Ж' => Ok(Sex::Female),
            other => Err(RaceDataError::UnknownSex(other.to_string()))
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Athletes have no stable numeric id. Two different people sharing
/// surname, given name, birth year and sex collapse into one identity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AthleteId {
    pub surname: String,
    pub given_name: String,
    /// 0 when the protocol did not carry a birth year
    pub birth_year: u16,
    pub sex: Sex
}

impl AthleteId {
    pub fn new(surname: &str, given_name: &str, birth_year: u16, sex: Sex) -> AthleteId {
        AthleteId {
            surname: surname.trim().to_uppercase(),
            given_name: given_name.trim().to_uppercase(),
            birth_year,
            sex
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.surname, self.given_name)
    }

    pub fn validate(&self) -> Result<(), RaceDataError> {
        if self.surname.is_empty() {
            return Err(RaceDataError::MissingIdentity("surname"));
        }

        if self.given_name.is_empty() {
            return Err(RaceDataError::MissingIdentity("given name"));
        }

        Ok(())
    }
}

impl fmt::Display for AthleteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.surname, self.given_name, self.birth_year)
    }
}
