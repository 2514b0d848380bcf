use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

use crate::model::{error::RaceDataError, structures::athlete::Sex};

/// A sex-prefixed age category code such as `M21` or `W14`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgeCategory {
    pub sex: Sex,
    /// The part after the sex prefix, shared between sexes in the base rank table
    pub group: String
}

impl AgeCategory {
    pub fn new(sex: Sex, group: &str) -> AgeCategory {
        AgeCategory {
            sex,
            group: group.trim().to_uppercase()
        }
    }
}

impl FromStr for AgeCategory {
    type Err = RaceDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let prefix = chars
            .next()
            .ok_or_else(|| RaceDataError::MalformedCategory(s.to_string()))?;
        let sex = Sex::try_from(prefix)?;
        let group = chars.as_str().trim();

        if group.is_empty() {
            return Err(RaceDataError::MalformedCategory(s.to_string()));
        }

        Ok(AgeCategory::new(sex, group))
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sex, self.group)
    }
}

impl Serialize for AgeCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AgeCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        error::RaceDataError,
        structures::{age_category::AgeCategory, athlete::Sex}
    };

    #[test]
    fn test_parse_latin_and_cyrillic() {
        assert_eq!("M21".parse(), Ok(AgeCategory::new(Sex::Male, "21")));
        assert_eq!("Ж14".parse(), Ok(AgeCategory::new(Sex::Female, "14")));
        assert_eq!("w21e".parse(), Ok(AgeCategory::new(Sex::Female, "21E")));
    }

    #[test]
    fn test_parse_rejects_bare_prefix() {
        assert_eq!(
            "M".parse::<AgeCategory>(),
            Err(RaceDataError::MalformedCategory("M".to_string()))
        );
        assert_eq!(
            "".parse::<AgeCategory>(),
            Err(RaceDataError::MalformedCategory("".to_string()))
        );
    }

    #[test]
    fn test_display_uses_latin_prefix() {
        let category: AgeCategory = "Ж21".parse().unwrap();
        assert_eq!(category.to_string(), "W21");
    }
}
