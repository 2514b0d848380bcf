use chrono::NaiveDate;
use thiserror::Error;

/// Fatal. Raised before any race is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read formula configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse formula configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Formula configuration validation failed: {}", .0.join("; "))]
    Invalid(Vec<String>)
}

/// Recovered locally: the offending record is excluded from its race.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RaceDataError {
    #[error("missing {0}")]
    MissingIdentity(&'static str),

    #[error("unknown sex prefix '{0}'")]
    UnknownSex(String),

    #[error("malformed age category '{0}'")]
    MalformedCategory(String),

    #[error("finished without a finish time")]
    MissingFinishTime,

    #[error("finish time must be positive")]
    ZeroFinishTime,

    #[error("placement must be positive")]
    ZeroPlacement,

    #[error("unparseable finish time '{0}'")]
    UnparseableTime(String),

    #[error("unparseable rank '{0}'")]
    UnparseableRank(String)
}

/// Fatal. Processing further races would corrupt the rolling rank.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("race {race_id} on {date} is not after the previously processed race on {previous}")]
    OutOfOrder {
        race_id: String,
        date: NaiveDate,
        previous: NaiveDate
    },

    #[error("race {0} was already processed")]
    DuplicateRace(String),

    #[error("race {race_id} follows the season's final race {final_race_id}")]
    AfterFinalRace { race_id: String, final_race_id: String }
}

#[derive(Debug, Error)]
pub enum RankError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error)
}
