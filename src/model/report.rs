use std::collections::BTreeMap;

use chrono::NaiveDate;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::{
    constants::DISPLAY_DECIMALS,
    error::RankError,
    season::{NonFinishCount, SeasonResult},
    structures::{
        athlete::{AthleteId, Sex},
        current_rank::CurrentRankState,
        rank_kind::RankKind,
        ranking_snapshot::RankingSnapshot
    }
};

const NO_VALUE: &str = "-";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TableView {
    Combined,
    Men,
    Women
}

impl TableView {
    pub fn includes(&self, sex: Sex) -> bool {
        match self {
            TableView::Combined => true,
            TableView::Men => sex == Sex::Male,
            TableView::Women => sex == Sex::Female
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TableView::Combined => "combined",
            TableView::Men => "men",
            TableView::Women => "women"
        }
    }
}

/// A display row: ranks rounded, the combined penalty as a percentage.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub position: usize,
    pub athlete: String,
    pub birth_year: String,
    pub sex: Sex,
    pub current_rank: Decimal,
    pub race_index: usize,
    pub races_counted: usize,
    pub races_attended: usize,
    pub missed: String,
    pub penalty: String,
    pub final_rank: Option<Decimal>
}

impl ReportRow {
    fn from_state(position: usize, state: &CurrentRankState) -> ReportRow {
        ReportRow {
            position,
            athlete: state.athlete.full_name(),
            birth_year: birth_year_label(&state.athlete),
            sex: state.athlete.sex,
            current_rank: state.current_rank.round_dp(DISPLAY_DECIMALS),
            race_index: state.race_index,
            races_counted: state.races_counted,
            races_attended: state.races_attended,
            missed: percent_label(state.missed_fraction),
            penalty: percent_label(Decimal::ONE - state.penalty_factor()),
            final_rank: state.final_rank.map(|r| r.round_dp(DISPLAY_DECIMALS))
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankingTable {
    pub view: TableView,
    pub race_id: String,
    pub race_date: NaiveDate,
    pub title: String,
    /// Present on the season's final race only
    pub final_title: Option<String>,
    pub rows: Vec<ReportRow>
}

impl RankingTable {
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["No".to_string(), "Athlete".to_string(), "Birth year".to_string()];
        if self.view == TableView::Combined {
            header.push("Sex".to_string());
        }

        header.extend(
            [self.title.as_str(), "Race no", "Counted", "Attended", "Missed", "Penalty"]
                .iter()
                .map(|s| s.to_string())
        );
        header.extend(self.final_title.clone());

        header
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = vec![row.position.to_string(), row.athlete.clone(), row.birth_year.clone()];
                if self.view == TableView::Combined {
                    record.push(row.sex.to_string());
                }

                record.extend([
                    format!("{:.2}", row.current_rank),
                    row.race_index.to_string(),
                    row.races_counted.to_string(),
                    row.races_attended.to_string(),
                    row.missed.clone(),
                    row.penalty.clone(),
                ]);
                if self.final_title.is_some() {
                    record.push(row.final_rank.map_or(NO_VALUE.to_string(), |r| format!("{:.2}", r)));
                }

                record
            })
            .collect()
    }

    /// File-friendly name, e.g. `current_rank_2024-05-01_men`.
    pub fn name(&self) -> String {
        format!("current_rank_{}_{}", self.race_date, self.view.label())
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonFinishKind {
    NotStarted,
    Withdrawn
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NonFinishRow {
    pub surname: String,
    pub given_name: String,
    pub birth_year: String,
    pub count: usize
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NonFinishTable {
    pub kind: NonFinishKind,
    pub title: String,
    pub rows: Vec<NonFinishRow>
}

impl NonFinishTable {
    pub fn header(&self) -> Vec<String> {
        ["Surname", "Given name", "Birth year", "Entries"].iter().map(|s| s.to_string()).collect()
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| vec![r.surname.clone(), r.given_name.clone(), r.birth_year.clone(), r.count.to_string()])
            .collect()
    }

    pub fn name(&self) -> String {
        match self.kind {
            NonFinishKind::NotStarted => "not_started".to_string(),
            NonFinishKind::Withdrawn => "withdrawn".to_string()
        }
    }
}

/// Persists assembled tables. Layout and styling belong to the implementation.
pub trait ReportWriter {
    fn write_ranking(&mut self, table: &RankingTable) -> Result<(), RankError>;

    fn write_non_finishes(&mut self, table: &NonFinishTable) -> Result<(), RankError>;
}

/// Combined, men's and women's tables for one snapshot. Positions restart
/// at 1 in every view.
pub fn ranking_tables(snapshot: &RankingSnapshot, kind: RankKind) -> Vec<RankingTable> {
    let title = format!("Current rank on {}", snapshot.race_date);
    let final_title = snapshot
        .is_final
        .then(|| format!("Final rank of season {}", snapshot.season_year(kind)));

    [TableView::Combined, TableView::Men, TableView::Women]
        .into_iter()
        .map(|view| RankingTable {
            view,
            race_id: snapshot.race_id.clone(),
            race_date: snapshot.race_date,
            title: title.clone(),
            final_title: final_title.clone(),
            rows: snapshot
                .rows
                .iter()
                .filter(|state| view.includes(state.athlete.sex))
                .enumerate()
                .map(|(i, state)| ReportRow::from_state(i + 1, state))
                .collect()
        })
        .collect()
}

/// Athletes with at least one entry of the given kind, most entries first.
pub fn non_finish_table(kind: NonFinishKind, counts: &BTreeMap<AthleteId, NonFinishCount>, as_of: NaiveDate) -> NonFinishTable {
    let label = match kind {
        NonFinishKind::NotStarted => "Not started",
        NonFinishKind::Withdrawn => "Withdrawn"
    };

    let rows = counts
        .iter()
        .map(|(athlete, c)| {
            let count = match kind {
                NonFinishKind::NotStarted => c.not_started,
                NonFinishKind::Withdrawn => c.withdrawn
            };
            (athlete, count)
        })
        .filter(|(_, count)| *count > 0)
        .sorted_by(|(a_id, a), (b_id, b)| b.cmp(a).then_with(|| a_id.cmp(b_id)))
        .map(|(athlete, count)| NonFinishRow {
            surname: athlete.surname.clone(),
            given_name: athlete.given_name.clone(),
            birth_year: birth_year_label(athlete),
            count
        })
        .collect();

    NonFinishTable {
        kind,
        title: format!("{} on {}", label, as_of),
        rows
    }
}

/// Hands every table of a processed season to the writer. Returns the number of tables written.
pub fn write_season(result: &SeasonResult, kind: RankKind, writer: &mut dyn ReportWriter) -> Result<usize, RankError> {
    let mut written = 0;

    for snapshot in result.snapshots() {
        for table in ranking_tables(snapshot, kind) {
            writer.write_ranking(&table)?;
            written += 1;
        }
    }

    if let Some(latest) = result.latest() {
        for kind in [NonFinishKind::NotStarted, NonFinishKind::Withdrawn] {
            writer.write_non_finishes(&non_finish_table(kind, &result.state.non_finishes, latest.race_date))?;
            written += 1;
        }
    }

    Ok(written)
}

/// `round(100 × share)%`, with a dash for zero.
pub fn percent_label(share: Decimal) -> String {
    let percent = (share * Decimal::ONE_HUNDRED).round();
    if percent.is_zero() {
        NO_VALUE.to_string()
    } else {
        format!("{}%", percent.normalize())
    }
}

pub fn birth_year_label(athlete: &AthleteId) -> String {
    if athlete.birth_year == 0 {
        NO_VALUE.to_string()
    } else {
        athlete.birth_year.to_string()
    }
}
