use std::{
    fs,
    path::{Path, PathBuf}
};

use tracing::debug;

use crate::model::{
    error::RankError,
    report::{NonFinishTable, RankingTable, ReportWriter}
};

/// Writes every table as `<dir>/<table name>.csv`.
pub struct CsvReportWriter {
    dir: PathBuf,
    written: Vec<PathBuf>
}

impl CsvReportWriter {
    pub fn new(dir: impl AsRef<Path>) -> Result<CsvReportWriter, RankError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| RankError::Io {
            path: dir.display().to_string(),
            source
        })?;

        Ok(CsvReportWriter {
            dir,
            written: Vec::new()
        })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write(&mut self, name: &str, header: Vec<String>, records: Vec<Vec<String>>) -> Result<(), RankError> {
        let path = self.dir.join(format!("{}.csv", name));
        let mut writer = csv::Writer::from_path(&path)?;

        writer.write_record(&header)?;
        for record in &records {
            writer.write_record(record)?;
        }
        writer.flush().map_err(|source| RankError::Io {
            path: path.display().to_string(),
            source
        })?;

        debug!(path = %path.display(), rows = records.len(), "Wrote table");
        self.written.push(path);

        Ok(())
    }
}

impl ReportWriter for CsvReportWriter {
    fn write_ranking(&mut self, table: &RankingTable) -> Result<(), RankError> {
        self.write(&table.name(), table.header(), table.records())
    }

    fn write_non_finishes(&mut self, table: &NonFinishTable) -> Result<(), RankError> {
        self.write(&table.name(), table.header(), table.records())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        feed::export::CsvReportWriter,
        model::{
            report::{ranking_tables, ReportWriter},
            structures::rank_kind::RankKind
        },
        utils::test_utils::{generate_rank_state, generate_snapshot}
    };
    use std::fs;

    #[test]
    fn test_writes_ranking_csv() {
        let dir = std::env::temp_dir().join("rank_processor_export_test");
        let snapshot = generate_snapshot(vec![generate_rank_state("A", 95), generate_rank_state("B", 90)], false);
        let table = &ranking_tables(&snapshot, RankKind::Summer)[1];

        let mut writer = CsvReportWriter::new(&dir).unwrap();
        writer.write_ranking(table).unwrap();

        let path = &writer.written()[0];
        let content = fs::read_to_string(path).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        let lines: Vec<&str> = content.lines().collect();
        assert!(path.ends_with(format!("{}.csv", table.name())));
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("No,Athlete,Birth year,Current rank on"));
        assert_eq!(lines[1], "1,A A,2000,95.00,1,1,1,-,-");
    }
}
