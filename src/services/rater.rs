//! The three request operations: discover courses in an uploaded sheet,
//! calculate weighted averages into a result sheet, and fetch a result.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyzers::discover::discover_courses;
use crate::analyzers::types::{CalculationSummary, ColumnRoles, RuleEntry, WeightRule};
use crate::analyzers::weighted::{compute, summarize};
use crate::config::RaterConfig;
use crate::error::{RaterError, Result};
use crate::infra::store::{Area, ArtifactStore, open_store};
use crate::output::render_table;
use crate::parser::{parse_header, parse_table};

/// Upload file extensions the tabular codec can read.
pub const ALLOWED_EXTENSIONS: &[&str] = &["csv"];

/// Response to an upload: the course columns and the stored sheet name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    pub courses: Vec<String>,
    #[serde(rename = "filename")]
    pub file_name: String,
}

/// A calculation request as a client sends it. Both fields are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculateRequest {
    #[serde(rename = "filename")]
    pub file_name: Option<String>,
    pub rules: Option<Vec<RuleEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub download_file: String,
    pub summary: CalculationSummary,
}

pub struct Rater {
    store: Box<dyn ArtifactStore>,
    roles: ColumnRoles,
    average_column: String,
}

impl Rater {
    pub fn new(store: Box<dyn ArtifactStore>, roles: ColumnRoles, average_column: &str) -> Self {
        Self {
            store,
            roles,
            average_column: average_column.to_string(),
        }
    }

    /// Opens the configured store and builds a rater around it.
    pub async fn open(config: &RaterConfig) -> Result<Self> {
        let store = open_store(&config.store).await?;
        Ok(Self::new(store, config.roles.clone(), &config.average_column))
    }

    /// Stores an uploaded sheet under a fresh timestamped name and lists its
    /// course columns.
    ///
    /// The header is read before anything is stored, so an unreadable sheet
    /// leaves no artifact behind.
    #[tracing::instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn discover(&self, file_name: &str, bytes: &[u8]) -> Result<Discovery> {
        let base_name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or(RaterError::InputMissing("file name"))?;

        if !allowed_file(base_name) {
            return Err(RaterError::UnsupportedFormat(base_name.to_string()));
        }

        let header = parse_header(bytes)?;
        let courses = discover_courses(&header, &self.roles);

        let stored_name = format!("{}_{}", Utc::now().timestamp_millis(), base_name);
        self.store.put(Area::Uploads, &stored_name, bytes).await?;

        info!(file_name = %stored_name, courses = courses.len(), "Sheet uploaded");
        Ok(Discovery {
            courses,
            file_name: stored_name,
        })
    }

    /// Applies the request's credit rule to a stored sheet and stores the
    /// result sheet as `result_<filename>`.
    ///
    /// Missing input and bad credits are rejected before the sheet is read.
    /// Nothing is stored unless the whole result rendered.
    #[tracing::instrument(skip(self, request), fields(file_name = tracing::field::Empty))]
    pub async fn calculate(&self, request: CalculateRequest) -> Result<Calculation> {
        let file_name = request
            .file_name
            .filter(|n| !n.trim().is_empty())
            .ok_or(RaterError::InputMissing("filename"))?;
        let entries = request
            .rules
            .filter(|r| !r.is_empty())
            .ok_or(RaterError::InputMissing("rules"))?;
        tracing::Span::current().record("file_name", file_name.as_str());

        let rule = WeightRule::from_entries(&entries)?;
        debug!(courses = rule.len(), "Weight rule built");

        let bytes = self.store.get(Area::Uploads, &file_name).await?;
        let table = parse_table(&bytes)?;

        let result = compute(&table, &rule, &self.roles, &self.average_column);
        let summary = summarize(&table, &rule, &result);
        let rendered = render_table(&result.columns(), &result.records())?;

        let download_file = format!("result_{file_name}");
        self.store.put(Area::Outputs, &download_file, &rendered).await?;

        info!(
            download_file = %download_file,
            students = summary.students,
            mean = summary.mean,
            without_courses = summary.without_courses,
            "Calculation complete"
        );

        Ok(Calculation {
            download_file,
            summary,
        })
    }

    /// Returns the bytes of a result sheet.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        self.store.get(Area::Outputs, name).await
    }
}

fn allowed_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::weighted::DEFAULT_AVERAGE_COLUMN;
    use crate::infra::store::LocalArtifactStore;
    use crate::table::Cell;

    const SHEET: &str = "学号,姓名,专业,math,english\nS1,Ann,CS,80,90\nS2,Bo,EE,70,\n";

    fn rater() -> (tempfile::TempDir, Rater) {
        let dir = tempfile::tempdir().unwrap();
        let store =
            LocalArtifactStore::new(dir.path().join("uploads"), dir.path().join("output")).unwrap();
        let rater = Rater::new(
            Box::new(store),
            ColumnRoles::default(),
            DEFAULT_AVERAGE_COLUMN,
        );
        (dir, rater)
    }

    fn request(file_name: &str, rules: &[(&str, f64)]) -> CalculateRequest {
        CalculateRequest {
            file_name: Some(file_name.to_string()),
            rules: Some(rules.iter().map(|(c, w)| RuleEntry::new(*c, *w)).collect()),
        }
    }

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("scores.csv"));
        assert!(allowed_file("SCORES.CSV"));
        assert!(!allowed_file("scores.xlsx"));
        assert!(!allowed_file("scores"));
    }

    #[tokio::test]
    async fn test_discover_lists_courses() {
        let (dir, rater) = rater();
        let discovery = rater.discover("scores.csv", SHEET.as_bytes()).await.unwrap();

        assert_eq!(discovery.courses, vec!["math", "english"]);
        assert!(discovery.file_name.ends_with("_scores.csv"));
        assert!(dir.path().join("uploads").join(&discovery.file_name).is_file());
    }

    #[tokio::test]
    async fn test_discover_prefixes_unix_millis() {
        let (_dir, rater) = rater();
        let before = Utc::now().timestamp_millis();
        let discovery = rater.discover("scores.csv", SHEET.as_bytes()).await.unwrap();
        let after = Utc::now().timestamp_millis();

        let (stamp, rest) = discovery.file_name.split_once('_').unwrap();
        let stamp: i64 = stamp.parse().unwrap();
        assert!((before..=after).contains(&stamp));
        assert_eq!(rest, "scores.csv");
    }

    #[tokio::test]
    async fn test_discover_keeps_only_base_name() {
        let (_dir, rater) = rater();
        let discovery = rater.discover("../../etc/scores.csv", SHEET.as_bytes()).await.unwrap();
        assert!(!discovery.file_name.contains('/'));
    }

    #[tokio::test]
    async fn test_discover_rejects_other_formats() {
        let (dir, rater) = rater();
        let err = rater.discover("scores.xlsx", SHEET.as_bytes()).await.unwrap_err();

        assert!(matches!(err, RaterError::UnsupportedFormat(_)));
        assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_discover_rejects_empty_name() {
        let (_dir, rater) = rater();
        let err = rater.discover("", SHEET.as_bytes()).await.unwrap_err();
        assert!(matches!(err, RaterError::InputMissing(_)));
    }

    #[tokio::test]
    async fn test_calculate_writes_result() {
        let (_dir, rater) = rater();
        let discovery = rater.discover("scores.csv", SHEET.as_bytes()).await.unwrap();

        let calculation = rater
            .calculate(request(&discovery.file_name, &[("math", 3.0), ("english", 2.0)]))
            .await
            .unwrap();

        assert_eq!(calculation.download_file, format!("result_{}", discovery.file_name));
        assert_eq!(calculation.summary.students, 2);

        let bytes = rater.fetch(&calculation.download_file).await.unwrap();
        let table = parse_table(&bytes).unwrap();
        assert_eq!(
            table.columns,
            vec!["学号", "姓名", "weighted_average", "math", "english"]
        );
        assert_eq!(table.rows[0].get("weighted_average"), &Cell::number(84.0));
        assert_eq!(table.rows[1].get("weighted_average"), &Cell::number(70.0));
        assert_eq!(table.rows[1].get("english"), &Cell::Missing);
    }

    #[tokio::test]
    async fn test_calculate_requires_filename_and_rules() {
        let (dir, rater) = rater();

        let err = rater
            .calculate(CalculateRequest {
                file_name: None,
                rules: Some(vec![RuleEntry::new("math", 1.0)]),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RaterError::InputMissing("filename")));

        let err = rater.calculate(request("x.csv", &[])).await.unwrap_err();
        assert!(matches!(err, RaterError::InputMissing("rules")));

        assert_eq!(std::fs::read_dir(dir.path().join("output")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_calculate_unknown_sheet_is_not_found() {
        let (_dir, rater) = rater();
        let err = rater.calculate(request("nope.csv", &[("math", 1.0)])).await.unwrap_err();
        assert!(matches!(err, RaterError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_calculate_corrupt_sheet_writes_nothing() {
        let (dir, rater) = rater();
        let mut bytes = b"id,math\n".to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFE, b',', b'1', b'\n']);
        let discovery = rater.discover("bad.csv", &bytes).await.unwrap();

        let err = rater
            .calculate(request(&discovery.file_name, &[("math", 1.0)]))
            .await
            .unwrap_err();

        assert!(matches!(err, RaterError::Codec(_)));
        assert_eq!(std::fs::read_dir(dir.path().join("output")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_reads_outputs_only() {
        let (_dir, rater) = rater();
        let discovery = rater.discover("scores.csv", SHEET.as_bytes()).await.unwrap();

        let err = rater.fetch(&discovery.file_name).await.unwrap_err();
        assert!(matches!(err, RaterError::NotFound(_)));
    }

    #[test]
    fn test_request_deserializes_client_json() {
        let request: CalculateRequest = serde_json::from_str(
            r#"{"filename": "1_s.csv", "rules": [{"course": "语文", "credit": "4"}]}"#,
        )
        .unwrap();

        assert_eq!(request.file_name.as_deref(), Some("1_s.csv"));
        assert_eq!(request.rules.unwrap()[0].credit.value(), Some(4.0));
    }
}
