// Batch driver: reads the CSV, runs every data row through the row builder
// and the validators, hands valid payloads to a dispatcher and writes the
// collected results once at the end.
//
// Rows are processed one at a time in file order. A row's files are opened
// when its payload is built and closed when the payload is dropped, which
// happens either inside `Dispatch::dispatch` or as soon as the row fails.

use crate::api::{Dispatch, UploadResult};
use crate::config::{Config, ErrorPolicy};
use crate::error::{BatchError, Result};
use crate::row::{build_row, Identity, RowError, RowPayload};
use crate::schema::Schema;
use crate::ui;
use crate::validate::Validator;
use csv::{ReaderBuilder, StringRecord};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A row left out of the batch under `ErrorPolicy::SkipAndContinue`.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: u64,
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per dispatched row, in input order.
    pub results: Vec<UploadResult>,
    pub skipped: Vec<SkippedRow>,
    pub results_path: Option<PathBuf>,
}

impl BatchReport {
    /// 0 when every row was dispatched, otherwise the code of the first skipped row.
    pub fn exit_code(&self) -> i32 {
        self.skipped.first().map(|s| s.code).unwrap_or(0)
    }

    pub fn accepted(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn transport_failures(&self) -> usize {
        self.results.iter().filter(|r| r.status_code == 0).count()
    }
}

#[derive(Debug)]
pub enum BatchOutcome {
    Completed(BatchReport),
    /// The CSV had a header but no data rows; nothing was sent.
    NoRows,
}

pub struct BatchRunner<'a, D: Dispatch> {
    config: &'a Config,
    identity: Identity,
    dispatcher: D,
    progress: ProgressBar,
    preview: bool,
}

impl<'a, D: Dispatch> BatchRunner<'a, D> {
    pub fn new(config: &'a Config, identity: Identity, dispatcher: D) -> Self {
        BatchRunner {
            config,
            identity,
            dispatcher,
            progress: ProgressBar::hidden(),
            preview: false,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Print each payload before it is sent.
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn run(&self, csv_path: &Path) -> Result<BatchOutcome> {
        if !csv_path.exists() {
            return Err(BatchError::CsvNotFound(csv_path.to_path_buf()));
        }
        let (schema, rows) = read_csv(self.config, csv_path)?;
        if rows.is_empty() {
            warn!(path = %csv_path.display(), "csv has no data rows");
            return Ok(BatchOutcome::NoRows);
        }
        info!(rows = rows.len(), columns = schema.len(), policy = ?self.config.policy, "starting batch");

        let validator = Validator::new(&self.config.catalog.extensions)
            .strict_coordinates(self.config.strict_coordinates);
        let mut report = BatchReport::default();

        match self.config.policy {
            ErrorPolicy::AbortOnFirstError => {
                // Nothing is uploaded unless every row is valid.
                for (line, record) in &rows {
                    drop(self.prepare(&schema, &validator, *line, record)?);
                }
                debug!("pre-flight validation passed");
                self.progress.set_length(rows.len() as u64);
                for (line, record) in &rows {
                    let payload = match self.prepare(&schema, &validator, *line, record) {
                        Ok(payload) => payload,
                        Err(err) => {
                            // Rows already sent still get their outcome recorded.
                            self.progress.finish_and_clear();
                            write_results(&self.config.results_path, &report.results)?;
                            return Err(err);
                        }
                    };
                    report.results.push(self.send(*line, payload));
                }
            }
            ErrorPolicy::SkipAndContinue => {
                self.progress.set_length(rows.len() as u64);
                for (line, record) in &rows {
                    match self.prepare(&schema, &validator, *line, record) {
                        Ok(payload) => report.results.push(self.send(*line, payload)),
                        Err(err) => {
                            warn!(line = *line, code = err.exit_code(), "skipping row: {}", err);
                            report.skipped.push(SkippedRow {
                                line: *line,
                                code: err.exit_code(),
                                message: err.to_string(),
                            });
                            self.progress.inc(1);
                        }
                    }
                }
            }
        }
        self.progress.finish_and_clear();

        write_results(&self.config.results_path, &report.results)?;
        report.results_path = Some(self.config.results_path.clone());
        info!(
            sent = report.results.len(),
            accepted = report.accepted(),
            skipped = report.skipped.len(),
            "batch finished"
        );
        Ok(BatchOutcome::Completed(report))
    }

    fn prepare(
        &self,
        schema: &Schema,
        validator: &Validator<'_>,
        line: u64,
        record: &StringRecord,
    ) -> Result<RowPayload> {
        let cells: Vec<&str> = record.iter().collect();
        let mut payload = build_row(schema, &self.identity, &cells).map_err(|err| match err {
            RowError::ColumnCount { expected, found } => BatchError::RowFormat { line, expected, found },
            RowError::FilePath { field, path, source } => BatchError::FilePath { line, field, path, source },
        })?;
        validator
            .validate(&mut payload)
            .map_err(|source| BatchError::Validation { line, source })?;
        Ok(payload)
    }

    fn send(&self, line: u64, payload: RowPayload) -> UploadResult {
        if self.preview {
            self.progress.suspend(|| ui::print_preview(line, &payload));
        }
        self.progress.set_message(format!("line {}", line));
        let result = self.dispatcher.dispatch(payload).unwrap_or_else(|err| {
            warn!(line, "upload failed before a response arrived: {:#}", err);
            UploadResult::transport_failure(&err)
        });
        debug!(line, status = result.status_code, "row dispatched");
        if self.preview {
            self.progress.suspend(|| ui::print_result(line, &result));
        }
        self.progress.inc(1);
        result
    }
}

/// Read the header and all data rows. Each row is paired with the CSV line it starts on.
fn read_csv(config: &Config, path: &Path) -> Result<(Schema, Vec<(u64, StringRecord)>)> {
    let csv_err = |source: csv::Error| BatchError::CsvRead { path: path.to_path_buf(), source };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let schema = Schema::from_headers(&config.catalog, headers.iter())?;
    debug!(?headers, "schema loaded");

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map(|p| p.line()).unwrap_or(idx as u64 + 2);
        rows.push((line, record));
    }
    Ok((schema, rows))
}

fn write_results(path: &Path, results: &[UploadResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results)
        .map_err(|e| BatchError::ResultsWrite { path: path.to_path_buf(), source: e.into() })?;
    std::fs::write(path, json).map_err(|source| BatchError::ResultsWrite { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), "results written");
    Ok(())
}
