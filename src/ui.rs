// UI layer: everything the user sees on the terminal. Diagnostics are
// coloured with crossterm and the dispatch loop reports progress through an
// indicatif bar. Nothing here decides anything about the batch.

use crate::api::UploadResult;
use crate::batch::BatchReport;
use crate::error::BatchError;
use crate::row::{FieldValue, RowPayload};
use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Fields whose value is a credential and must not be echoed.
const SECRET_FIELDS: &[&str] = &["key", "secKey"];

/// Progress bar for the dispatch loop, one tick per row.
pub fn upload_progress(rows: u64) -> ProgressBar {
    let pb = ProgressBar::new(rows);
    let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb
}

/// Mask all but the last four characters of a credential.
pub fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

/// The form-data of a payload as it will be shown, credentials masked.
pub fn preview_fields(payload: &RowPayload) -> BTreeMap<String, FieldValue> {
    payload
        .fields
        .iter()
        .map(|(k, v)| {
            let shown = match v {
                FieldValue::Text(s) if SECRET_FIELDS.contains(&k.as_str()) => FieldValue::Text(mask(s)),
                other => other.clone(),
            };
            (k.clone(), shown)
        })
        .collect()
}

pub fn print_preview(line: u64, payload: &RowPayload) {
    println!("{}", format!("===Body Form-Data Preview (line {})===", line).bold());
    match serde_json::to_string_pretty(&preview_fields(payload)) {
        Ok(json) => println!("{}", json),
        Err(_) => println!("{:?}", preview_fields(payload)),
    }
    for (name, att) in &payload.attachments {
        println!("  {} <- {}", name.clone().cyan(), att.path.display());
    }
    println!("{}", "============================".bold());
}

pub fn print_result(line: u64, result: &UploadResult) {
    let status = if result.is_success() {
        result.status_code.to_string().green()
    } else {
        result.status_code.to_string().red()
    };
    println!("Line {} status code: {}", line, status);
    println!("{}", result.response_text);
}

pub fn print_error(err: &BatchError) {
    eprintln!("{}", err.to_string().red());
    if err.line().is_some() || matches!(err, BatchError::Schema(_)) {
        eprintln!("Above errors need to be resolved in order to continue the batch upload process");
    }
}

pub fn print_no_rows() {
    println!("{}", "[WARNING] The csv file has no data rows, no files were uploaded".yellow());
}

pub fn print_summary(report: &BatchReport) {
    for skipped in &report.skipped {
        eprintln!("{}", format!("[SKIPPED] ({}) {}", skipped.code, skipped.message).yellow());
    }
    let rejected = report.results.len() - report.accepted() - report.transport_failures();
    println!(
        "Uploaded {} row(s): {} accepted, {} rejected, {} failed to send, {} skipped",
        report.results.len(),
        report.accepted().to_string().green(),
        rejected,
        report.transport_failures(),
        report.skipped.len()
    );
    if let Some(path) = &report.results_path {
        println!("Results written to {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_credentials() {
        assert_eq!(mask("abcdef123"), "*****f123");
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask(""), "");
    }

    #[test]
    fn preview_hides_keys_only() {
        let mut payload = RowPayload::default();
        payload.set("key", FieldValue::Text("long-api-key".into()));
        payload.set("secKey", FieldValue::Text("secret99".into()));
        payload.set("email", FieldValue::Text("me@example.com".into()));
        payload.set("target_type", FieldValue::Int(2));

        let shown = preview_fields(&payload);
        assert_eq!(shown["key"], FieldValue::Text("********-key".into()));
        assert_eq!(shown["secKey"], FieldValue::Text("****et99".into()));
        assert_eq!(shown["email"], FieldValue::Text("me@example.com".into()));
        assert_eq!(shown["target_type"], FieldValue::Int(2));
    }
}
