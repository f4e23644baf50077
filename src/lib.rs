// Library root
// -----------
// This crate exposes the batch uploader as a library. The binary
// (`main.rs`) parses the command line and hands over to `batch`.
//
// Module responsibilities:
// - `catalog`: static tables (known header names, file fields, extension
//   groups) that are passed into the loader and validators.
// - `types`: target and hologram type enums.
// - `schema`: validates the CSV header.
// - `row`: builds the form-data payload for one CSV row and owns its files.
// - `validate`: target-type and hologram-type checks and normalization.
// - `api`: sends a payload to the upload endpoint.
// - `batch`: drives rows through the pipeline and writes the result file.
// - `config`, `error`, `ui`: environment settings, error taxonomy with exit
//   codes, terminal output.
pub mod api;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod error;
pub mod row;
pub mod schema;
pub mod types;
pub mod ui;
pub mod validate;
