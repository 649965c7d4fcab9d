//! # DataStore Module
//!
//! Domain types shared by the digest pipeline, and the persistence layer for
//! transcripts, summaries and rendered reports.
//!
//! Records are written as plain files, grouped per channel, under directories
//! chosen by the caller.

mod datastore;
mod domain;

pub use datastore::fs::FsDataStore;
pub use datastore::{record_file_name, sanitize_filename, DataStore, MAX_FILENAME_CHARS};
pub use domain::{
    Channel, RenderedReport, ReportPaths, SummaryRecord, TranscriptRecord, Video,
};
