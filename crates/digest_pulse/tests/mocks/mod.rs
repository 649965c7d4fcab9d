#![allow(dead_code)]

pub mod channel_source;
pub mod datastore;
pub mod downloader;
pub mod mailer;
pub mod summarizer;
pub mod transcriber;
