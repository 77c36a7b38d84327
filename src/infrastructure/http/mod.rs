//! HTTP transport for the record client port.

pub mod client;

pub use client::HttpRecordClient;
