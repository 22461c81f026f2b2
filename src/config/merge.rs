//! Merge of configuration sources.

mod merge_policy;
pub mod service;
