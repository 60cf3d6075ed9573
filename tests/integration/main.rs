//! Integration tests for promptsync

mod cli_contracts;
mod codec_properties;
mod merge_properties;
mod support;
mod sync_flow;
