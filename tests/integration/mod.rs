//! Integration tests for the lesson generation pipeline

mod config_integration;
mod pipeline_followup;
mod pipeline_generate;
mod pipeline_degradation;
mod test_utils;
