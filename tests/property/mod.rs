//! Property-based tests for allocation, sizing and scoring invariants

mod allocation;
mod scoring;
