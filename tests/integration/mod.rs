//! Integration tests for the Brandline campaign pipeline

mod config_integration;
mod pipeline_flow;
mod support;
