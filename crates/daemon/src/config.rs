// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Nested TOML configuration, one struct per key group.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsmdbtConfig {
    pub changes_dir: PathBuf,
    pub run_dir: PathBuf,
    pub log_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub get_log_max_changes: u32,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsmiumConfig {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub progress: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cron_expression")]
    pub expression: String,
    #[serde(default = "default_failure_penalty")]
    pub failure_penalty_seconds: u64,
}

fn default_cron_expression() -> String {
    "*/1 * * * * *".to_string()
}

fn default_failure_penalty() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub should_collect_info: bool,
    pub cron: CronConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStorageConfig {
    pub endpoint: String,
    pub bucket_name: String,
    #[serde(default = "default_acl")]
    pub acl: String,
    pub region: String,
    pub credentials: CredentialsConfig,
}

fn default_acl() -> String {
    "public-read".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediatorClientConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArstotzkaConfig {
    #[serde(default)]
    pub enabled: bool,
    pub service_id: String,
    pub mediator: MediatorClientConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBucketsConfig {
    #[serde(default = "default_job_duration_buckets")]
    pub osmdbt_job_duration_seconds: Vec<f64>,
    #[serde(default = "default_command_duration_buckets")]
    pub osmdbt_command_duration_seconds: Vec<f64>,
}

fn default_job_duration_buckets() -> Vec<f64> {
    vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]
}

fn default_command_duration_buckets() -> Vec<f64> {
    vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0]
}

impl Default for MetricBucketsConfig {
    fn default() -> Self {
        Self {
            osmdbt_job_duration_seconds: default_job_duration_buckets(),
            osmdbt_command_duration_seconds: default_command_duration_buckets(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfig {
    #[serde(default)]
    pub buckets: MetricBucketsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryConfig {
    #[serde(default = "default_logger")]
    pub logger: String,
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_logger() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { logger: default_logger(), tracing: TracingConfig::default(), metrics: MetricsConfig::default() }
    }
}

/// Root configuration, mirroring every top-level key group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub osmdbt: OsmdbtConfig,
    #[serde(default)]
    pub osmium: OsmiumConfig,
    pub app: AppConfig,
    pub object_storage: ObjectStorageConfig,
    pub arstotzka: ArstotzkaConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
