// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Settings for the TinyURL model.
//!
//! Every setting can come from four places. From lowest to highest priority:
//!
//!  1. The built-in defaults.
//!  2. A TOML file named with `--config`.
//!  3. Environment variables, e.g. `DSIM_TARGET_QPS=500`.
//!  4. The command line, e.g. `--target-qps 500`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dsim_engine::random::DEFAULT_SEED;
use dsim_engine::time::{SimTime, micros, millis, secs};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Prefix of the environment variables that override settings.
pub const ENV_PREFIX: &str = "DSIM_";

/// Settings as read from any one source, where a missing value is `None`.
#[derive(Clone, Debug, PartialEq, Parser, Serialize, Deserialize)]
#[command(about = "Simulate a TinyURL service under a ramping load")]
pub struct Config {
    /// Seed for the random numbers drawn during the run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// The rate, in queries per second, the load ramps towards.
    #[arg(long)]
    pub target_qps: Option<f64>,

    /// Percentage of the gap to the target rate closed every second.
    #[arg(long)]
    pub ramp_rate: Option<f64>,

    /// Simulated time to run for, in seconds.
    #[arg(long)]
    pub duration_secs: Option<f64>,

    /// Deadline on calls to the DB, in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<f64>,

    /// Time the DB takes to store a URL, in microseconds.
    #[arg(long)]
    pub put_latency: Option<f64>,

    /// Time the DB takes to look a URL up, in microseconds.
    #[arg(long)]
    pub get_latency: Option<f64>,

    /// Percentage of DB requests that fail.
    #[arg(long)]
    pub failure_rate: Option<f64>,

    /// Requests the front end serves at once.
    #[arg(long)]
    pub max_servers: Option<usize>,

    /// Requests the front end holds while its servers are busy.
    #[arg(long)]
    pub max_queue_size: Option<usize>,

    /// Level of log message to display.
    #[arg(long)]
    pub stdout_level: Option<log::Level>,

    /// Regular expression selecting the entities logged at `--stdout-level`.
    /// Others only log errors.
    #[arg(long)]
    pub stdout_filter_regex: Option<String>,

    /// Write the log to this file instead of `stdout`.
    #[arg(long)]
    pub log_file: Option<String>,

    /// TOML file to read settings from.
    #[arg(long)]
    #[serde(skip)]
    pub config: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: Some(DEFAULT_SEED),
            target_qps: Some(200.0),
            ramp_rate: Some(10.0),
            duration_secs: Some(60.0),
            timeout_ms: Some(100.0),
            put_latency: Some(20_000.0),
            get_latency: Some(5_000.0),
            failure_rate: Some(0.1),
            max_servers: Some(4),
            max_queue_size: Some(100),
            stdout_level: Some(log::Level::Warn),
            stdout_filter_regex: Some(String::new()),
            log_file: None,
            config: None,
        }
    }
}

/// Overwrite each field of `$config` for which `$cli` has a value.
macro_rules! merge_fields {
    ($config:ident, $cli:ident ; $($field:ident),*) => {
        $(
            if $cli.$field.is_some() {
                $config.$field = $cli.$field;
            }
        )*
    };
}

impl Config {
    /// Combine every source, with `cli` taking priority over the rest.
    pub fn load(cli: Config) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = &cli.config {
            if !path.is_file() {
                bail!("{} not found", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }
        let mut config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("Invalid settings")?;

        merge_fields!(config, cli ;
            seed, target_qps, ramp_rate, duration_secs, timeout_ms,
            put_latency, get_latency, failure_rate, max_servers, max_queue_size,
            stdout_level, stdout_filter_regex, log_file, config
        );
        Ok(config)
    }

    /// The settings the model is built from.
    pub fn settings(&self) -> Result<Settings> {
        fn required<T: Clone>(value: &Option<T>, name: &str) -> Result<T> {
            value.clone().with_context(|| format!("{name} is not set"))
        }

        Ok(Settings {
            seed: required(&self.seed, "seed")?,
            target_qps: required(&self.target_qps, "target_qps")?,
            ramp_rate: required(&self.ramp_rate, "ramp_rate")?,
            duration: secs(required(&self.duration_secs, "duration_secs")?),
            timeout: millis(required(&self.timeout_ms, "timeout_ms")?),
            put_latency: micros(required(&self.put_latency, "put_latency")?),
            get_latency: micros(required(&self.get_latency, "get_latency")?),
            failure_rate: required(&self.failure_rate, "failure_rate")?,
            max_servers: required(&self.max_servers, "max_servers")?,
            max_queue_size: required(&self.max_queue_size, "max_queue_size")?,
            stdout_level: required(&self.stdout_level, "stdout_level")?,
            stdout_filter_regex: self.stdout_filter_regex.clone().unwrap_or_default(),
            log_file: self.log_file.clone(),
        })
    }
}

/// Fully resolved settings, with times in nanoseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub seed: u64,
    pub target_qps: f64,
    pub ramp_rate: f64,
    pub duration: SimTime,
    pub timeout: SimTime,
    pub put_latency: SimTime,
    pub get_latency: SimTime,
    pub failure_rate: f64,
    pub max_servers: usize,
    pub max_queue_size: usize,
    pub stdout_level: log::Level,
    pub stdout_filter_regex: String,
    pub log_file: Option<String>,
}
