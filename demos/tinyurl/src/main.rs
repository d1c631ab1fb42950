// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Run the TinyURL model and print a summary.
//!
//! For example:
//!   cargo run --bin tinyurl -- --target-qps 800 --duration-secs 30
//! --stdout-level debug --stdout-filter-regex frontend

use anyhow::Result;
use clap::Parser;
use dsim_track::builder::{TrackerConfig, build_tracker};
use dsim_tinyurl::config::Config;
use dsim_tinyurl::model::TinyUrl;

fn main() -> Result<()> {
    let config = Config::load(Config::parse())?;
    let settings = config.settings()?;

    let tracker = build_tracker(&TrackerConfig {
        enable: true,
        level: settings.stdout_level,
        filter_regex: &settings.stdout_filter_regex,
        file: settings.log_file.as_deref(),
    })?;

    let mut model = TinyUrl::build(&settings, &tracker)?;
    let summary = model.run(settings.duration)?;
    tracker.shutdown();

    println!("{summary}");
    Ok(())
}
