// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Build the tracker for a simulation run from user settings.

use std::fs::File;
use std::io::{self, BufWriter};
use std::rc::Rc;

use crate::tracker::{EntityManager, TextTracker, TrackConfigError, dev_null_tracker};
use crate::{Tracker, Writer};

/// What to log and where.
pub struct TrackerConfig<'a> {
    /// When false every event is dropped.
    pub enable: bool,

    /// Level for the selected entities.
    pub level: log::Level,

    /// Comma separated regular expressions over full entity names, such as
    /// `frontend,::db$`. Entities that match get `level` and all others only
    /// report errors. Empty selects every entity.
    pub filter_regex: &'a str,

    /// Log file. `None` logs to `stdout`.
    pub file: Option<&'a str>,
}

impl Default for TrackerConfig<'_> {
    fn default() -> Self {
        Self {
            enable: true,
            level: log::Level::Warn,
            filter_regex: "",
            file: None,
        }
    }
}

impl TrackerConfig<'_> {
    fn entity_manager(&self) -> Result<EntityManager, TrackConfigError> {
        let filters: Vec<&str> = self
            .filter_regex
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        if filters.is_empty() {
            return Ok(EntityManager::new(self.level));
        }

        let mut manager = EntityManager::new(log::Level::Error);
        for filter in filters {
            manager.add_entity_level_filter(filter, self.level)?;
        }
        Ok(manager)
    }

    fn writer(&self) -> Result<Writer, TrackConfigError> {
        let Some(path) = self.file else {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        };
        match File::create(path) {
            Ok(file) => Ok(Box::new(BufWriter::new(file))),
            Err(e) => Err(TrackConfigError(format!(
                "Unable to create log file '{path}': {e}"
            ))),
        }
    }
}

/// Create the tracker described by `config`.
pub fn build_tracker(config: &TrackerConfig) -> Result<Tracker, TrackConfigError> {
    if !config.enable {
        return Ok(dev_null_tracker());
    }
    let entity_manager = config.entity_manager()?;
    let writer = config.writer()?;
    Ok(Rc::new(TextTracker::new(entity_manager, writer)))
}
