// Copyright (c) 2020 Graphcore Ltd. All rights reserved.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Write;

use crate::tracker::{EntityManager, Track};
use crate::{Id, NO_ID, Writer};

/// Writes one line per event, stamped with the simulated time and the full
/// name of the entity that emitted it:
///
/// ```text
///      20000.0 top::system::db:DEBUG: Random Failure for 42
/// ```
///
/// Write failures are ignored.
pub struct TextTracker {
    entity_manager: EntityManager,
    writer: RefCell<Writer>,

    /// Latest time reported through [`Track::time`].
    now_ns: Cell<f64>,

    names: RefCell<HashMap<Id, String>>,
}

impl TextTracker {
    /// Create a [`TextTracker`] writing to `writer`.
    pub fn new(entity_manager: EntityManager, writer: Writer) -> Self {
        Self {
            entity_manager,
            writer: RefCell::new(writer),
            now_ns: Cell::new(0.0),
            names: RefCell::new(HashMap::new()),
        }
    }

    fn write_line(&self, by: Id, line: std::fmt::Arguments) {
        let names = self.names.borrow();
        let now = self.now_ns.get();
        let mut writer = self.writer.borrow_mut();
        let _ = match names.get(&by) {
            Some(name) => writeln!(writer, "{now:>12.1} {name}{line}"),
            None => writeln!(writer, "{now:>12.1} {by}{line}"),
        };
    }
}

impl Track for TextTracker {
    fn unique_id(&self) -> Id {
        self.entity_manager.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.entity_manager.is_log_enabled_at_level(id, level)
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        self.entity_manager.add_entity(id, entity_name);
        self.names.borrow_mut().insert(id, entity_name.to_string());
    }

    fn enter(&self, id: Id, object: Id) {
        self.write_line(id, format_args!(": enter {object}"));
    }

    fn exit(&self, id: Id, object: Id) {
        self.write_line(id, format_args!(": exit {object}"));
    }

    fn create(&self, created_by: Id, id: Id, name: &str) {
        if created_by == NO_ID {
            self.write_line(id, format_args!(": created"));
        } else {
            self.write_line(created_by, format_args!(": created {name} ({id})"));
        }
    }

    fn destroy(&self, _destroyed_by: Id, id: Id) {
        self.write_line(id, format_args!(": destroyed"));
        self.names.borrow_mut().remove(&id);
    }

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        self.write_line(id, format_args!(":{level}: {msg}"));
    }

    fn time(&self, _set_by: Id, time_ns: f64) {
        self.now_ns.set(time_ns);
    }

    fn shutdown(&self) {
        let _ = self.writer.borrow_mut().flush();
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::rc::Rc;

    use super::*;

    /// A writer whose contents can be read back after the tracker has it.
    #[derive(Clone, Default)]
    struct Captured(Rc<RefCell<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lines_carry_time_and_name() {
        let captured = Captured::default();
        let tracker = TextTracker::new(
            EntityManager::new(log::Level::Trace),
            Box::new(captured.clone()),
        );
        let db = tracker.unique_id();
        tracker.add_entity(db, "top::db");

        tracker.time(NO_ID, 1500.0);
        tracker.log(db, log::Level::Debug, format_args!("get {}", 3));
        tracker.destroy(NO_ID, db);
        tracker.log(db, log::Level::Info, format_args!("gone"));

        let text = String::from_utf8(captured.0.borrow().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "      1500.0 top::db:DEBUG: get 3");
        assert_eq!(lines[1], "      1500.0 top::db: destroyed");
        assert_eq!(lines[2], format!("      1500.0 {db}:INFO: gone"));
    }
}
