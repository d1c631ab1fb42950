// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The TinyURL system.
//!
//! ```text
//!  load ──▶ frontend (queue) ──▶ tinyurl (router)
//!                                  ├─ create: guard (timeout) ─▶ db_call ─┐
//!                                  └─ get:    guard (timeout) ─▶ db_call ─┤
//!                                                                         ▼
//!                                                                         db
//! ```
//!
//! Each guard wraps the call it puts a deadline on.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use dsim_components::call::Call;
use dsim_components::db_node::DbNode;
use dsim_components::generator::Generator;
use dsim_engine::property::Properties;
use dsim_engine::simulator::Simulator;
use dsim_engine::system::{Queue, QueueDiagnostics, Timeout};
use dsim_engine::time::{ONE_SEC, SimTime};
use dsim_engine::tree::{ActorId, Tree};
use dsim_engine::types::SimError;
use dsim_track::Tracker;
use dsim_track::info;

use crate::config::Settings;

/// The routes of the service and the DB method each one calls.
const ROUTES: [(&str, &str, i64); 2] = [("create", "put", 1), ("get", "get", 9)];

pub struct TinyUrl {
    pub sim: Simulator,
    pub load: ActorId,
    pub frontend: ActorId,
    pub guards: Vec<ActorId>,
    pub db: ActorId,
    errors: Rc<RefCell<BTreeMap<String, usize>>>,
}

impl TinyUrl {
    pub fn build(settings: &Settings, tracker: &Tracker) -> Result<Self, SimError> {
        let mut tree = Tree::new(tracker);
        let system = tree.new_network("system");

        let mut generator = Generator::new();
        generator.set_property("ramp_rate", settings.ramp_rate)?;
        generator.set_property("target_qps", settings.target_qps)?;
        for (route, _, weight) in ROUTES {
            generator.add("frontend", route, weight);
        }
        let load = tree.new_leaf("load", generator);

        let frontend = tree.new_queue(
            "frontend",
            Queue::new(settings.max_servers, settings.max_queue_size),
        );
        let service = tree.new_router("tinyurl");
        let mut guards = Vec::new();
        for (route, method, _) in ROUTES {
            let mut timeout = Timeout::default();
            timeout.set_property("default_timeout", settings.timeout)?;
            let guard = tree.new_timeout("guard", timeout);
            let db_call = tree.new_leaf("db_call", Call::new("db", method));
            tree.set_target(guard, db_call)?;

            let steps = tree.new_series(route);
            tree.push(steps, guard)?;
            tree.add(service, steps)?;
            guards.push(guard);
        }
        tree.set_target(frontend, service)?;

        let mut db = DbNode::new(settings.put_latency, settings.get_latency);
        db.set_property("failure_rate", settings.failure_rate)?;
        let db = tree.new_leaf("db", db);

        for child in [load, frontend, db] {
            tree.add(system, child)?;
        }

        let mut sim = Simulator::new_with_seed(tree, settings.seed);

        // Tally the errors the load sees by reason
        let errors = Rc::new(RefCell::new(BTreeMap::new()));
        let tally = errors.clone();
        sim.on_reply_processed(move |reply| {
            if reply.response_to().source != load {
                return;
            }
            if let Some(reason) = reply.error_reason() {
                *tally.borrow_mut().entry(reason.to_string()).or_insert(0) += 1;
            }
        });

        Ok(Self {
            sim,
            load,
            frontend,
            guards,
            db,
            errors,
        })
    }

    /// Start the load and run for `duration`.
    pub fn run(&mut self, duration: SimTime) -> Result<Summary, SimError> {
        let load = self.load;
        self.sim
            .invoke::<Generator, _>(load, |generator, ctx| generator.start(ctx))?;
        let num_events = self.sim.run_for(duration)?;
        info!(self.sim.entity ; "finished after {num_events} events");
        self.summary(num_events)
    }

    pub fn summary(&self, num_events: usize) -> Result<Summary, SimError> {
        let generator = self.sim.processor::<Generator>(self.load)?;
        let mut in_flight = 0;
        for guard in &self.guards {
            in_flight += self.sim.timeout_in_flight(*guard)?;
        }
        Ok(Summary {
            now: self.sim.now(),
            num_events,
            rounds: generator.round(),
            current_qps: generator.current_qps(),
            num_replies: generator.num_replies(),
            num_errors: generator.num_errors(),
            errors: self.errors.borrow().clone(),
            frontend: self.sim.queue_diagnostics(self.frontend)?,
            in_flight,
        })
    }
}

/// What happened during a run.
#[derive(Clone, Debug)]
pub struct Summary {
    pub now: SimTime,
    pub num_events: usize,
    pub rounds: u64,
    pub current_qps: f64,
    pub num_replies: usize,
    pub num_errors: usize,
    pub errors: BTreeMap<String, usize>,
    pub frontend: QueueDiagnostics,
    pub in_flight: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Ran for {:.1}s ({} events)",
            self.now / ONE_SEC,
            self.num_events
        )?;
        writeln!(
            f,
            "Load: {} rounds, now at {:.1} QPS",
            self.rounds, self.current_qps
        )?;
        writeln!(
            f,
            "Replies: {} ({} errors)",
            self.num_replies, self.num_errors
        )?;
        for (reason, count) in &self.errors {
            writeln!(f, "  {reason}: {count}")?;
        }
        writeln!(
            f,
            "Frontend: {} active, {} waiting",
            self.frontend.num_active_servers, self.frontend.queue_size
        )?;
        write!(f, "Guards: {} calls in flight", self.in_flight)
    }
}
