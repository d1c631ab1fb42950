// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The time-ordered list of pending events.
//!
//! Events are grouped into [`Moment`]s, one per exact timestamp. Within a
//! moment every interrupt is delivered before any message; interrupts and
//! messages are each delivered in the order they were injected. A component
//! can only be interrupted once per moment: further interrupts for it at the
//! same time are dropped.

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::message::{Event, Interrupt};
use crate::sim_error;
use crate::time::{INFINITY, SimTime, TimeKey};
use crate::tree::ActorId;
use crate::types::{SimError, SimResult};

/// All the events scheduled for a single point in time.
#[derive(Default)]
pub struct Moment {
    interrupts: VecDeque<Interrupt>,
    interrupted: HashSet<ActorId>,
    messages: VecDeque<Event>,
}

impl Moment {
    fn add_interrupt(&mut self, interrupt: Interrupt) -> bool {
        if self.interrupted.insert(interrupt.source) {
            self.interrupts.push_back(interrupt);
            true
        } else {
            false
        }
    }

    fn pop(&mut self) -> Option<Event> {
        if let Some(interrupt) = self.interrupts.pop_front() {
            return Some(Event::Interrupt(interrupt));
        }
        self.messages.pop_front()
    }

    fn is_empty(&self) -> bool {
        self.interrupts.is_empty() && self.messages.is_empty()
    }

    fn len(&self) -> usize {
        self.interrupts.len() + self.messages.len()
    }
}

#[derive(Default)]
pub struct NextEventList {
    moments: BTreeMap<TimeKey, Moment>,

    /// The time of the last event popped. Nothing may be scheduled before it.
    floor: SimTime,
}

impl NextEventList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn moment_at(&mut self, time: SimTime) -> Result<&mut Moment, SimError> {
        if time.is_nan() || time < self.floor {
            return sim_error!("New message time in the past");
        }
        Ok(self.moments.entry(TimeKey(time)).or_default())
    }

    /// Schedule an event.
    ///
    /// Returns `Ok(false)` if the event was an interrupt that collapsed into
    /// one already scheduled for the same component at the same time.
    pub fn inject(&mut self, event: Event) -> Result<bool, SimError> {
        let moment = self.moment_at(event.time())?;
        match event {
            Event::Interrupt(interrupt) => Ok(moment.add_interrupt(interrupt)),
            message => {
                moment.messages.push_back(message);
                Ok(true)
            }
        }
    }

    /// Schedule an interrupt.
    pub fn inject_interrupt(&mut self, interrupt: Interrupt) -> SimResult {
        self.inject(Event::Interrupt(interrupt))?;
        Ok(())
    }

    /// Remove and return the next event to deliver.
    pub fn pop(&mut self) -> Option<Event> {
        let mut entry = self.moments.first_entry()?;
        let time = entry.key().0;
        let event = entry.get_mut().pop();
        if entry.get().is_empty() {
            entry.remove();
        }
        self.floor = time;
        event
    }

    /// The time of the earliest pending event or [`INFINITY`] if there are
    /// none.
    #[must_use]
    pub fn next_event_time(&self) -> SimTime {
        self.moments
            .first_key_value()
            .map_or(INFINITY, |(time, _)| time.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    /// The total number of events pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moments.values().map(Moment::len).sum()
    }

    /// The number of distinct times with pending events.
    #[must_use]
    pub fn num_moments(&self) -> usize {
        self.moments.len()
    }

    /// Drop every pending event and allow scheduling from time zero again.
    pub fn clear(&mut self) {
        self.moments.clear();
        self.floor = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Address, Send};

    fn send_at(source: ActorId, time: SimTime) -> Event {
        Event::Send(Send::new(source, time, Address::new("x", "y")))
    }

    #[test]
    fn empty_list() {
        let mut nel = NextEventList::new();
        assert!(nel.is_empty());
        assert_eq!(nel.next_event_time(), INFINITY);
        assert!(nel.pop().is_none());
    }

    #[test]
    fn same_time_is_fifo() {
        let a = ActorId::next();
        let mut nel = NextEventList::new();
        let first = send_at(a, 5.0);
        let second = send_at(a, 5.0);
        let (first_id, second_id) = (first.id(), second.id());
        nel.inject(second).unwrap();
        nel.inject(first).unwrap();

        assert_eq!(nel.pop().unwrap().id(), second_id);
        assert_eq!(nel.pop().unwrap().id(), first_id);
        assert!(nel.is_empty());
    }

    #[test]
    fn interrupts_before_messages() {
        let a = ActorId::next();
        let b = ActorId::next();
        let mut nel = NextEventList::new();
        nel.inject(send_at(a, 3.0)).unwrap();
        nel.inject_interrupt(Interrupt::new(a, 3.0)).unwrap();
        nel.inject_interrupt(Interrupt::new(b, 3.0)).unwrap();
        nel.inject(send_at(b, 1.0)).unwrap();

        assert_eq!(nel.next_event_time(), 1.0);
        assert!(matches!(nel.pop(), Some(Event::Send(_))));
        match nel.pop() {
            Some(Event::Interrupt(i)) => assert_eq!(i.source, a),
            other => panic!("expected interrupt, got {other:?}"),
        }
        match nel.pop() {
            Some(Event::Interrupt(i)) => assert_eq!(i.source, b),
            other => panic!("expected interrupt, got {other:?}"),
        }
        assert!(matches!(nel.pop(), Some(Event::Send(_))));
    }

    #[test]
    fn duplicate_interrupts_collapse() {
        let a = ActorId::next();
        let mut nel = NextEventList::new();
        assert!(nel.inject(Event::Interrupt(Interrupt::new(a, 2.0))).unwrap());
        assert!(!nel.inject(Event::Interrupt(Interrupt::new(a, 2.0))).unwrap());
        assert!(nel.inject(Event::Interrupt(Interrupt::new(a, 3.0))).unwrap());
        assert_eq!(nel.len(), 2);
        assert_eq!(nel.num_moments(), 2);
    }

    #[test]
    fn past_injection_rejected() {
        let a = ActorId::next();
        let mut nel = NextEventList::new();
        nel.inject(send_at(a, 10.0)).unwrap();
        nel.pop().unwrap();

        // Same time as the current moment is fine
        nel.inject(send_at(a, 10.0)).unwrap();
        let err = nel.inject(send_at(a, 9.0)).unwrap_err();
        assert_eq!(err.0, "New message time in the past");
        assert!(nel.inject(send_at(a, f64::NAN)).is_err());

        nel.clear();
        nel.inject(send_at(a, 0.0)).unwrap();
    }
}
