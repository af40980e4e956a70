//! Walkthrough scenarios for `pledge demo`
//!
//! Each scenario builds a small chain over producers that settle on later
//! scheduler turns, runs the scheduler until idle and returns a transcript of
//! what the handlers saw, stamped with the virtual time they saw it at.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use clap::ValueEnum;

use crate::runtime::cell::{Deferred, HandlerResult};
use crate::runtime::combinator::all;
use crate::runtime::scheduler;
use crate::runtime::value::Value;

/// A demo scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// One continuation on a delayed value
    Then,
    /// Values threaded through several continuations
    Chain,
    /// Two continuations on the same root
    Fanout,
    /// A handler returning another delayed computation
    Nested,
    /// A setup fault caught at the end of a chain
    Catch,
    /// A rejection nobody handles
    Uncaught,
    /// Cleanup on success, then the value passes on
    Finally,
    /// Join three delayed values
    All,
    /// Join where one member rejects
    AllError,
    /// Join mixing a delayed value and plain values
    AllMixed,
}

impl Scenario {
    /// Every scenario, in help order.
    pub const ALL: [Scenario; 10] = [
        Scenario::Then,
        Scenario::Chain,
        Scenario::Fanout,
        Scenario::Nested,
        Scenario::Catch,
        Scenario::Uncaught,
        Scenario::Finally,
        Scenario::All,
        Scenario::AllError,
        Scenario::AllMixed,
    ];
}

impl fmt::Display for Scenario {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => write!(f, "{}", value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

/// Lines recorded by handlers during a scenario.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Transcript {
    /// Record `message` at the current virtual time.
    pub fn record(
        &self,
        message: impl fmt::Display,
    ) {
        let stamp = scheduler::now().as_millis();
        self.lines
            .borrow_mut()
            .push(format!("[{:>5}ms] {}", stamp, message));
    }

    /// Snapshot of the recorded lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

/// Run `scenario` to completion and return its transcript.
///
/// The current thread's scheduler is reset first.
pub fn run(scenario: Scenario) -> Vec<String> {
    scheduler::reset();
    let transcript = Transcript::default();
    transcript.record(format!("scenario {}", scenario));

    let tail = build(scenario, &transcript);
    let stats = scheduler::run();

    match tail.outcome() {
        Some(outcome) => transcript.record(format!("tail {} with {}", tail.state(), outcome)),
        None => transcript.record(format!("tail still {}", tail.state())),
    }
    transcript.record(format!(
        "idle after {} tasks ({} failed)",
        stats.executed, stats.failed
    ));
    transcript.lines()
}

/// A root resolving with `value` after `ms` of virtual time.
fn later(
    ms: u64,
    value: impl Into<Value>,
) -> Deferred {
    let value = value.into();
    Deferred::new(move |resolve, _| {
        scheduler::schedule_after(Duration::from_millis(ms), move || resolve.resolve(value));
    })
}

/// A root rejecting with `error` after `ms` of virtual time.
fn fails_later(
    ms: u64,
    error: impl Into<Value>,
) -> Deferred {
    let error = error.into();
    Deferred::new(move |_, reject| {
        scheduler::schedule_after(Duration::from_millis(ms), move || reject.reject(error));
    })
}

fn add(
    v: &Value,
    n: i64,
) -> i64 {
    v.to_int().unwrap_or(0) + n
}

fn build(
    scenario: Scenario,
    out: &Transcript,
) -> Deferred {
    let log = out.clone();
    match scenario {
        Scenario::Then => later(1000, 1).then(move |v| log.record(format!("got {}", v))),
        Scenario::Chain => later(1000, 1)
            .then(|v| add(&v, 1))
            .then(|v| add(&v, 1))
            .then(move |v| log.record(format!("got {}", v))),
        Scenario::Fanout => {
            let root = later(1000, 1);
            let first = log.clone();
            root.then(move |v| first.record(format!("first sees {}", v)));
            root.then(move |v| log.record(format!("second sees {}", v)))
        }
        Scenario::Nested => later(1000, 1)
            .then(|v| later(1000, add(&v, 0) * 2))
            .then(move |v| log.record(format!("got {}", v))),
        Scenario::Catch => Deferred::new(|_, _| Err::<(), _>("Whoops1!"))
            .then(|v| v)
            .then(|v| v)
            .catch(move |e| log.record(format!("caught {}", e))),
        Scenario::Uncaught => {
            let seen = log.clone();
            fails_later(1000, "Whoops2!")
                .then(move |v| seen.record(format!("never printed {}", v)))
                .then(|v| v)
        }
        Scenario::Finally => {
            let cleanup = log.clone();
            later(1000, "done")
                .finally(move || cleanup.record("cleanup"))
                .then(move |v| log.record(format!("after cleanup {}", v)))
        }
        Scenario::All => all(vec![later(3000, 1), later(1000, 2), later(2000, 3)])
            .then(move |v| log.record(format!("joined {}", v))),
        Scenario::AllError => all(vec![fails_later(1000, "E"), later(2000, 2)])
            .then(|v| v)
            .catch(move |e| log.record(format!("join failed with {}", e))),
        Scenario::AllMixed => all(vec![
            HandlerResult::from(later(1000, 4)),
            5.into(),
            6.into(),
        ])
        .then(move |v| log.record(format!("joined {}", v))),
    }
}
