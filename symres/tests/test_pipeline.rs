use std::collections::HashSet;
use std::num::NonZeroU64;
use std::sync::{Arc, Mutex};

use symres::domain::{EngineError, Frame, HandleError, PipelineError, Record, ResolveError};
use symres::pipeline::{self, PipelineOptions};
use symres::symbolization::{EngineLoader, ResolverHandle, SymbolEngine};

/// Everything the scripted engine saw, in order
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Open,
    Close,
    Resolve(String),
}

#[derive(Clone, Default)]
struct ScriptedLoader {
    events: Arc<Mutex<Vec<Event>>>,
    unresolvable: HashSet<String>,
    /// Offsets the engine answers with no frames at all
    frameless: HashSet<String>,
    inlined: bool,
    /// Opens with this 1-based number or later fail
    fail_from_open: Option<usize>,
}

struct ScriptedEngine {
    events: Arc<Mutex<Vec<Event>>>,
    unresolvable: HashSet<String>,
    frameless: HashSet<String>,
    inlined: bool,
}

impl ScriptedLoader {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl EngineLoader for ScriptedLoader {
    type Engine = ScriptedEngine;

    fn open(&self) -> Result<ScriptedEngine, EngineError> {
        let mut events = self.events.lock().unwrap();
        let opens = events.iter().filter(|e| **e == Event::Open).count() + 1;
        if self.fail_from_open.is_some_and(|n| opens >= n) {
            return Err(std::io::Error::other("vmlinux disappeared").into());
        }
        events.push(Event::Open);

        Ok(ScriptedEngine {
            events: Arc::clone(&self.events),
            unresolvable: self.unresolvable.clone(),
            frameless: self.frameless.clone(),
            inlined: self.inlined,
        })
    }
}

impl SymbolEngine for ScriptedEngine {
    fn resolve(&mut self, offset: &str) -> Result<Vec<Frame>, ResolveError> {
        self.events.lock().unwrap().push(Event::Resolve(offset.to_string()));

        if self.unresolvable.contains(offset) {
            return Err(ResolveError::NotFound(offset.to_string()));
        }
        if self.frameless.contains(offset) {
            return Ok(Vec::new());
        }

        let mut frames = vec![Frame::new(format!("fn_{offset}"), "kernel/sched/core.c", 100)];
        if self.inlined {
            frames.push(Frame::new("caller", "kernel/sched/fair.c", 200));
        }
        Ok(frames)
    }

    fn close(self) -> Result<(), EngineError> {
        self.events.lock().unwrap().push(Event::Close);
        Ok(())
    }
}

fn records(pairs: &[(&str, &str)]) -> Vec<Record> {
    pairs.iter().map(|(name, address)| Record::new(*name, *address)).collect()
}

fn run(
    loader: &ScriptedLoader,
    records: &[Record],
    threshold: Option<u64>,
    include_inlines: bool,
) -> Result<String, PipelineError> {
    let handle = ResolverHandle::open(loader.clone(), threshold.and_then(NonZeroU64::new))?;
    let options = PipelineOptions { include_inlines, ..PipelineOptions::default() };
    let report = pipeline::run(records, handle, options, Vec::new())?;
    Ok(String::from_utf8(report.output).expect("output is UTF-8"))
}

#[test]
fn test_recycle_before_every_request_with_threshold_one() {
    let loader = ScriptedLoader::default();
    let records = records(&[("foo", "0x1000"), ("bar", "0x2000")]);

    let output = run(&loader, &records, Some(1), false).unwrap();

    assert_eq!(
        output,
        "0x1000 : fn_0x1000 @ kernel/sched/core.c 100\n\
         0x2000 : fn_0x2000 @ kernel/sched/core.c 100\n"
    );
    assert_eq!(
        loader.events(),
        vec![
            Event::Open,
            Event::Close,
            Event::Open,
            Event::Resolve("0x1000".to_string()),
            Event::Close,
            Event::Open,
            Event::Resolve("0x2000".to_string()),
        ]
    );
}

#[test]
fn test_failure_does_not_stop_later_addresses() {
    let loader = ScriptedLoader {
        unresolvable: HashSet::from(["0x2000".to_string()]),
        ..ScriptedLoader::default()
    };
    let records = records(&[("foo", "0x1000"), ("bar", "0x2000"), ("baz", "0x3000")]);

    let output = run(&loader, &records, None, false).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "0x1000 : fn_0x1000 @ kernel/sched/core.c 100");
    assert!(lines[1].starts_with("0x2000 : bar Error resolving address"));
    assert!(lines[1].contains("0x2000"));
    assert_eq!(lines[2], "0x3000 : fn_0x3000 @ kernel/sched/core.c 100");
}

#[test]
fn test_frameless_answer_is_reported_and_run_continues() {
    let loader = ScriptedLoader {
        frameless: HashSet::from(["0x2000".to_string()]),
        ..ScriptedLoader::default()
    };
    let records = records(&[("foo", "0x1000"), ("bar", "0x2000"), ("baz", "0x3000")]);

    let output = run(&loader, &records, None, true).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(
        lines,
        vec![
            "0x1000 : fn_0x1000 @ kernel/sched/core.c 100",
            "0x2000 : bar Error resolving address no symbol information for 0x2000",
            "0x3000 : fn_0x3000 @ kernel/sched/core.c 100",
        ]
    );
}

#[test]
fn test_output_follows_enqueue_order() {
    let loader = ScriptedLoader::default();
    let addresses: Vec<String> = (0..500).map(|i| format!("{:#x}", 0x1000 + i * 0x10)).collect();
    let records: Vec<Record> =
        addresses.iter().enumerate().map(|(i, a)| Record::new(format!("sym{i}"), a)).collect();

    let output = run(&loader, &records, Some(64), false).unwrap();
    let printed: Vec<&str> =
        output.lines().map(|line| line.split(" : ").next().unwrap()).collect();

    assert_eq!(printed, addresses);
}

#[test]
fn test_inlined_frames_only_when_enabled() {
    let loader = ScriptedLoader { inlined: true, ..ScriptedLoader::default() };
    let records = records(&[("foo", "0x1000")]);

    let with = run(&loader, &records, None, true).unwrap();
    assert_eq!(
        with,
        "0x1000 : fn_0x1000 @ kernel/sched/core.c 100\n\
         0x1000 : Inlined by caller @ kernel/sched/fair.c 200\n"
    );

    let without = run(&loader, &records, None, false).unwrap();
    assert_eq!(without, "0x1000 : fn_0x1000 @ kernel/sched/core.c 100\n");
}

#[test]
fn test_empty_record_set_terminates() {
    let loader = ScriptedLoader::default();
    let output = run(&loader, &[], Some(1), true).unwrap();

    assert!(output.is_empty());
    assert_eq!(loader.events(), vec![Event::Open]);
}

#[test]
fn test_report_counters() {
    let loader = ScriptedLoader {
        unresolvable: HashSet::from(["0x2".to_string()]),
        inlined: true,
        ..ScriptedLoader::default()
    };
    let records = records(&[("a", "0x1"), ("b", "0x2"), ("c", "0x3"), ("d", "0x4")]);

    let handle = ResolverHandle::open(loader.clone(), NonZeroU64::new(2)).unwrap();
    let options = PipelineOptions { include_inlines: true, ..PipelineOptions::default() };
    let report = pipeline::run(&records, handle, options, Vec::new()).unwrap();

    assert_eq!(report.stats.jobs, 4);
    assert_eq!(report.stats.resolved, 3);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.inlined, 3);
    assert_eq!(report.recycles, 2);
}

#[test]
fn test_reopen_failure_ends_run_without_hanging() {
    // Far more records than queue slots, so the producer is blocked when the
    // consumer gives up
    let loader = ScriptedLoader { fail_from_open: Some(3), ..ScriptedLoader::default() };
    let records: Vec<Record> =
        (0..1000).map(|i| Record::new(format!("sym{i}"), format!("{:#x}", i + 1))).collect();

    let result = run(&loader, &records, Some(10), false);

    match result {
        Err(PipelineError::Handle(err @ HandleError::Reopen { requests: 20, .. })) => {
            assert!(err.is_fatal());
        }
        other => panic!("expected a fatal reopen error, got {other:?}"),
    }

    let resolved = loader.events().iter().filter(|e| matches!(e, Event::Resolve(_))).count();
    assert_eq!(resolved, 19);
}

#[test]
fn test_initial_open_failure() {
    let loader = ScriptedLoader { fail_from_open: Some(1), ..ScriptedLoader::default() };
    let result = ResolverHandle::open(loader, NonZeroU64::new(1));
    assert!(matches!(result, Err(HandleError::Open(_))));
}
