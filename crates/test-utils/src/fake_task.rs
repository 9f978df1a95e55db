//! Scripted tasks that record what the scheduler did with them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use dagexec::{ExecutionResults, NodeId, Task, TaskFuture, TaskProvider};

/// What a fake task does on each invocation.
#[derive(Debug, Clone, Default)]
pub struct FakeScript {
    /// Fail this many invocations, then succeed.
    pub fail_first: u32,
    pub fail_always: bool,
    /// Sleep inside every invocation.
    pub sleep: Option<Duration>,
    /// Override the execution gate; `None` keeps the default.
    pub gate: Option<bool>,
    pub timeout: Option<Duration>,
}

impl FakeScript {
    pub fn succeed() -> Self {
        Self::default()
    }

    pub fn failing(times: u32) -> Self {
        Self {
            fail_first: times,
            ..Self::default()
        }
    }

    pub fn failing_always() -> Self {
        Self {
            fail_always: true,
            ..Self::default()
        }
    }

    pub fn skipped() -> Self {
        Self {
            gate: Some(false),
            ..Self::default()
        }
    }

    pub fn sleeping(mut self, d: Duration) -> Self {
        self.sleep = Some(d);
        self
    }

    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout = Some(d);
        self
    }
}

/// Something that happened to a fake task, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<T> {
    Started(T),
    Finished(T),
}

/// Shared log of every fake task invocation.
#[derive(Debug)]
pub struct Recorder<T> {
    events: Mutex<Vec<(Event<T>, Instant)>>,
    surface: Mutex<Vec<(T, bool)>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl<T: NodeId> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            surface: Mutex::new(Vec::new()),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
        }
    }
}

impl<T: NodeId> Recorder<T> {
    /// Returns the 1-based invocation number for `id`.
    fn on_start(&self, id: &T) -> u32 {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        let mut events = self.events.lock().unwrap();
        events.push((Event::Started(id.clone()), Instant::now()));
        events
            .iter()
            .filter(|(e, _)| *e == Event::Started(id.clone()))
            .count() as u32
    }

    fn on_finish(&self, id: &T) {
        self.events
            .lock()
            .unwrap()
            .push((Event::Finished(id.clone()), Instant::now()));
    }

    fn on_surface(&self, id: &T, surface: bool) {
        self.surface.lock().unwrap().push((id.clone(), surface));
    }

    pub fn events(&self) -> Vec<Event<T>> {
        self.events.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
    }

    /// Ids in the order their invocations started (repeats for retries).
    pub fn started(&self) -> Vec<T> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(id) => Some(id),
                Event::Finished(_) => None,
            })
            .collect()
    }

    pub fn invocations(&self, id: &T) -> u32 {
        self.started().iter().filter(|s| *s == id).count() as u32
    }

    /// Start instants of every invocation of `id`.
    pub fn start_times(&self, id: &T) -> Vec<Instant> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == Event::Started(id.clone()))
            .map(|(_, at)| *at)
            .collect()
    }

    /// `set_surface_errors` values received by `id`, in order.
    pub fn surface_flags(&self, id: &T) -> Vec<bool> {
        self.surface
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == id)
            .map(|(_, flag)| *flag)
            .collect()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    /// Whether the last invocation of `first` finished before any invocation
    /// of `after` started.
    pub fn finished_before_started(&self, first: &T, after: &T) -> bool {
        let events = self.events();
        let last_finish = events
            .iter()
            .rposition(|e| *e == Event::Finished(first.clone()));
        let first_start = events
            .iter()
            .position(|e| *e == Event::Started(after.clone()));
        match (last_finish, first_start) {
            (Some(f), Some(s)) => f < s,
            (_, None) => true,
            (None, Some(_)) => false,
        }
    }
}

/// Decrements the running count even when the attempt is dropped mid-sleep.
struct RunningGuard<'a, T>(&'a Recorder<T>);

impl<T> Drop for RunningGuard<'_, T> {
    fn drop(&mut self) {
        self.0.running.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct FakeTask<T> {
    id: T,
    script: FakeScript,
    recorder: Arc<Recorder<T>>,
}

impl<T: NodeId> Task<T, String> for FakeTask<T> {
    fn execute(&self) -> TaskFuture<'_, String> {
        Box::pin(async move {
            let n = self.recorder.on_start(&self.id);
            let _guard = RunningGuard(&self.recorder);

            if let Some(d) = self.script.sleep {
                tokio::time::sleep(d).await;
            }
            self.recorder.on_finish(&self.id);

            if self.script.fail_always || n <= self.script.fail_first {
                return Err(anyhow!("{} failed on attempt {}", self.id, n));
            }
            Ok(format!("done:{}", self.id))
        })
    }

    fn should_execute(&self, parent_results: &ExecutionResults<T, String>) -> bool {
        match self.script.gate {
            Some(gate) => gate,
            None => !parent_results.all_skipped(),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        self.script.timeout
    }

    fn set_surface_errors(&self, surface: bool) {
        self.recorder.on_surface(&self.id, surface);
    }
}

/// Hands out [`FakeTask`]s: a per-id script, or the default one.
pub struct FakeTaskProvider<T> {
    scripts: HashMap<T, FakeScript>,
    default: FakeScript,
    recorder: Arc<Recorder<T>>,
}

impl<T: NodeId> Default for FakeTaskProvider<T> {
    fn default() -> Self {
        Self {
            scripts: HashMap::new(),
            default: FakeScript::succeed(),
            recorder: Arc::new(Recorder::default()),
        }
    }
}

impl<T: NodeId> FakeTaskProvider<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: T, script: FakeScript) -> Self {
        self.scripts.insert(id, script);
        self
    }

    pub fn with_default(mut self, script: FakeScript) -> Self {
        self.default = script;
        self
    }

    pub fn recorder(&self) -> Arc<Recorder<T>> {
        Arc::clone(&self.recorder)
    }
}

impl<T: NodeId> TaskProvider<T, String> for FakeTaskProvider<T> {
    fn provide_task(&self, id: &T) -> Arc<dyn Task<T, String>> {
        let script = self.scripts.get(id).cloned().unwrap_or_else(|| self.default.clone());
        Arc::new(FakeTask {
            id: id.clone(),
            script,
            recorder: Arc::clone(&self.recorder),
        })
    }
}
