// src/engine/scheduler.rs

//! The DAG executor: owns the graph, drives the engine, applies the policy.
//!
//! A run goes through `Building -> Running -> Terminated`:
//!
//! - While `Building`, the graph is mutated through the `add_*` methods.
//! - `execute` validates the graph, submits every ready initial node and then
//!   sits in the wait loop, consuming one completed attempt at a time and
//!   applying [`decide`] to it.
//! - A continuation predicate is consulted before every batch of submissions
//!   and before every wait. When it returns `false` the engine is shut down
//!   and the call fails with [`DagexecError::ForcedStop`], leaving the phase at
//!   `Running`; [`DagExecutor::recover_execution`] picks the run up again.
//!
//! Results are recorded on the graph nodes. Processed/discontinued sets, the
//! outstanding-attempt counter and the error index live in the shared
//! [`SchedulerState`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{EngineOptions, ExecutionConfig};
use crate::dag::{validate_acyclic, Graph, Traversar};
use crate::engine::policy::{decide, Completion, Expansion, Retry, RetryKind};
use crate::engine::state::SchedulerState;
use crate::errors::{DagexecError, Result};
use crate::exec::{ExecutionEngine, ExecutionResult, ExecutionResults, Task, TaskProvider};
use crate::types::{ExecutionStatus, NodeId, Phase, TaskOutput};

/// Predicate consulted before submissions and waits; `false` forces a stop.
pub type Continuation = Arc<dyn Fn() -> bool + Send + Sync>;

pub struct DagExecutor<T: NodeId, R: TaskOutput> {
    graph: Graph<T, R>,
    state: Arc<SchedulerState<T, R>>,
    provider: Arc<dyn TaskProvider<T, R>>,
    options: EngineOptions,
    continuation: Continuation,
    engine: Option<ExecutionEngine<T, R>>,
    /// One task per node, fetched from the provider on first use.
    tasks: HashMap<T, Arc<dyn Task<T, R>>>,
    /// Nodes with an attempt submitted and not yet consumed.
    in_flight: HashSet<T>,
}

impl<T: NodeId, R: TaskOutput> fmt::Debug for DagExecutor<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DagExecutor")
            .field("nodes", &self.graph.len())
            .field("phase", &self.state.phase())
            .field("options", &self.options)
            .field("engine", &self.engine)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl<T: NodeId, R: TaskOutput> DagExecutor<T, R> {
    pub fn new(provider: impl TaskProvider<T, R> + 'static) -> Self {
        Self {
            graph: Graph::new(),
            state: Arc::new(SchedulerState::new()),
            provider: Arc::new(provider),
            options: EngineOptions::default(),
            continuation: Arc::new(|| true),
            engine: None,
            tasks: HashMap::new(),
            in_flight: HashSet::new(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_continuation<F>(mut self, continuation: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.continuation = Arc::new(continuation);
        self
    }

    /// Replace the continuation predicate, e.g. before recovering a run.
    pub fn set_continuation<F>(&mut self, continuation: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.continuation = Arc::new(continuation);
    }

    pub fn add_independent(&mut self, id: T) -> Result<()> {
        self.ensure_building()?;
        self.graph.add_independent(id);
        Ok(())
    }

    /// `after` runs only once `first` is done.
    pub fn add_dependency(&mut self, first: T, after: T) -> Result<()> {
        self.ensure_building()?;
        self.graph.add_dependency(first, after);
        Ok(())
    }

    pub fn add_as_dependent_on_all_leaf_nodes(&mut self, id: T) -> Result<()> {
        self.ensure_building()?;
        self.graph.add_as_dependent_on_all_leaf_nodes(id);
        Ok(())
    }

    pub fn add_as_dependency_to_all_initial_nodes(&mut self, id: T) -> Result<()> {
        self.ensure_building()?;
        self.graph.add_as_dependency_to_all_initial_nodes(id);
        Ok(())
    }

    pub fn graph(&self) -> &Graph<T, R> {
        &self.graph
    }

    /// Shared run state, readable from other threads while a run is active.
    pub fn state(&self) -> Arc<SchedulerState<T, R>> {
        Arc::clone(&self.state)
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Render the graph with `traversar`.
    pub fn print<V: Traversar>(&self, traversar: &V, sink: &mut dyn fmt::Write) -> fmt::Result {
        traversar.traverse(&self.graph, sink)
    }

    /// Run the graph to completion under `config`.
    pub async fn execute(&mut self, config: ExecutionConfig) -> Result<ExecutionResults<T, R>> {
        match self.state.phase() {
            Phase::Building => {}
            Phase::Running => return Err(DagexecError::AlreadyRunning),
            Phase::Terminated => return Err(DagexecError::AlreadyTerminated),
        }
        config.validate()?;
        self.options.validate()?;
        validate_acyclic(&self.graph)?;

        info!(
            nodes = self.graph.len(),
            behaviour = ?config.behaviour,
            retry_count = config.retry_count,
            workers = self.options.workers,
            "starting execution"
        );

        self.state.set_phase(Phase::Running);
        self.engine = Some(ExecutionEngine::new(self.options, self.state.error_index()));

        let initial = self.graph.initial_nodes();
        self.advance(initial, &config)?;
        self.wait_for_completion(&config).await?;
        Ok(self.finish())
    }

    /// Continue a run that was forcibly stopped.
    ///
    /// Results the stopped engine had already delivered are recorded first.
    /// Attempts it aborted are submitted again from the recomputed frontier.
    pub async fn recover_execution(
        &mut self,
        config: ExecutionConfig,
    ) -> Result<ExecutionResults<T, R>> {
        match self.state.phase() {
            Phase::Running => {}
            Phase::Building => return Err(DagexecError::NotStarted),
            Phase::Terminated => return Err(DagexecError::AlreadyTerminated),
        }
        config.validate()?;

        if let Some(mut stopped) = self.engine.take() {
            stopped.shutdown();
            for result in stopped.drain_completed() {
                self.record_recovered(result, &config);
            }
        }
        self.in_flight.clear();
        self.state.reset_unprocessed();
        self.engine = Some(ExecutionEngine::new(self.options, self.state.error_index()));

        let frontier = self.recovery_frontier(&config);
        info!(
            processed = self.state.processed_count(),
            frontier = frontier.len(),
            "recovering execution"
        );

        self.advance(frontier, &config)?;
        self.wait_for_completion(&config).await?;
        Ok(self.finish())
    }

    fn ensure_building(&self) -> Result<()> {
        match self.state.phase() {
            Phase::Building => Ok(()),
            _ => Err(DagexecError::GraphFrozen),
        }
    }

    fn ensure_continue(&mut self) -> Result<()> {
        if (self.continuation)() {
            return Ok(());
        }
        warn!(
            outstanding = self.state.unprocessed_count(),
            "continuation predicate returned false; stopping execution"
        );
        if let Some(engine) = self.engine.as_mut() {
            engine.shutdown();
        }
        Err(DagexecError::ForcedStop)
    }

    fn engine_mut(&mut self) -> Result<&mut ExecutionEngine<T, R>> {
        self.engine.as_mut().ok_or(DagexecError::EngineClosed)
    }

    /// A node is ready when it has no outcome yet, is not in flight, and all
    /// of its predecessors are processed.
    fn is_ready(&self, id: &T) -> bool {
        !self.state.is_processed(id)
            && !self.in_flight.contains(id)
            && self
                .graph
                .incoming_of(id)
                .iter()
                .all(|p| self.state.is_processed(p))
    }

    fn task_for(&mut self, id: &T) -> Arc<dyn Task<T, R>> {
        let provider = &self.provider;
        let task = self
            .tasks
            .entry(id.clone())
            .or_insert_with(|| provider.provide_task(id));
        Arc::clone(task)
    }

    fn parent_results(&self, id: &T) -> ExecutionResults<T, R> {
        self.graph
            .incoming_of(id)
            .iter()
            .filter_map(|p| self.graph.node(p).and_then(|node| node.to_result()))
            .collect()
    }

    /// Submit every ready node among `candidates`, skipping the ones whose
    /// gate refuses and cascading into their successors.
    fn advance(&mut self, candidates: Vec<T>, config: &ExecutionConfig) -> Result<()> {
        self.ensure_continue()?;

        let mut queue: VecDeque<T> = candidates.into();
        while let Some(id) = queue.pop_front() {
            if !self.is_ready(&id) {
                continue;
            }

            let task = self.task_for(&id);
            let parents = self.parent_results(&id);

            if task.should_execute(&parents) {
                let attempts = self.graph.node(&id).map_or(0, |n| n.attempts());
                task.set_surface_errors(!config.is_retrying() || attempts >= config.retry_count);

                self.state.increment_unprocessed();
                self.in_flight.insert(id.clone());
                debug!(node = %id, "submitting ready node");
                self.engine_mut()?.submit(id, task)?;
            } else {
                info!(node = %id, "execution gate declined; skipping node");
                if let Some(node) = self.graph.node_mut(&id) {
                    node.mark_skipped();
                }
                self.state.mark_processed(id.clone());
                queue.extend(self.graph.outgoing_of(&id).iter().cloned());
            }
        }
        Ok(())
    }

    async fn wait_for_completion(&mut self, config: &ExecutionConfig) -> Result<()> {
        while self.state.unprocessed_count() > 0 {
            self.ensure_continue()?;
            let result = self.engine_mut()?.process_result().await?;
            self.state.decrement_unprocessed();
            self.on_completion(result, config)?;
        }
        Ok(())
    }

    fn on_completion(&mut self, result: ExecutionResult<T, R>, config: &ExecutionConfig) -> Result<()> {
        let id = result.id.clone();
        let status = result.status;
        self.in_flight.remove(&id);
        let attempts = self.record(result);

        let any_in_error = self.engine_mut()?.is_any_task_in_error();
        let decision = decide(
            &Completion {
                status,
                attempts,
                any_in_error,
                has_discontinued: self.state.has_discontinued(),
            },
            config,
        );
        debug!(node = %id, %status, attempts, ?decision, "attempt processed");

        if decision.mark_processed {
            self.state.mark_processed(id.clone());
        }

        let mut frontier = Vec::new();
        if decision.resume_discontinued {
            frontier = self.state.take_discontinued();
            info!(resumed = frontier.len(), "errors cleared; resuming discontinued nodes");
        }

        let outgoing = self.graph.outgoing_of(&id).to_vec();
        match decision.expansion {
            Expansion::Expand => {
                frontier.extend(outgoing);
                self.advance(frontier, config)?;
            }
            Expansion::Defer => {
                debug!(node = %id, deferred = outgoing.len(), "task in error; deferring successors");
                self.state.add_discontinued(outgoing);
            }
            Expansion::Stop => {}
        }

        if let Some(retry) = decision.retry {
            self.resubmit(id, retry)?;
        }
        Ok(())
    }

    fn resubmit(&mut self, id: T, retry: Retry) -> Result<()> {
        let task = self.task_for(&id);
        task.set_surface_errors(retry.final_attempt);

        self.state.increment_unprocessed();
        self.in_flight.insert(id.clone());
        info!(node = %id, kind = ?retry.kind, final_attempt = retry.final_attempt, "retrying task");

        let engine = self.engine_mut()?;
        match retry.kind {
            RetryKind::Immediate => engine.submit_immediate_retry(id, task),
            RetryKind::Scheduled(delay) => engine.submit_scheduled_retry(id, task, delay),
        }
    }

    /// Store an attempt on its node and return the node's attempt count.
    fn record(&mut self, result: ExecutionResult<T, R>) -> u32 {
        match self.graph.node_mut(&result.id) {
            Some(node) => {
                node.record_attempt(result);
                node.attempts()
            }
            None => {
                warn!(node = %result.id, "result for a node not in the graph");
                0
            }
        }
    }

    /// Record a result delivered before a forced stop. Only bookkeeping is
    /// applied; successors are picked up by the recovery frontier.
    fn record_recovered(&mut self, result: ExecutionResult<T, R>, config: &ExecutionConfig) {
        let id = result.id.clone();
        let status = result.status;
        let attempts = self.record(result);

        let decision = decide(
            &Completion {
                status,
                attempts,
                any_in_error: self.state.has_errors(),
                has_discontinued: self.state.has_discontinued(),
            },
            config,
        );
        debug!(node = %id, %status, attempts, "recorded result delivered before stop");

        if decision.mark_processed {
            self.state.mark_processed(id.clone());
        }
        if decision.expansion == Expansion::Defer {
            let outgoing = self.graph.outgoing_of(&id).to_vec();
            self.state.add_discontinued(outgoing);
        }
    }

    /// Unprocessed nodes whose predecessors are all processed, reached from
    /// the initial nodes without descending below errored nodes (unless the
    /// run is non-terminating). While an error is present, discontinued
    /// nodes stay parked; otherwise they are released into the frontier.
    fn recovery_frontier(&self, config: &ExecutionConfig) -> Vec<T> {
        let state = &self.state;
        let non_terminating = config.is_non_terminating();

        let mut frontier = self.graph.non_processed_root_nodes(
            |id| state.is_processed(id),
            |node| non_terminating || node.status() != Some(ExecutionStatus::Errored),
        );
        if !non_terminating && state.has_errors() {
            frontier.retain(|id| !state.is_discontinued(id));
            return frontier;
        }

        let released = state.take_discontinued();
        if !released.is_empty() {
            info!(resumed = released.len(), "releasing discontinued nodes on recovery");
        }
        for id in released {
            if !frontier.contains(&id) {
                frontier.push(id);
            }
        }
        frontier
    }

    fn finish(&mut self) -> ExecutionResults<T, R> {
        self.state.set_phase(Phase::Terminated);
        if let Some(mut engine) = self.engine.take() {
            engine.shutdown();
        }

        let results: ExecutionResults<T, R> =
            self.graph.nodes().filter_map(|node| node.to_result()).collect();

        info!(
            reached = results.len(),
            succeeded = results.successful().len(),
            errored = results.errored().len(),
            skipped = results.skipped().len(),
            cancelled = results.cancelled().len(),
            "execution finished"
        );
        results
    }
}
