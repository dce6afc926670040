//! Statechart interpreter core.
//!
//! A [`Machine`] owns the mutable half of a statechart (active leaf,
//! context, live invocations, history) and steps it against a shared
//! [`MachineDefinition`]. Every step works on a draft that is committed only
//! when the whole macrostep succeeds, so a failing guard or action leaves
//! the machine untouched.

use super::configuration::StateConfiguration;
use super::error::MachineError;
use crate::chart::{
    Action, InvocationId, MachineDefinition, NodeId, PendingInvocation, TransitionDef,
    TransitionKey,
};
use crate::config::EngineConfig;
use crate::core::{Event, ServiceError, StateHistory, StatePath, StateTransition, Trigger};
use chrono::Utc;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Listener<C> = Box<dyn Fn(&StateConfiguration<C>) + Send + Sync>;

#[derive(Clone, Copy, Debug)]
struct LiveInvocation {
    id: InvocationId,
    node: NodeId,
    service: &'static str,
}

/// A running instance of a machine definition.
pub struct Machine<C, E, Env> {
    definition: Arc<MachineDefinition<C, E, Env>>,
    config: EngineConfig,
    started: bool,
    leaf: NodeId,
    context: C,
    invocations: Vec<LiveInvocation>,
    pending: Vec<PendingInvocation<Env>>,
    history: StateHistory,
    listeners: Vec<Listener<C>>,
}

impl<C, E, Env> Machine<C, E, Env>
where
    C: Clone + Send + Sync + 'static,
    E: Event,
    Env: Clone + Send + Sync + 'static,
{
    /// Machine starting from the definition's initial context.
    pub fn new(definition: Arc<MachineDefinition<C, E, Env>>, config: EngineConfig) -> Self {
        let context = definition.initial_context().clone();
        Self::with_context(definition, context, config)
    }

    /// Machine starting from `context` instead of the definition's.
    pub fn with_context(
        definition: Arc<MachineDefinition<C, E, Env>>,
        context: C,
        config: EngineConfig,
    ) -> Self {
        let history = match config.history_limit {
            Some(limit) => StateHistory::with_limit(limit),
            None => StateHistory::new(),
        };
        let leaf = definition.root();
        Self {
            definition,
            config,
            started: false,
            leaf,
            context,
            invocations: Vec::new(),
            pending: Vec::new(),
            history,
            listeners: Vec::new(),
        }
    }

    pub fn definition(&self) -> &Arc<MachineDefinition<C, E, Env>> {
        &self.definition
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Snapshot of the active path and context.
    pub fn configuration(&self) -> StateConfiguration<C> {
        let definition = &self.definition;
        let mut next_events: Vec<&'static str> = Vec::new();
        for node in definition.ancestors(self.leaf) {
            for kind in definition.node(node).event_kinds() {
                if !next_events.contains(&kind) {
                    next_events.push(kind);
                }
            }
        }

        let leaf = definition.node(self.leaf);
        StateConfiguration {
            value: leaf.path().clone(),
            context: self.context.clone(),
            next_events,
            done: leaf.is_final() && leaf.parent() == Some(definition.root()),
        }
    }

    /// Register a listener called with every new configuration, in
    /// registration order.
    pub fn on_transition<F>(&mut self, listener: F)
    where
        F: Fn(&StateConfiguration<C>) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Drain the invocations started since the last call.
    ///
    /// The caller runs each one and reports its outcome through
    /// [`notify_service_result`](Self::notify_service_result).
    pub fn take_invocations(&mut self) -> Vec<PendingInvocation<Env>> {
        std::mem::take(&mut self.pending)
    }

    /// Whether `id` still belongs to an active state.
    pub fn is_live(&self, id: InvocationId) -> bool {
        self.invocations.iter().any(|live| live.id == id)
    }

    /// Whether sending `event` now would select a transition.
    ///
    /// Guards are evaluated; nothing runs. A guard fault counts as `false`.
    pub fn can(&self, event: &E) -> bool {
        if !self.started {
            return false;
        }
        matches!(
            select(
                &self.definition,
                &self.context,
                self.leaf,
                TransitionKey::Event(event.kind())
            ),
            Ok(Some(_))
        )
    }

    /// Enter the initial path and settle eventless and completion
    /// transitions.
    pub async fn start(&mut self, env: &Env) -> Result<StateConfiguration<C>, MachineError> {
        if self.started {
            return Err(MachineError::AlreadyStarted);
        }

        let definition = Arc::clone(&self.definition);
        let stepper = Stepper {
            definition: &definition,
            env,
            limit: self.config.max_microsteps,
        };
        let mut draft = self.draft();
        if let Err(error) = stepper.initialize(&mut draft).await {
            warn!(machine = definition.id(), error = %error, "Start failed");
            return Err(error);
        }

        self.commit(draft);
        self.started = true;
        let configuration = self.configuration();
        info!(machine = definition.id(), state = %configuration.value, "Machine started");
        self.notify(&configuration);
        Ok(configuration)
    }

    /// Process one external event.
    ///
    /// An event nothing on the active path handles is a no-op: the current
    /// configuration is returned and listeners are not called.
    pub async fn send(&mut self, event: E, env: &Env) -> Result<StateConfiguration<C>, MachineError> {
        if !self.started {
            return Err(MachineError::NotStarted);
        }
        let origin = self.leaf;
        self.step(origin, Trigger::Event(event), None, env).await
    }

    /// Deliver the outcome of an invocation.
    ///
    /// Results for invocations whose state has already been exited, or that
    /// were already resolved, are discarded.
    pub async fn notify_service_result(
        &mut self,
        id: InvocationId,
        outcome: Result<Value, ServiceError>,
        env: &Env,
    ) -> Result<StateConfiguration<C>, MachineError> {
        if !self.started {
            return Err(MachineError::NotStarted);
        }

        let Some(live) = self.invocations.iter().find(|live| live.id == id).copied() else {
            debug!(
                machine = self.definition.id(),
                invocation = %id,
                "Discarding result of inactive invocation"
            );
            return Ok(self.configuration());
        };

        let service = live.service.to_string();
        let trigger = match outcome {
            Ok(data) => Trigger::ServiceDone { service, data },
            Err(error) => Trigger::ServiceError { service, error },
        };
        self.step(live.node, trigger, Some(id), env).await
    }

    async fn step(
        &mut self,
        origin: NodeId,
        trigger: Trigger<E>,
        resolved: Option<InvocationId>,
        env: &Env,
    ) -> Result<StateConfiguration<C>, MachineError> {
        let definition = Arc::clone(&self.definition);
        let stepper = Stepper {
            definition: &definition,
            env,
            limit: self.config.max_microsteps,
        };

        let mut draft = self.draft();
        if let Some(id) = resolved {
            draft.invocations.retain(|live| live.id != id);
        }

        let trigger_name = trigger.name();
        let changed = match stepper.process(&mut draft, origin, trigger).await {
            Ok(changed) => changed,
            Err(error) => {
                warn!(
                    machine = definition.id(),
                    trigger = %trigger_name,
                    error = %error,
                    "Step failed, keeping previous configuration"
                );
                return Err(error);
            }
        };

        self.commit(draft);
        let configuration = self.configuration();
        if changed {
            self.notify(&configuration);
        } else {
            debug!(
                machine = definition.id(),
                state = %configuration.value,
                trigger = %trigger_name,
                "No transition selected"
            );
        }
        Ok(configuration)
    }

    fn draft(&self) -> Draft<C, E, Env> {
        Draft {
            leaf: self.leaf,
            context: self.context.clone(),
            invocations: self.invocations.clone(),
            spawned: Vec::new(),
            cancelled: Vec::new(),
            history: self.history.clone(),
            queue: VecDeque::new(),
            microsteps: 0,
        }
    }

    fn commit(&mut self, draft: Draft<C, E, Env>) {
        let Draft {
            leaf,
            context,
            invocations,
            spawned,
            cancelled,
            history,
            ..
        } = draft;

        self.leaf = leaf;
        self.context = context;
        self.invocations = invocations;
        self.pending.retain(|pending| !cancelled.contains(&pending.id()));
        self.pending.extend(spawned);
        self.history = history;
    }

    fn notify(&self, configuration: &StateConfiguration<C>) {
        for listener in &self.listeners {
            listener(configuration);
        }
    }
}

impl<C, E, Env> fmt::Debug for Machine<C, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.definition.id())
            .field("state", self.definition.node(self.leaf).path())
            .field("started", &self.started)
            .field("invocations", &self.invocations.len())
            .finish()
    }
}

/// Working copy of the mutable state for one macrostep.
struct Draft<C, E, Env> {
    leaf: NodeId,
    context: C,
    invocations: Vec<LiveInvocation>,
    spawned: Vec<PendingInvocation<Env>>,
    cancelled: Vec<InvocationId>,
    history: StateHistory,
    queue: VecDeque<(NodeId, Trigger<E>)>,
    microsteps: usize,
}

impl<C, E, Env> Draft<C, E, Env> {
    fn cancel(&mut self, id: InvocationId) {
        self.invocations.retain(|live| live.id != id);
        self.spawned.retain(|pending| pending.id() != id);
        self.cancelled.push(id);
    }
}

/// First enabled transition for `key`, starting at `origin`.
///
/// Per node, transitions are tried in declaration order. Keys that bubble
/// continue with the parent when no transition of a node passes its guard.
fn select<'d, C, E, Env>(
    definition: &'d MachineDefinition<C, E, Env>,
    context: &C,
    origin: NodeId,
    key: TransitionKey,
) -> Result<Option<(NodeId, &'d TransitionDef<C, E, Env>)>, MachineError> {
    let candidates: Vec<NodeId> = if key.bubbles() {
        definition.ancestors(origin).collect()
    } else {
        vec![origin]
    };

    for node in candidates {
        for transition in definition.node(node).transitions_for(key) {
            let enabled = transition.is_enabled(context).map_err(|fault| MachineError::GuardFailed {
                guard: transition.guard().map(|g| g.name()).unwrap_or_default().to_string(),
                state: definition.node(node).path().to_string(),
                message: fault.message().to_string(),
            })?;
            if enabled {
                return Ok(Some((node, transition)));
            }
        }
    }
    Ok(None)
}

struct Stepper<'a, C, E, Env> {
    definition: &'a MachineDefinition<C, E, Env>,
    env: &'a Env,
    limit: usize,
}

impl<'a, C, E, Env> Stepper<'a, C, E, Env>
where
    C: Clone + Send + Sync + 'static,
    E: Event,
    Env: Clone + Send + Sync + 'static,
{
    async fn initialize(&self, draft: &mut Draft<C, E, Env>) -> Result<(), MachineError> {
        let root = self.definition.root();
        let from = self.definition.node(root).path().clone();
        let trigger = Trigger::Start;

        let entered = self.definition.initial_descent(root);
        self.enter(draft, &entered, &trigger).await?;
        self.record(draft, from, &trigger);
        self.settle(draft).await
    }

    /// Select and take a transition for `trigger` at `origin`, then settle.
    /// Returns whether anything was taken.
    async fn process(
        &self,
        draft: &mut Draft<C, E, Env>,
        origin: NodeId,
        trigger: Trigger<E>,
    ) -> Result<bool, MachineError> {
        let Some(key) = TransitionKey::for_trigger(&trigger) else {
            return Ok(false);
        };
        let Some((source, transition)) = select(self.definition, &draft.context, origin, key)? else {
            return Ok(false);
        };

        self.microstep(draft, source, transition, &trigger).await?;
        self.settle(draft).await?;
        Ok(true)
    }

    /// Take eventless transitions and queued completions until none apply.
    async fn settle(&self, draft: &mut Draft<C, E, Env>) -> Result<(), MachineError> {
        loop {
            if let Some((source, transition)) =
                select(self.definition, &draft.context, draft.leaf, TransitionKey::Always)?
            {
                self.microstep(draft, source, transition, &Trigger::Always).await?;
                continue;
            }

            let Some((origin, trigger)) = draft.queue.pop_front() else {
                return Ok(());
            };
            if !self.definition.ancestors(draft.leaf).any(|node| node == origin) {
                debug!(
                    machine = self.definition.id(),
                    trigger = %trigger.name(),
                    "Dropping trigger for inactive state"
                );
                continue;
            }

            if let Some(key) = TransitionKey::for_trigger(&trigger) {
                if let Some((source, transition)) =
                    select(self.definition, &draft.context, origin, key)?
                {
                    self.microstep(draft, source, transition, &trigger).await?;
                }
            }
        }
    }

    async fn microstep(
        &self,
        draft: &mut Draft<C, E, Env>,
        source: NodeId,
        transition: &TransitionDef<C, E, Env>,
        trigger: &Trigger<E>,
    ) -> Result<(), MachineError> {
        draft.microsteps += 1;
        if draft.microsteps > self.limit {
            return Err(MachineError::MicrostepLimit { limit: self.limit });
        }

        let from = self.definition.node(draft.leaf).path().clone();
        match transition.target() {
            None => self.run_actions(draft, transition.actions(), trigger).await?,
            Some(target) => {
                let domain = self.definition.transition_domain(source, target);
                let exited: Vec<NodeId> = self
                    .definition
                    .ancestors(draft.leaf)
                    .take_while(|node| *node != domain)
                    .collect();
                for node in exited {
                    self.exit(draft, node, trigger).await?;
                }

                self.run_actions(draft, transition.actions(), trigger).await?;

                let entered = self.definition.entry_path(domain, target);
                self.enter(draft, &entered, trigger).await?;
            }
        }

        self.record(draft, from, trigger);
        Ok(())
    }

    async fn exit(
        &self,
        draft: &mut Draft<C, E, Env>,
        node: NodeId,
        trigger: &Trigger<E>,
    ) -> Result<(), MachineError> {
        let state = self.definition.node(node);
        self.run_actions(draft, &state.exit, trigger).await?;

        let owned: Vec<LiveInvocation> = draft
            .invocations
            .iter()
            .filter(|live| live.node == node)
            .copied()
            .collect();
        for live in owned {
            debug!(
                machine = self.definition.id(),
                invocation = %live.id,
                service = live.service,
                state = %state.path(),
                "Cancelling invocation"
            );
            draft.cancel(live.id);
        }
        Ok(())
    }

    async fn enter(
        &self,
        draft: &mut Draft<C, E, Env>,
        nodes: &[NodeId],
        trigger: &Trigger<E>,
    ) -> Result<(), MachineError> {
        for &node in nodes {
            let state = self.definition.node(node);
            self.run_actions(draft, &state.entry, trigger).await?;

            if let Some(service) = state.invoke() {
                let id = InvocationId::new();
                let effect = service.create(&draft.context, trigger);
                debug!(
                    machine = self.definition.id(),
                    invocation = %id,
                    service = service.id(),
                    state = %state.path(),
                    "Starting invocation"
                );
                draft.invocations.push(LiveInvocation {
                    id,
                    node,
                    service: service.id(),
                });
                draft
                    .spawned
                    .push(PendingInvocation::new(id, state.path().clone(), service.id(), effect));
            }
            draft.leaf = node;
        }

        let leaf = self.definition.node(draft.leaf);
        if leaf.is_final() {
            if let Some(parent) = leaf.parent().filter(|p| *p != self.definition.root()) {
                let state = self.definition.node(parent).path().clone();
                draft.queue.push_back((parent, Trigger::Done { state }));
            }
        }
        Ok(())
    }

    async fn run_actions(
        &self,
        draft: &mut Draft<C, E, Env>,
        actions: &[Action<C, E, Env>],
        trigger: &Trigger<E>,
    ) -> Result<(), MachineError> {
        for action in actions {
            let outcome = action.run(&draft.context, trigger, self.env).await;
            match outcome {
                Ok(Some(context)) => draft.context = context,
                Ok(None) => {}
                Err(fault) => {
                    return Err(MachineError::ActionFailed {
                        action: action.name().to_string(),
                        message: fault.message().to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    fn record(&self, draft: &mut Draft<C, E, Env>, from: StatePath, trigger: &Trigger<E>) {
        let to = self.definition.node(draft.leaf).path().clone();
        info!(
            machine = self.definition.id(),
            from = %from,
            to = %to,
            trigger = %trigger.name(),
            "Transition"
        );
        draft.history = draft.history.record(StateTransition {
            from,
            to,
            trigger: trigger.name(),
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{goto, MachineBuilder, ServiceBuilder, StateBuilder, TransitionBuilder};
    use crate::core::Fault;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stillwater::prelude::*;

    crate::event_enum! {
        enum Ev {
            Go => "GO",
            Load => "LOAD",
            Fail => "FAIL",
            Loop => "LOOP",
            Broken => "BROKEN",
            Cancel => "CANCEL",
            Bump => "BUMP",
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Ctx {
        count: u32,
        log: Vec<String>,
    }

    type To = TransitionBuilder<Ctx, Ev, ()>;
    type State = StateBuilder<Ctx, Ev, ()>;

    fn record(label: &'static str) -> Action<Ctx, Ev, ()> {
        Action::assign(label, move |c: &Ctx, _: &Trigger<Ev>| {
            let mut next = c.clone();
            next.log.push(label.to_string());
            Ok(next)
        })
    }

    fn definition() -> Arc<MachineDefinition<Ctx, Ev, ()>> {
        let definition = MachineBuilder::new("test", Ctx::default())
            .initial("Idle")
            .state(
                State::new("Idle")
                    .entry(record("enter:Idle"))
                    .exit(record("exit:Idle"))
                    .on("GO", To::to("Flow").action(record("go")))
                    .on("LOAD", goto("Loading"))
                    .on(
                        "FAIL",
                        To::to("Flow").action(Action::effect("explode", |_: &Ctx, _: &Trigger<Ev>| {
                            fail(Fault::new("boom")).boxed()
                        })),
                    )
                    .on("LOOP", goto("Ping"))
                    .on(
                        "BROKEN",
                        To::to("Flow").when_fallible("broken", |_: &Ctx| Err(Fault::new("bad guard"))),
                    )
                    .on(
                        "BUMP",
                        To::targetless().action(Action::assign("bump", |c: &Ctx, _: &Trigger<Ev>| {
                            Ok(Ctx {
                                count: c.count + 1,
                                ..c.clone()
                            })
                        })),
                    ),
            )
            .state(
                State::new("Flow")
                    .initial("Step")
                    .entry(record("enter:Flow"))
                    .exit(record("exit:Flow"))
                    .on("CANCEL", goto("Idle"))
                    .on("GO", goto("Idle"))
                    .on_done(goto("Finished"))
                    .child(
                        State::new("Step")
                            .entry(record("enter:Flow.Step"))
                            .exit(record("exit:Flow.Step"))
                            .on("GO", To::to("End").when("counted", |c: &Ctx| c.count > 0))
                            .on("GO", To::to("Other")),
                    )
                    .child(State::new("Other").on("GO", To::to("End").when("counted", |c: &Ctx| c.count > 0)))
                    .child(State::final_state("End")),
            )
            .state(State::new("Finished"))
            .state(
                State::new("Loading")
                    .on("CANCEL", goto("Idle"))
                    .invoke(
                        ServiceBuilder::new("fetch", |_: &Ctx, _: &Trigger<Ev>| {
                            pure(json!({ "count": 5 })).boxed()
                        })
                        .on_done(To::to("Ready").action(Action::assign(
                            "storeCount",
                            |c: &Ctx, t: &Trigger<Ev>| {
                                #[derive(serde::Deserialize)]
                                struct Payload {
                                    count: u32,
                                }
                                let payload: Payload = t.data_as()?;
                                Ok(Ctx {
                                    count: payload.count,
                                    ..c.clone()
                                })
                            },
                        )))
                        .on_error(goto("Failed")),
                    ),
            )
            .state(State::new("Ready"))
            .state(State::new("Failed"))
            .state(State::new("Ping").always(goto("Pong")))
            .state(State::new("Pong").always(goto("Ping")))
            .build()
            .unwrap();
        Arc::new(definition)
    }

    fn machine() -> Machine<Ctx, Ev, ()> {
        Machine::new(definition(), EngineConfig::default())
    }

    async fn started() -> Machine<Ctx, Ev, ()> {
        let mut machine = machine();
        machine.start(&()).await.unwrap();
        machine
    }

    #[tokio::test]
    async fn start_enters_initial_state() {
        let mut machine = machine();
        let config = machine.start(&()).await.unwrap();

        assert_eq!(config.value.to_string(), "Idle");
        assert_eq!(config.context.log, vec!["enter:Idle"]);
        assert!(config.handles("GO"));
        assert!(!config.done);
        assert_eq!(machine.history().len(), 1);
    }

    #[tokio::test]
    async fn lifecycle_errors() {
        let mut machine = machine();
        assert_eq!(machine.send(Ev::Go, &()).await, Err(MachineError::NotStarted));
        assert!(!machine.can(&Ev::Go));

        machine.start(&()).await.unwrap();
        assert_eq!(machine.start(&()).await, Err(MachineError::AlreadyStarted));
    }

    #[tokio::test]
    async fn actions_run_exit_then_transition_then_entry() {
        let mut machine = started().await;

        let config = machine.send(Ev::Go, &()).await.unwrap();
        assert_eq!(config.value.to_string(), "Flow.Step");
        assert_eq!(
            config.context.log,
            vec!["enter:Idle", "exit:Idle", "go", "enter:Flow", "enter:Flow.Step"]
        );

        let config = machine.send(Ev::Cancel, &()).await.unwrap();
        assert_eq!(config.value.to_string(), "Idle");
        assert_eq!(
            &config.context.log[5..],
            &["exit:Flow.Step", "exit:Flow", "enter:Idle"]
        );
    }

    #[tokio::test]
    async fn first_passing_guard_wins_and_failing_nodes_defer_to_parent() {
        let mut machine = started().await;
        machine.send(Ev::Go, &()).await.unwrap();

        // count is 0: the guarded GO fails, the second one is taken.
        let config = machine.send(Ev::Go, &()).await.unwrap();
        assert_eq!(config.value.to_string(), "Flow.Other");

        // Other's only GO fails its guard, so Flow handles it.
        let config = machine.send(Ev::Go, &()).await.unwrap();
        assert_eq!(config.value.to_string(), "Idle");
    }

    #[tokio::test]
    async fn final_child_completes_parent() {
        let mut machine = started().await;
        machine.send(Ev::Bump, &()).await.unwrap();
        machine.send(Ev::Go, &()).await.unwrap();

        let config = machine.send(Ev::Go, &()).await.unwrap();
        assert_eq!(config.value.to_string(), "Finished");

        let triggers: Vec<&str> = machine
            .history()
            .transitions()
            .map(|t| t.trigger.as_str())
            .collect();
        assert_eq!(triggers.last(), Some(&"done.state.Flow"));
    }

    #[tokio::test]
    async fn completion_propagates_through_every_level() {
        let definition = MachineBuilder::new("nested", Ctx::default())
            .initial("A")
            .state(
                State::new("A")
                    .initial("B")
                    .on_done(goto("Z"))
                    .child(
                        State::new("B")
                            .initial("C1")
                            .on_done(goto("Fin"))
                            .child(State::new("C1").on("GO", goto("C2")))
                            .child(State::final_state("C2")),
                    )
                    .child(State::final_state("Fin")),
            )
            .state(State::new("Z"))
            .build()
            .unwrap();
        let mut machine = Machine::new(Arc::new(definition), EngineConfig::default());
        machine.start(&()).await.unwrap();

        let config = machine.send(Ev::Go, &()).await.unwrap();
        assert_eq!(config.value.to_string(), "Z");

        let triggers: Vec<&str> = machine
            .history()
            .transitions()
            .map(|t| t.trigger.as_str())
            .collect();
        assert_eq!(&triggers[1..], &["GO", "done.state.A.B", "done.state.A"]);
    }

    #[tokio::test]
    async fn unhandled_event_is_a_no_op() {
        let mut machine = started().await;
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        machine.on_transition(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let before = machine.configuration();
        let after = machine.send(Ev::Cancel, &()).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(notified.load(Ordering::SeqCst), 0);
        assert!(!machine.can(&Ev::Cancel));
    }

    #[tokio::test]
    async fn targetless_transition_updates_context_only() {
        let mut machine = started().await;
        let config = machine.send(Ev::Bump, &()).await.unwrap();

        assert_eq!(config.value.to_string(), "Idle");
        assert_eq!(config.context.count, 1);
        assert_eq!(config.context.log, vec!["enter:Idle"]);
    }

    #[tokio::test]
    async fn action_fault_rolls_back() {
        let mut machine = started().await;
        let before = machine.configuration();
        let history = machine.history().len();

        let result = machine.send(Ev::Fail, &()).await;

        assert_eq!(
            result,
            Err(MachineError::ActionFailed {
                action: "explode".to_string(),
                message: "boom".to_string(),
            })
        );
        assert_eq!(machine.configuration(), before);
        assert_eq!(machine.history().len(), history);
    }

    #[tokio::test]
    async fn guard_fault_is_reported() {
        let mut machine = started().await;

        let result = machine.send(Ev::Broken, &()).await;

        assert_eq!(
            result,
            Err(MachineError::GuardFailed {
                guard: "broken".to_string(),
                state: "Idle".to_string(),
                message: "bad guard".to_string(),
            })
        );
        assert!(!machine.can(&Ev::Broken));
    }

    #[tokio::test]
    async fn eventless_cycle_hits_microstep_limit() {
        let config = EngineConfig {
            max_microsteps: 8,
            ..EngineConfig::default()
        };
        let mut machine = Machine::new(definition(), config);
        machine.start(&()).await.unwrap();

        let result = machine.send(Ev::Loop, &()).await;

        assert_eq!(result, Err(MachineError::MicrostepLimit { limit: 8 }));
        assert_eq!(machine.configuration().value.to_string(), "Idle");
    }

    #[tokio::test]
    async fn invocation_result_drives_done_transition() {
        let mut machine = started().await;
        machine.send(Ev::Load, &()).await.unwrap();

        let mut pending = machine.take_invocations();
        assert_eq!(pending.len(), 1);
        let invocation = pending.remove(0);
        assert_eq!(invocation.service(), "fetch");
        assert_eq!(invocation.state().to_string(), "Loading");
        assert!(machine.take_invocations().is_empty());

        let id = invocation.id();
        let outcome = invocation.run(&()).await;
        let config = machine.notify_service_result(id, outcome, &()).await.unwrap();

        assert_eq!(config.value.to_string(), "Ready");
        assert_eq!(config.context.count, 5);
        assert!(!machine.is_live(id));
    }

    #[tokio::test]
    async fn invocation_failure_drives_error_transition() {
        let mut machine = started().await;
        machine.send(Ev::Load, &()).await.unwrap();
        let id = machine.take_invocations()[0].id();

        let config = machine
            .notify_service_result(id, Err(ServiceError::new("offline")), &())
            .await
            .unwrap();

        assert_eq!(config.value.to_string(), "Failed");
    }

    #[tokio::test]
    async fn stale_results_are_dropped() {
        let mut machine = started().await;
        machine.send(Ev::Load, &()).await.unwrap();
        let id = machine.take_invocations()[0].id();
        machine.send(Ev::Cancel, &()).await.unwrap();
        assert!(!machine.is_live(id));

        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        machine.on_transition(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let before = machine.configuration();
        let after = machine
            .notify_service_result(id, Ok(json!({ "count": 9 })), &())
            .await
            .unwrap();

        assert_eq!(before, after);
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_invocations_are_not_handed_out() {
        let mut machine = started().await;
        machine.send(Ev::Load, &()).await.unwrap();
        machine.send(Ev::Cancel, &()).await.unwrap();

        assert!(machine.take_invocations().is_empty());
    }

    #[tokio::test]
    async fn listeners_see_every_change_in_order() {
        let mut machine = machine();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let first = Arc::clone(&seen);
        let second = Arc::clone(&seen);
        machine.on_transition(move |c| first.lock().unwrap().push(format!("1:{}", c.value)));
        machine.on_transition(move |c| second.lock().unwrap().push(format!("2:{}", c.value)));

        machine.start(&()).await.unwrap();
        machine.send(Ev::Go, &()).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["1:Idle", "2:Idle", "1:Flow.Step", "2:Flow.Step"]
        );
    }

    #[tokio::test]
    async fn history_respects_limit() {
        let config = EngineConfig {
            history_limit: Some(2),
            ..EngineConfig::default()
        };
        let mut machine = Machine::new(definition(), config);
        machine.start(&()).await.unwrap();
        for _ in 0..3 {
            machine.send(Ev::Bump, &()).await.unwrap();
        }

        assert_eq!(machine.history().len(), 2);
    }

    #[tokio::test]
    async fn can_agrees_with_guards() {
        let mut machine = started().await;
        assert!(machine.can(&Ev::Go));
        assert!(!machine.can(&Ev::Cancel));

        machine.send(Ev::Go, &()).await.unwrap();
        machine.send(Ev::Go, &()).await.unwrap();
        // Other's guard fails but Flow still handles GO.
        assert!(machine.can(&Ev::Go));
    }
}
