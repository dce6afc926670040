//! Async actor owning a [`Machine`].
//!
//! The interpreter serializes everything that touches the machine: events
//! from handles and results from invoked services go through one `select!`
//! loop, so a late service result can never race a user event. Services run
//! as separate tokio tasks against a clone of the environment.

use super::configuration::StateConfiguration;
use super::error::MachineError;
use super::machine::Machine;
use crate::chart::InvocationId;
use crate::core::{Event, ServiceError};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, info_span, warn, Instrument};

const COMMAND_BUFFER_SIZE: usize = 64;
const RESULT_BUFFER_SIZE: usize = 64;

type Reply<C> = oneshot::Sender<Result<StateConfiguration<C>, MachineError>>;

enum Command<C, E> {
    Send { event: E, reply: Option<Reply<C>> },
    Stop { reply: oneshot::Sender<()> },
}

struct Resolution {
    id: InvocationId,
    outcome: Result<Value, ServiceError>,
}

/// Runs a machine on its own task.
pub struct Interpreter<C, E, Env> {
    machine: Machine<C, E, Env>,
    env: Env,
    commands: mpsc::Receiver<Command<C, E>>,
    results_tx: mpsc::Sender<Resolution>,
    results: mpsc::Receiver<Resolution>,
}

impl<C, E, Env> Interpreter<C, E, Env>
where
    C: Clone + Send + Sync + 'static,
    E: Event,
    Env: Clone + Send + Sync + 'static,
{
    /// Start `machine` (unless already started) and move it onto a new task.
    ///
    /// Must be called inside a tokio runtime. The task ends when
    /// [`MachineHandle::stop`] is called or every handle is dropped.
    pub async fn spawn(
        mut machine: Machine<C, E, Env>,
        env: Env,
    ) -> Result<MachineHandle<C, E>, MachineError> {
        let initial = if machine.is_started() {
            machine.configuration()
        } else {
            machine.start(&env).await?
        };

        let (state_tx, state_rx) = watch::channel(initial);
        machine.on_transition(move |configuration| {
            state_tx.send_replace(configuration.clone());
        });

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let (results_tx, results_rx) = mpsc::channel(RESULT_BUFFER_SIZE);
        let span = info_span!("interpreter", machine = %machine.definition().id());

        let mut interpreter = Self {
            machine,
            env,
            commands: command_rx,
            results_tx,
            results: results_rx,
        };
        interpreter.launch_invocations();
        tokio::spawn(interpreter.run().instrument(span));

        Ok(MachineHandle {
            commands: command_tx,
            state: state_rx,
        })
    }

    async fn run(mut self) {
        info!("Interpreter started");

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Send { event, reply }) => self.handle_event(event, reply).await,
                        Some(Command::Stop { reply }) => {
                            let _ = reply.send(());
                            break;
                        }
                        None => {
                            info!("All handles dropped");
                            break;
                        }
                    }
                }

                Some(resolution) = self.results.recv() => {
                    self.handle_resolution(resolution).await;
                }
            }
        }

        info!("Interpreter stopped");
    }

    async fn handle_event(&mut self, event: E, reply: Option<Reply<C>>) {
        let kind = event.kind();
        let result = self.machine.send(event, &self.env).await;
        self.launch_invocations();

        match reply {
            Some(reply) => {
                if reply.send(result).is_err() {
                    debug!(event = kind, "Sender went away before the reply");
                }
            }
            None => {
                if let Err(error) = result {
                    warn!(event = kind, error = %error, "Dispatched event failed");
                }
            }
        }
    }

    async fn handle_resolution(&mut self, resolution: Resolution) {
        let Resolution { id, outcome } = resolution;
        let result = self
            .machine
            .notify_service_result(id, outcome, &self.env)
            .await;
        self.launch_invocations();

        if let Err(error) = result {
            warn!(invocation = %id, error = %error, "Service result failed to apply");
        }
    }

    fn launch_invocations(&mut self) {
        for invocation in self.machine.take_invocations() {
            let env = self.env.clone();
            let results = self.results_tx.clone();
            let span = info_span!(
                "invocation",
                id = %invocation.id(),
                service = invocation.service(),
                state = %invocation.state(),
            );

            tokio::spawn(
                async move {
                    let id = invocation.id();
                    let outcome = invocation.run(&env).await;
                    match &outcome {
                        Ok(_) => debug!("Invocation resolved"),
                        Err(error) => debug!(error = %error, "Invocation failed"),
                    }
                    if results.send(Resolution { id, outcome }).await.is_err() {
                        debug!("Interpreter stopped, dropping result");
                    }
                }
                .instrument(span),
            );
        }
    }
}

/// Cheap, cloneable handle to a running interpreter.
pub struct MachineHandle<C, E> {
    commands: mpsc::Sender<Command<C, E>>,
    state: watch::Receiver<StateConfiguration<C>>,
}

impl<C, E> Clone for MachineHandle<C, E> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            state: self.state.clone(),
        }
    }
}

impl<C, E> MachineHandle<C, E>
where
    C: Clone + Send + Sync + 'static,
    E: Event,
{
    /// Send an event and wait for the configuration it produces.
    pub async fn send(&self, event: E) -> Result<StateConfiguration<C>, MachineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Send {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| MachineError::Stopped)?;
        reply_rx.await.map_err(|_| MachineError::Stopped)?
    }

    /// Queue an event without waiting. Faults are logged by the interpreter.
    pub async fn dispatch(&self, event: E) -> Result<(), MachineError> {
        self.commands
            .send(Command::Send { event, reply: None })
            .await
            .map_err(|_| MachineError::Stopped)
    }

    /// Latest configuration.
    pub fn state(&self) -> StateConfiguration<C> {
        self.state.borrow().clone()
    }

    /// Receiver updated with every new configuration.
    pub fn subscribe(&self) -> watch::Receiver<StateConfiguration<C>> {
        self.state.clone()
    }

    /// Wait until a configuration satisfies `predicate`, checking the
    /// current one first.
    pub async fn wait_for<F>(&self, predicate: F) -> Result<StateConfiguration<C>, MachineError>
    where
        F: FnMut(&StateConfiguration<C>) -> bool,
    {
        let mut receiver = self.state.clone();
        let configuration = receiver
            .wait_for(predicate)
            .await
            .map_err(|_| MachineError::Stopped)?;
        Ok(configuration.clone())
    }

    /// Stop the interpreter. Pending service results are discarded.
    pub async fn stop(&self) -> Result<(), MachineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Stop { reply: reply_tx })
            .await
            .map_err(|_| MachineError::Stopped)?;
        reply_rx.await.map_err(|_| MachineError::Stopped)
    }

    pub fn is_stopped(&self) -> bool {
        self.commands.is_closed()
    }
}
