//! Serial command execution
//!
//! A single dispatcher owns the session tree and runs one request at a time.
//! Commands talk to clients through [`Effects`], which records what they ask
//! for; the dispatcher applies the record once the command has returned.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use rondo_cmd::{run, run_line, Cmd, CmdCtx, CmdHost, CmdTable};
use rondo_protocol::{ClientId, ServerMessage};
use rondo_session::{SessionId, SessionManager};

use crate::config::AppConfig;
use crate::registry::ClientRegistry;
use crate::status;

/// Work queued for the dispatcher by connection tasks
#[derive(Debug)]
pub enum Event {
    /// A command received from a client
    Command {
        client: ClientId,
        session: Option<String>,
        cmd: Cmd,
    },
    /// A connection has closed
    Disconnected(ClientId),
}

/// Something a command asked the host to do
#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    Error(String),
    Print(String),
    Exit(ClientId),
    Attach(ClientId, SessionId),
    Detach(ClientId),
    DetachSession(SessionId, Option<ClientId>),
}

/// Host that records effects for one command
#[derive(Debug, Default)]
struct Effects {
    /// Client that sent the command; `None` for startup commands
    invoker: Option<ClientId>,
    /// The invoker is not attached and expects `Exit` when the command ends
    one_shot: bool,
    effects: Vec<Effect>,
    /// Sessions to redraw, in first-request order
    dirty: Vec<SessionId>,
    shutdown: bool,
}

impl CmdHost for Effects {
    fn error(&mut self, message: &str) {
        self.effects.push(Effect::Error(message.to_string()));
    }

    fn print(&mut self, line: String) {
        self.effects.push(Effect::Print(line));
    }

    fn redraw_session(&mut self, session: SessionId) {
        if !self.dirty.contains(&session) {
            self.dirty.push(session);
        }
    }

    fn exit_client(&mut self, client: ClientId) {
        self.effects.push(Effect::Exit(client));
    }

    fn attach_client(&mut self, client: ClientId, session: SessionId) {
        self.effects.push(Effect::Attach(client, session));
    }

    fn detach_client(&mut self, client: ClientId) {
        self.effects.push(Effect::Detach(client));
    }

    fn detach_session_clients(&mut self, session: SessionId, keep: Option<ClientId>) {
        self.effects.push(Effect::DetachSession(session, keep));
    }

    fn shutdown(&mut self) {
        self.shutdown = true;
    }
}

/// Owner of the session tree
pub struct Dispatcher {
    sessions: SessionManager,
    table: Arc<CmdTable>,
    registry: Arc<ClientRegistry>,
    config: Arc<AppConfig>,
    shutdown_tx: broadcast::Sender<()>,
    stopped: bool,
}

impl Dispatcher {
    pub fn new(
        table: Arc<CmdTable>,
        registry: Arc<ClientRegistry>,
        config: Arc<AppConfig>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            sessions: SessionManager::new(),
            table,
            registry,
            config,
            shutdown_tx,
            stopped: false,
        }
    }

    /// The session tree
    #[cfg(test)]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Whether a command has stopped the server
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Process events until the queue closes or the server stops
    pub async fn run(mut self, mut events: mpsc::Receiver<Event>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
            if self.stopped {
                break;
            }
        }
        debug!("Dispatcher stopped");
    }

    /// Handle one event to completion
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Command {
                client,
                session,
                cmd,
            } => self.handle_command(client, session.as_deref(), &cmd),
            Event::Disconnected(client) => self.handle_disconnect(client),
        }
    }

    /// Run the configured startup command lines with no invoking client
    pub fn run_startup(&mut self) {
        let config = Arc::clone(&self.config);
        let table = Arc::clone(&self.table);
        for line in &config.startup.commands {
            let mut effects = Effects::default();
            let result = {
                let mut ctx = self.context(&mut effects);
                ctx.session = ctx.sessions.most_recent_session();
                run_line(&table, line, &mut ctx)
            };
            if let Err(e) = result {
                warn!("Startup command {:?} failed: {}", line, e);
            }
            self.apply(effects);
            if self.stopped {
                break;
            }
        }
    }

    fn handle_command(&mut self, client: ClientId, session: Option<&str>, cmd: &Cmd) {
        let attached = self
            .registry
            .get_client_session(client)
            .filter(|&s| self.sessions.session(s).is_some());

        let target = match session {
            Some(name) => match self.sessions.find_session(name) {
                Some(id) => Some(id),
                None => {
                    self.send(client, ServerMessage::Error {
                        message: format!("session not found: {}", name),
                    });
                    if attached.is_none() {
                        self.send(client, ServerMessage::Exit);
                    }
                    return;
                }
            },
            None => attached.or_else(|| self.sessions.most_recent_session()),
        };

        let mut effects = Effects {
            invoker: Some(client),
            one_shot: attached.is_none(),
            ..Effects::default()
        };
        {
            let mut ctx = self.context(&mut effects);
            ctx.session = target;
            if attached.is_some() {
                ctx.curclient = Some(client);
            } else {
                ctx.cmdclient = Some(client);
            }
            run(cmd, &mut ctx);
        }
        self.apply(effects);
    }

    fn handle_disconnect(&mut self, client: ClientId) {
        if let Some(session) = self.registry.unregister_client(client) {
            if let Some(session) = self.sessions.session_mut(session) {
                session.detach_client();
            }
        }
        debug!("Client {} disconnected", client);
    }

    fn context<'a>(&'a mut self, effects: &'a mut Effects) -> CmdCtx<'a> {
        let mut ctx = CmdCtx::new(&mut self.sessions, effects);
        ctx.base_index = self.config.general.base_index;
        ctx.window_name = self.config.general.default_window_name.as_deref();
        ctx
    }

    fn send(&self, client: ClientId, message: ServerMessage) {
        self.registry.try_send_to_client(client, message);
    }

    /// Deliver everything a command recorded
    ///
    /// A one-shot invoker whose command failed is also told to exit.
    fn apply(&mut self, mut effects: Effects) {
        let mut failed = false;
        let mut exited = false;
        for effect in std::mem::take(&mut effects.effects) {
            match effect {
                Effect::Error(message) => match effects.invoker {
                    Some(client) => {
                        failed = true;
                        self.send(client, ServerMessage::Error { message });
                    }
                    None => warn!("{}", message),
                },
                Effect::Print(line) => match effects.invoker {
                    Some(client) => self.send(client, ServerMessage::Print { line }),
                    None => info!("{}", line),
                },
                Effect::Exit(client) => {
                    exited |= Some(client) == effects.invoker;
                    self.send(client, ServerMessage::Exit);
                }
                Effect::Attach(client, session) => {
                    self.attach(client, session);
                    effects.redraw_session(session);
                }
                Effect::Detach(client) => self.detach(client),
                Effect::DetachSession(session, keep) => {
                    for client in self.registry.get_session_clients(session) {
                        if Some(client) != keep {
                            self.detach(client);
                        }
                    }
                }
            }
        }

        if effects.shutdown {
            self.stop();
            return;
        }

        if let Some(client) = effects.invoker.filter(|_| effects.one_shot) {
            if failed && !exited && self.registry.get_client_session(client).is_none() {
                self.send(client, ServerMessage::Exit);
            }
        }

        for session in effects.dirty {
            self.redraw(session);
        }
        self.prune();
    }

    fn attach(&mut self, client: ClientId, session: SessionId) {
        let Some(previous) = self.registry.attach_to_session(client, session) else {
            return;
        };
        if previous == Some(session) {
            return;
        }
        if let Some(old) = previous.and_then(|old| self.sessions.session_mut(old)) {
            old.detach_client();
        }

        let Some(attached) = self.sessions.session_mut(session) else {
            return;
        };
        attached.attach_client();
        info!("Client {} attached to {}", client, attached.name());
        let name = attached.name().to_string();
        self.send(client, ServerMessage::Attached { session: name });
    }

    fn detach(&mut self, client: ClientId) {
        if let Some(session) = self.registry.detach_from_session(client) {
            if let Some(session) = self.sessions.session_mut(session) {
                session.detach_client();
            }
            info!("Client {} detached", client);
            self.send(client, ServerMessage::Detached);
        }
    }

    /// Send a fresh status line to every client attached to `session`
    fn redraw(&self, session: SessionId) {
        let Some(s) = self.sessions.session(session) else {
            return;
        };
        let status = if self.config.status.enabled {
            status::render(&self.sessions, s, self.config.status.width)
        } else {
            String::new()
        };
        self.registry
            .try_broadcast_to_session(session, ServerMessage::Redraw { status });
    }

    /// Tell clients attached to destroyed sessions to exit
    fn prune(&self) {
        let sessions = &self.sessions;
        let orphans = self
            .registry
            .clients_of_dead_sessions(|s| sessions.session(s).is_some());
        for client in orphans {
            self.registry.detach_from_session(client);
            self.send(client, ServerMessage::Exit);
        }
    }

    /// Tell every client to exit and stop accepting work
    fn stop(&mut self) {
        info!("Server stopping");
        for client in self.registry.client_ids() {
            self.send(client, ServerMessage::Exit);
        }
        self.registry.clear();
        self.stopped = true;
        let _ = self.shutdown_tx.send(());
    }
}
