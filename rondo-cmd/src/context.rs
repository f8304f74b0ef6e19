//! Execution context handed to a running command

use rondo_protocol::ClientId;
use rondo_session::{SessionId, SessionManager, WindowId};
use rondo_utils::RondoError;

use crate::slot::Slot;

/// Side channel for everything a command does beyond the session tree
///
/// Implementations may queue these and apply them after the command has
/// returned; commands must not depend on them taking effect immediately.
pub trait CmdHost {
    /// Report a resolution failure to the invoker
    fn error(&mut self, message: &str);

    /// Send a line of output to the invoker
    fn print(&mut self, line: String);

    /// Schedule a full redisplay for every client attached to `session`
    fn redraw_session(&mut self, session: SessionId);

    /// Tell a client to terminate cleanly
    fn exit_client(&mut self, client: ClientId);

    /// Attach a client to a session, replacing any current attachment
    fn attach_client(&mut self, client: ClientId, session: SessionId);

    /// Detach a client from its session
    fn detach_client(&mut self, client: ClientId);

    /// Detach every client attached to `session`, except `keep`
    fn detach_session_clients(&mut self, session: SessionId, keep: Option<ClientId>);

    /// Stop the server
    fn shutdown(&mut self);
}

/// Everything a command may touch while executing
///
/// Borrowed for the duration of a single `exec` call.
pub struct CmdCtx<'a> {
    /// The session tree
    pub sessions: &'a mut SessionManager,
    /// Target session, if one could be determined
    pub session: Option<SessionId>,
    /// One-shot client that sent the command, told to exit on completion
    pub cmdclient: Option<ClientId>,
    /// Attached client the command was issued from
    pub curclient: Option<ClientId>,
    /// First slot index used for new windows
    pub base_index: u32,
    /// Name given to new windows when none is supplied
    pub window_name: Option<&'a str>,
    pub host: &'a mut dyn CmdHost,
}

impl<'a> CmdCtx<'a> {
    /// Context with no invoking client and no target session
    pub fn new(sessions: &'a mut SessionManager, host: &'a mut dyn CmdHost) -> Self {
        Self {
            sessions,
            session: None,
            cmdclient: None,
            curclient: None,
            base_index: 0,
            window_name: None,
            host,
        }
    }

    /// Report an error through the host
    pub fn error(&mut self, message: impl AsRef<str>) {
        self.host.error(message.as_ref());
    }

    /// The client that issued the command, attached or not
    pub fn invoker(&self) -> Option<ClientId> {
        self.curclient.or(self.cmdclient)
    }

    /// The context session, if it still exists
    pub fn target_session(&mut self) -> Option<SessionId> {
        match self.session {
            Some(id) if self.sessions.session(id).is_some() => Some(id),
            _ => {
                self.error("no current session");
                None
            }
        }
    }

    /// Look a session up by name
    pub fn find_session(&mut self, name: &str) -> Option<SessionId> {
        let found = self.sessions.find_session(name);
        if found.is_none() {
            self.error(RondoError::SessionNotFound(name.to_string()).to_string());
        }
        found
    }

    /// Resolve a slot in `session`, unset meaning the current slot
    pub fn find_winlink(&mut self, session: SessionId, slot: Slot) -> Option<(u32, WindowId)> {
        let Some(s) = self.sessions.session(session) else {
            self.error("no current session");
            return None;
        };

        let found = match slot {
            Slot::Unset => s.current_index().zip(s.current_window()),
            Slot::At(index) => s.window_at(index).map(|w| (index, w)),
        };

        if found.is_none() {
            match slot {
                Slot::Unset => self.error("no current window"),
                Slot::At(index) => self.error(RondoError::WindowNotFound(index).to_string()),
            }
        }
        found
    }

    /// Signal a one-shot invoker that the command is complete
    pub fn finish(&mut self) {
        if let Some(client) = self.cmdclient {
            self.host.exit_client(client);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A host that records everything, for command tests

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Effect {
        Error(String),
        Print(String),
        Redraw(SessionId),
        Exit(ClientId),
        Attach(ClientId, SessionId),
        Detach(ClientId),
        DetachSession(SessionId, Option<ClientId>),
        Shutdown,
    }

    #[derive(Debug, Default)]
    pub struct RecordingHost {
        pub effects: Vec<Effect>,
    }

    impl RecordingHost {
        pub fn errors(&self) -> Vec<&str> {
            self.effects
                .iter()
                .filter_map(|e| match e {
                    Effect::Error(m) => Some(m.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn printed(&self) -> Vec<&str> {
            self.effects
                .iter()
                .filter_map(|e| match e {
                    Effect::Print(l) => Some(l.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn redraws(&self) -> Vec<SessionId> {
            self.effects
                .iter()
                .filter_map(|e| match e {
                    Effect::Redraw(s) => Some(*s),
                    _ => None,
                })
                .collect()
        }
    }

    impl CmdHost for RecordingHost {
        fn error(&mut self, message: &str) {
            self.effects.push(Effect::Error(message.to_string()));
        }

        fn print(&mut self, line: String) {
            self.effects.push(Effect::Print(line));
        }

        fn redraw_session(&mut self, session: SessionId) {
            self.effects.push(Effect::Redraw(session));
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
            self.effects.push(Effect::Shutdown);
        }
    }

    /// Run a parsed argv against `sessions` with a recording host
    ///
    /// `session` names the context session; the invoker is a one-shot
    /// client with id 1.
    pub fn run_argv(
        sessions: &mut SessionManager,
        session: Option<&str>,
        argv: &[&str],
    ) -> RecordingHost {
        let argv: Vec<String> = argv.iter().map(|w| w.to_string()).collect();
        let table = crate::CmdTable::new();
        let cmd = crate::parse_argv(&table, &argv).expect("argv should parse");

        let mut host = RecordingHost::default();
        let target = session.and_then(|name| sessions.find_session(name));
        let mut ctx = CmdCtx::new(sessions, &mut host);
        ctx.session = target;
        ctx.cmdclient = Some(ClientId::new(1));
        crate::run(&cmd, &mut ctx);
        host
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Effect, RecordingHost};
    use super::*;

    fn setup() -> (SessionManager, SessionId) {
        let mut sessions = SessionManager::new();
        let id = sessions.create_session(Some("main"), Some("A"), 0).unwrap();
        sessions.new_window(id, None, Some("B"), 0).unwrap();
        (sessions, id)
    }

    #[test]
    fn test_find_winlink_unset_is_current() {
        let (mut sessions, id) = setup();
        sessions.select_window(id, 1);
        let mut host = RecordingHost::default();
        let mut ctx = CmdCtx::new(&mut sessions, &mut host);

        let (index, _) = ctx.find_winlink(id, Slot::Unset).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn test_find_winlink_missing_reports() {
        let (mut sessions, id) = setup();
        let mut host = RecordingHost::default();
        let mut ctx = CmdCtx::new(&mut sessions, &mut host);

        assert!(ctx.find_winlink(id, Slot::At(7)).is_none());
        assert_eq!(host.errors(), vec!["no window 7"]);
    }

    #[test]
    fn test_find_session_missing_reports() {
        let (mut sessions, _) = setup();
        let mut host = RecordingHost::default();
        let mut ctx = CmdCtx::new(&mut sessions, &mut host);

        assert!(ctx.find_session("nope").is_none());
        assert_eq!(host.errors(), vec!["session not found: nope"]);
    }

    #[test]
    fn test_target_session_without_session() {
        let (mut sessions, _) = setup();
        let mut host = RecordingHost::default();
        let mut ctx = CmdCtx::new(&mut sessions, &mut host);

        assert!(ctx.target_session().is_none());
        assert_eq!(host.errors(), vec!["no current session"]);
    }

    #[test]
    fn test_finish_only_signals_cmdclient() {
        let (mut sessions, _) = setup();
        let mut host = RecordingHost::default();
        let mut ctx = CmdCtx::new(&mut sessions, &mut host);
        ctx.finish();
        ctx.curclient = Some(ClientId::new(2));
        ctx.finish();
        ctx.cmdclient = Some(ClientId::new(3));
        ctx.finish();

        assert_eq!(host.effects, vec![Effect::Exit(ClientId::new(3))]);
    }
}
