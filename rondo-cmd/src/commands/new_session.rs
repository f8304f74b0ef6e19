//! new-session: create a session and attach the invoker to it

use rondo_protocol::{Buffer, WireError};
use tracing::info;

use super::scan;
use crate::context::CmdCtx;
use crate::entry::{parse_as, recv_as, CmdEntry, Command};
use crate::error::ArgError;

pub static NEW_SESSION: CmdEntry = CmdEntry {
    name: "new-session",
    alias: Some("new"),
    usage: "[-d] [-n window-name] [-s session-name]",
    requires_client: false,
    parse: parse_as::<NewSession>,
    recv: recv_as::<NewSession>,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    /// Do not attach the invoker
    pub detached: bool,
    pub session_name: Option<String>,
    pub window_name: Option<String>,
}

impl Command for NewSession {
    const HEADER_LEN: usize = 1;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let args = scan(args, "dn:s:", 0, &NEW_SESSION)?;
        Ok(Self {
            detached: args.has('d'),
            session_name: args.value('s').map(String::from),
            window_name: args.value('n').map(String::from),
        })
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let window_name = self.window_name.as_deref().or(ctx.window_name);
        let session = match ctx.sessions.create_session(
            self.session_name.as_deref(),
            window_name,
            ctx.base_index,
        ) {
            Ok(session) => session,
            Err(e) => {
                ctx.error(e.to_string());
                return;
            }
        };
        info!(%session, "created session");

        match ctx.invoker() {
            Some(client) if !self.detached => ctx.host.attach_client(client, session),
            _ => ctx.finish(),
        }
    }

    fn send(&self, buf: &mut Buffer) {
        buf.write_flag(self.detached);
        buf.write_opt_string(self.session_name.as_deref());
        buf.write_opt_string(self.window_name.as_deref());
    }

    fn recv(buf: &mut Buffer) -> Result<Self, WireError> {
        let detached = buf.read_flag()?;
        let session_name = buf.read_opt_string()?;
        let window_name = buf.read_opt_string()?;

        Ok(Self {
            detached,
            session_name,
            window_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use rondo_protocol::ClientId;
    use rondo_session::SessionManager;

    use super::*;
    use crate::context::testing::{run_argv, Effect, RecordingHost};

    #[test]
    fn test_new_session_attaches_one_shot_client() {
        let mut sessions = SessionManager::new();

        let host = run_argv(&mut sessions, None, &["new-session", "-s", "work", "-n", "vim"]);

        let id = sessions.find_session("work").unwrap();
        assert_eq!(sessions.window_at(id, 0).unwrap().name(), "vim");
        assert_eq!(host.effects, vec![Effect::Attach(ClientId::new(1), id)]);
    }

    #[test]
    fn test_new_session_detached_exits() {
        let mut sessions = SessionManager::new();

        let host = run_argv(&mut sessions, None, &["new", "-d"]);

        assert!(sessions.find_session("0").is_some());
        assert_eq!(host.effects, vec![Effect::Exit(ClientId::new(1))]);
    }

    #[test]
    fn test_new_session_duplicate_name() {
        let mut sessions = SessionManager::new();
        sessions.create_session(Some("work"), None, 0).unwrap();

        let host = run_argv(&mut sessions, None, &["new-session", "-s", "work"]);

        assert_eq!(host.errors(), vec!["duplicate session: work"]);
        assert_eq!(sessions.session_count(), 1);
    }

    #[test]
    fn test_new_session_switches_attached_client() {
        let mut sessions = SessionManager::new();
        let mut host = RecordingHost::default();
        let mut ctx = CmdCtx::new(&mut sessions, &mut host);
        ctx.curclient = Some(ClientId::new(7));

        NewSession::parse(&["-s".to_string(), "next".to_string()])
            .unwrap()
            .exec(&mut ctx);

        let id = sessions.find_session("next").unwrap();
        assert_eq!(host.effects, vec![Effect::Attach(ClientId::new(7), id)]);
    }

    #[test]
    fn test_new_session_without_client() {
        let mut sessions = SessionManager::new();
        let mut host = RecordingHost::default();
        let mut ctx = CmdCtx::new(&mut sessions, &mut host);

        NewSession::parse(&[]).unwrap().exec(&mut ctx);

        assert_eq!(sessions.session_count(), 1);
        assert!(host.effects.is_empty());
    }
}
