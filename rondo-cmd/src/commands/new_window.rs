//! new-window: create a window in the context session

use rondo_protocol::{Buffer, WireError};
use tracing::debug;

use super::scan;
use crate::context::CmdCtx;
use crate::entry::{parse_as, recv_as, CmdEntry, Command};
use crate::error::ArgError;
use crate::slot::Slot;

pub static NEW_WINDOW: CmdEntry = CmdEntry {
    name: "new-window",
    alias: Some("neww"),
    usage: "[-d] [-i index] [-n name]",
    requires_client: false,
    parse: parse_as::<NewWindow>,
    recv: recv_as::<NewWindow>,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWindow {
    /// Unset means the first free slot
    pub index: Slot,
    pub name: Option<String>,
    pub detached: bool,
}

impl Command for NewWindow {
    const HEADER_LEN: usize = 4 + 1;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let args = scan(args, "di:n:", 0, &NEW_WINDOW)?;
        Ok(Self {
            index: Slot::parse_opt(args.value('i'))?,
            name: args.value('n').map(String::from),
            detached: args.has('d'),
        })
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(session) = ctx.target_session() else {
            return;
        };

        let name = self.name.as_deref().or(ctx.window_name);
        let index = match ctx
            .sessions
            .new_window(session, self.index.index(), name, ctx.base_index)
        {
            Ok(index) => index,
            Err(e) => {
                ctx.error(e.to_string());
                return;
            }
        };
        debug!(index, "created window");

        if !self.detached {
            ctx.sessions.select_window(session, index);
        }
        ctx.host.redraw_session(session);

        ctx.finish();
    }

    fn send(&self, buf: &mut Buffer) {
        buf.write_i32(self.index.to_wire());
        buf.write_flag(self.detached);
        buf.write_opt_string(self.name.as_deref());
    }

    fn recv(buf: &mut Buffer) -> Result<Self, WireError> {
        let index = Slot::from_wire(buf.read_i32()?);
        let detached = buf.read_flag()?;
        let name = buf.read_opt_string()?;

        Ok(Self {
            index,
            name,
            detached,
        })
    }
}

#[cfg(test)]
mod tests {
    use rondo_session::SessionManager;

    use super::*;
    use crate::context::testing::{run_argv, RecordingHost};

    #[test]
    fn test_new_window_selects() {
        let mut sessions = SessionManager::new();
        let id = sessions.create_session(Some("main"), None, 0).unwrap();

        let host = run_argv(&mut sessions, Some("main"), &["new-window", "-n", "logs"]);

        assert!(host.errors().is_empty());
        let session = sessions.session(id).unwrap();
        assert_eq!(session.current_index(), Some(1));
        assert_eq!(sessions.window_at(id, 1).unwrap().name(), "logs");
    }

    #[test]
    fn test_new_window_detached_at_index() {
        let mut sessions = SessionManager::new();
        let id = sessions.create_session(Some("main"), None, 0).unwrap();

        run_argv(&mut sessions, Some("main"), &["neww", "-d", "-i", "9"]);

        let session = sessions.session(id).unwrap();
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(sessions.window_at(id, 9).unwrap().name(), "9");
    }

    #[test]
    fn test_new_window_index_in_use() {
        let mut sessions = SessionManager::new();
        let id = sessions.create_session(Some("main"), None, 0).unwrap();

        let host = run_argv(&mut sessions, Some("main"), &["new-window", "-i", "0"]);

        assert_eq!(host.errors(), vec!["index in use: 0"]);
        assert_eq!(sessions.session(id).unwrap().window_count(), 1);
    }

    #[test]
    fn test_new_window_uses_context_defaults() {
        let mut sessions = SessionManager::new();
        let id = sessions.create_session(Some("main"), None, 1).unwrap();
        let mut host = RecordingHost::default();

        let mut ctx = CmdCtx::new(&mut sessions, &mut host);
        ctx.session = Some(id);
        ctx.base_index = 1;
        ctx.window_name = Some("shell");
        NewWindow::parse(&[]).unwrap().exec(&mut ctx);

        assert_eq!(sessions.window_at(id, 2).unwrap().name(), "shell");
    }
}
