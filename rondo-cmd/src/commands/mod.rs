//! The command catalogue
//!
//! Each command kind is a plain struct in one of the submodules, with a
//! static [`CmdEntry`] next to it. [`Cmd`] closes over all of them.

use rondo_protocol::Buffer;

use crate::args::Args;
use crate::context::CmdCtx;
use crate::entry::{CmdEntry, Command};
use crate::error::ArgError;

pub mod client;
pub mod kill;
pub mod link_window;
pub mod list;
pub mod new_session;
pub mod new_window;
pub mod rename;
pub mod select_window;
pub mod swap_window;

macro_rules! command_set {
    ($($variant:ident => $module:ident::$entry:ident),* $(,)?) => {
        /// A parsed command instance of any kind
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Cmd {
            $($variant($module::$variant),)*
        }

        /// Every descriptor, in registration order
        pub static ENTRIES: &[&CmdEntry] = &[$(&$module::$entry,)*];

        impl Cmd {
            /// The descriptor this instance belongs to
            pub fn entry(&self) -> &'static CmdEntry {
                match self {
                    $(Cmd::$variant(_) => &$module::$entry,)*
                }
            }

            pub fn exec(&self, ctx: &mut CmdCtx<'_>) {
                match self {
                    $(Cmd::$variant(cmd) => cmd.exec(ctx),)*
                }
            }

            pub fn send(&self, buf: &mut Buffer) {
                match self {
                    $(Cmd::$variant(cmd) => cmd.send(buf),)*
                }
            }
        }

        $(
            impl From<$module::$variant> for Cmd {
                fn from(cmd: $module::$variant) -> Self {
                    Cmd::$variant(cmd)
                }
            }
        )*
    };
}

command_set! {
    SwapWindow => swap_window::SWAP_WINDOW,
    LinkWindow => link_window::LINK_WINDOW,
    UnlinkWindow => link_window::UNLINK_WINDOW,
    SelectWindow => select_window::SELECT_WINDOW,
    NextWindow => select_window::NEXT_WINDOW,
    PreviousWindow => select_window::PREVIOUS_WINDOW,
    LastWindow => select_window::LAST_WINDOW,
    NewWindow => new_window::NEW_WINDOW,
    KillWindow => kill::KILL_WINDOW,
    RenameWindow => rename::RENAME_WINDOW,
    NewSession => new_session::NEW_SESSION,
    KillSession => kill::KILL_SESSION,
    RenameSession => rename::RENAME_SESSION,
    ListSessions => list::LIST_SESSIONS,
    ListWindows => list::LIST_WINDOWS,
    AttachSession => client::ATTACH_SESSION,
    DetachClient => client::DETACH_CLIENT,
    RefreshClient => client::REFRESH_CLIENT,
    KillServer => kill::KILL_SERVER,
}

/// Scan flags and check the positional arity, or fail with `entry`'s usage
pub(crate) fn scan(
    args: &[String],
    optstring: &str,
    arity: usize,
    entry: &CmdEntry,
) -> Result<Args, ArgError> {
    Args::scan(args, optstring)
        .filter(|scanned| scanned.positional().len() == arity)
        .ok_or_else(|| ArgError::usage(entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(cmd: &Cmd) -> Cmd {
        let mut buf = Buffer::new();
        cmd.send(&mut buf);
        let cmd = (cmd.entry().recv)(&mut buf).unwrap();
        assert!(buf.is_empty());
        cmd
    }

    fn parse(words: &[&str]) -> Cmd {
        let argv: Vec<String> = words[1..].iter().map(|w| w.to_string()).collect();
        let entry = ENTRIES
            .iter()
            .find(|e| e.matches(words[0]))
            .unwrap();
        (entry.parse)(&argv).unwrap()
    }

    #[test]
    fn test_every_kind_round_trips() {
        let lines: &[&[&str]] = &[
            &["swap-window", "main", "0"],
            &["swap-window", "-d", "-i", "3", "other", "1"],
            &["link-window", "-dk", "-i", "2", "src", "0"],
            &["unlink-window"],
            &["unlink-window", "-i", "4"],
            &["select-window", "5"],
            &["next-window"],
            &["previous-window"],
            &["last-window"],
            &["new-window"],
            &["new-window", "-d", "-i", "6", "-n", "logs"],
            &["kill-window", "-i", "1"],
            &["rename-window", "-i", "0", "editor"],
            &["new-session"],
            &["new-session", "-d", "-n", "w", "-s", "s"],
            &["kill-session"],
            &["rename-session", "renamed"],
            &["list-sessions"],
            &["list-windows"],
            &["attach-session", "-d"],
            &["detach-client"],
            &["refresh-client"],
            &["kill-server"],
        ];

        for line in lines {
            let cmd = parse(line);
            assert_eq!(cmd.entry().name, line[0]);
            assert_eq!(round_trip(&cmd), cmd, "{:?}", line);
        }
    }

    #[test]
    fn test_scan_arity() {
        let argv = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let err = scan(&argv, "di:", 2, &swap_window::SWAP_WINDOW).unwrap_err();
        assert_eq!(
            err.to_string(),
            "usage: swap-window [-d] [-i index] name index"
        );
    }
}
