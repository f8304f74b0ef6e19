//! Status line rendering
//!
//! One entry per winlink, `IDX:NAME` followed by a flag (`*` current, `-`
//! last, space otherwise) and a separating space, cut or padded to the
//! configured width.

use rondo_session::{Session, SessionManager};

/// Render the status line for `session`, exactly `width` characters wide
pub fn render(sessions: &SessionManager, session: &Session, width: usize) -> String {
    let mut line = String::with_capacity(width);
    let mut remaining = width;

    for (index, window_id) in session.winlinks() {
        if remaining == 0 {
            break;
        }
        let Some(window) = sessions.window(window_id) else {
            continue;
        };

        let flag = if session.current_index() == Some(index) {
            '*'
        } else if session.last_index() == Some(index) {
            '-'
        } else {
            ' '
        };

        let entry = format!("{}:{}{} ", index, window.name(), flag);
        let taken: String = entry.chars().take(remaining).collect();
        remaining -= taken.chars().count();
        line.push_str(&taken);
    }

    line.extend(std::iter::repeat(' ').take(remaining));
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> (SessionManager, rondo_session::SessionId) {
        let mut sessions = SessionManager::new();
        let id = sessions.create_session(Some("main"), Some("edit"), 0).unwrap();
        sessions.new_window(id, None, Some("build"), 0).unwrap();
        sessions.new_window(id, None, Some("logs"), 0).unwrap();
        sessions.select_window(id, 2);
        (sessions, id)
    }

    #[test]
    fn test_render_flags_and_padding() {
        let (sessions, id) = sessions();
        let session = sessions.session(id).unwrap();

        let line = render(&sessions, session, 30);

        assert_eq!(line, "0:edit- 1:build  2:logs*      ");
        assert_eq!(line.chars().count(), 30);
    }

    #[test]
    fn test_render_truncates() {
        let (sessions, id) = sessions();
        let session = sessions.session(id).unwrap();

        assert_eq!(render(&sessions, session, 10), "0:edit- 1:");
    }

    #[test]
    fn test_render_multibyte_names() {
        let mut sessions = SessionManager::new();
        let id = sessions.create_session(Some("s"), Some("écrire"), 0).unwrap();
        let session = sessions.session(id).unwrap();

        assert_eq!(render(&sessions, session, 5), "0:écr");
    }
}
