//! Argument utilities: getopt-style flag scanning and ranged numbers

use std::collections::BTreeMap;

use crate::error::ArgError;

/// Flags and positionals scanned from a command's argv
///
/// The argv excludes the command name itself.
#[derive(Debug, Default)]
pub struct Args {
    flags: BTreeMap<char, Option<String>>,
    positional: Vec<String>,
}

impl Args {
    /// Scan `argv` against a getopt option string such as `"di:"`
    ///
    /// A letter followed by `:` takes an argument, either attached (`-i1`)
    /// or as the next word. Scanning stops at `--`, at a lone `-`, or at the
    /// first word that is not an option. Returns `None` on an unknown flag
    /// or a missing option argument; later occurrences of a flag override
    /// earlier ones.
    pub fn scan(argv: &[String], optstring: &str) -> Option<Self> {
        let mut args = Self::default();
        let mut words = argv.iter();

        while let Some(word) = words.next() {
            if word == "--" {
                break;
            }
            let Some(letters) = word.strip_prefix('-').filter(|l| !l.is_empty()) else {
                args.positional.push(word.clone());
                break;
            };

            let mut chars = letters.char_indices();
            while let Some((at, letter)) = chars.next() {
                match takes_argument(optstring, letter)? {
                    false => {
                        args.flags.insert(letter, None);
                    }
                    true => {
                        let rest = &letters[at + letter.len_utf8()..];
                        let value = if rest.is_empty() {
                            words.next()?.clone()
                        } else {
                            rest.to_string()
                        };
                        args.flags.insert(letter, Some(value));
                        break;
                    }
                }
            }
        }

        args.positional.extend(words.cloned());
        Some(args)
    }

    /// Whether a flag was given
    pub fn has(&self, flag: char) -> bool {
        self.flags.contains_key(&flag)
    }

    /// Argument of a flag that takes one
    pub fn value(&self, flag: char) -> Option<&str> {
        self.flags.get(&flag).and_then(|v| v.as_deref())
    }

    /// Positional words after the options
    pub fn positional(&self) -> &[String] {
        &self.positional
    }
}

/// `Some(true)` for a flag taking an argument, `None` for an unknown flag
fn takes_argument(optstring: &str, letter: char) -> Option<bool> {
    if letter == ':' {
        return None;
    }
    let at = optstring.find(letter)?;
    Some(optstring[at + letter.len_utf8()..].starts_with(':'))
}

/// Parse `text` as an integer in `min..=max`
///
/// Mirrors `strtonum`: the error is the bare problem (`invalid`,
/// `too small`, `too large`), for the caller to prefix with the argument
/// name.
pub fn strtonum(text: &str, min: i64, max: i64) -> Result<i64, &'static str> {
    let value: i64 = match text.parse() {
        Ok(value) => value,
        Err(e) => {
            return Err(match e.kind() {
                std::num::IntErrorKind::PosOverflow => "too large",
                std::num::IntErrorKind::NegOverflow => "too small",
                _ => "invalid",
            })
        }
    };
    if value < min {
        Err("too small")
    } else if value > max {
        Err("too large")
    } else {
        Ok(value)
    }
}

/// Parse a ranged numeric argument, naming it in the error
pub fn ranged(what: &'static str, text: &str, min: i64, max: i64) -> Result<i64, ArgError> {
    strtonum(text, min, max).map_err(|problem| ArgError::Range { what, problem })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    // ==================== Scan Tests ====================

    #[test]
    fn test_scan_flags_and_positionals() {
        let args = Args::scan(&argv(&["-d", "-i", "3", "main", "0"]), "di:").unwrap();
        assert!(args.has('d'));
        assert_eq!(args.value('i'), Some("3"));
        assert_eq!(args.positional(), &argv(&["main", "0"])[..]);
    }

    #[test]
    fn test_scan_bundled_and_attached() {
        let args = Args::scan(&argv(&["-dki7", "x"]), "dki:").unwrap();
        assert!(args.has('d'));
        assert!(args.has('k'));
        assert_eq!(args.value('i'), Some("7"));
        assert_eq!(args.positional(), &argv(&["x"])[..]);
    }

    #[test]
    fn test_scan_stops_at_first_positional() {
        let args = Args::scan(&argv(&["name", "-d"]), "d").unwrap();
        assert!(!args.has('d'));
        assert_eq!(args.positional(), &argv(&["name", "-d"])[..]);
    }

    #[test]
    fn test_scan_double_dash() {
        let args = Args::scan(&argv(&["--", "-d"]), "d").unwrap();
        assert!(!args.has('d'));
        assert_eq!(args.positional(), &argv(&["-d"])[..]);
    }

    #[test]
    fn test_scan_lone_dash_is_positional() {
        let args = Args::scan(&argv(&["-"]), "d").unwrap();
        assert_eq!(args.positional(), &argv(&["-"])[..]);
    }

    #[test]
    fn test_scan_unknown_flag() {
        assert!(Args::scan(&argv(&["-x"]), "di:").is_none());
        assert!(Args::scan(&argv(&["-:"]), "di:").is_none());
    }

    #[test]
    fn test_scan_missing_argument() {
        assert!(Args::scan(&argv(&["-i"]), "di:").is_none());
    }

    // ==================== Number Tests ====================

    #[test]
    fn test_strtonum() {
        assert_eq!(strtonum("42", 0, 100), Ok(42));
        assert_eq!(strtonum("-1", 0, 100), Err("too small"));
        assert_eq!(strtonum("101", 0, 100), Err("too large"));
        assert_eq!(strtonum("4x", 0, 100), Err("invalid"));
        assert_eq!(strtonum("", 0, 100), Err("invalid"));
        assert_eq!(strtonum("99999999999999999999", 0, 100), Err("too large"));
    }

    #[test]
    fn test_ranged_names_argument() {
        let err = ranged("index", "abc", 0, 10).unwrap_err();
        assert_eq!(err.to_string(), "index invalid");
    }
}
