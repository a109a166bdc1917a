//! Backend Connection Config
//!
//! Local backends are configured with a flat, argv-like token list:
//!
//! ```text
//! -f <path-or-name>   database file (redb) or initial database name (memory)
//! -d <delimiter>      delimiter used when rendering composite values
//! -ns <separator>     namespace separator used to split keys for display
//! -c                  create the database if it does not exist
//! ```
//!
//! The config is persisted as a single line. Every flag value is escaped
//! (`\n`, `\t`, `\r`, `\s` for a space, `\\`) so that the line survives
//! being split on spaces again.

use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// Default delimiter for rendering composite values
pub const DEFAULT_DELIMITER: &str = "\n";

/// Default namespace separator
pub const DEFAULT_NS_SEPARATOR: &str = ":";

/// Config shared by the local (embedded / in-process) backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    /// Database file path or name
    pub db_name: String,
    /// Delimiter for composite value rendering
    pub delimiter: String,
    /// Namespace separator for keys
    pub ns_separator: String,
    /// Create the database when it is missing
    pub create_if_missing: bool,
}

impl LocalConfig {
    /// Creates a config with default settings for the given database.
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            ns_separator: DEFAULT_NS_SEPARATOR.to_string(),
            create_if_missing: false,
        }
    }

    /// Applies flags from an argv-like token list.
    ///
    /// Parsing stops at the first token that is not a recognized flag. An
    /// unrecognized flag is logged. Returns how many tokens were consumed.
    pub fn apply_args<S: AsRef<str>>(&mut self, args: &[S]) -> usize {
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_ref();
            let has_value = i + 1 < args.len();

            match arg {
                "-d" if has_value => {
                    self.delimiter = unescape(args[i + 1].as_ref());
                    i += 2;
                }
                "-ns" if has_value => {
                    self.ns_separator = unescape(args[i + 1].as_ref());
                    i += 2;
                }
                "-f" if has_value => {
                    self.db_name = unescape(args[i + 1].as_ref());
                    i += 2;
                }
                "-c" => {
                    self.create_if_missing = true;
                    i += 1;
                }
                other => {
                    if other.starts_with('-') {
                        warn!(
                            option = other,
                            "Unrecognized option or bad number of args"
                        );
                    }
                    break;
                }
            }
        }
        i
    }

    /// Parses a single-line config on top of `self`.
    pub fn apply_line(&mut self, line: &str) -> usize {
        let args: Vec<&str> = line.split_whitespace().collect();
        self.apply_args(&args)
    }

    /// Renders the config back into its token list.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            escape(&self.db_name),
            "-d".to_string(),
            escape(&self.delimiter),
            "-ns".to_string(),
            escape(&self.ns_separator),
        ];
        if self.create_if_missing {
            args.push("-c".to_string());
        }
        args
    }

    /// Filesystem path for file-backed backends, with `~/` expanded.
    pub fn db_path(&self) -> PathBuf {
        if let Some(rest) = self.db_name.strip_prefix("~/") {
            if let Some(home) = std::env::var_os("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(&self.db_name)
    }
}

impl fmt::Display for LocalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_args().join(" "))
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' ' => out.push_str("\\s"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('s') => out.push(' '),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = LocalConfig::new("db");
        assert_eq!(cfg.delimiter, "\n");
        assert_eq!(cfg.ns_separator, ":");
        assert!(!cfg.create_if_missing);
    }

    #[test]
    fn test_parse_flags() {
        let mut cfg = LocalConfig::new("db");
        let consumed = cfg.apply_line("-d , -ns / -f /tmp/test.redb -c");
        assert_eq!(consumed, 7);
        assert_eq!(cfg.delimiter, ",");
        assert_eq!(cfg.ns_separator, "/");
        assert_eq!(cfg.db_name, "/tmp/test.redb");
        assert!(cfg.create_if_missing);
    }

    #[test]
    fn test_parse_stops_at_unknown_token() {
        let mut cfg = LocalConfig::new("db");
        let consumed = cfg.apply_line("-c -x -f other");
        assert_eq!(consumed, 1);
        assert!(cfg.create_if_missing);
        assert_eq!(cfg.db_name, "db");

        let mut cfg = LocalConfig::new("db");
        assert_eq!(cfg.apply_line("GET -f other"), 0);

        // A flag missing its value is unrecognized
        let mut cfg = LocalConfig::new("db");
        assert_eq!(cfg.apply_line("-c -f"), 1);
        assert_eq!(cfg.db_name, "db");
    }

    #[test]
    fn test_string_form_round_trip() {
        let mut cfg = LocalConfig::new("/data/x.redb");
        cfg.delimiter = "\n".to_string();
        cfg.ns_separator = " :: ".to_string();
        cfg.create_if_missing = true;

        let line = cfg.to_string();
        assert!(!line.contains('\n'));

        let mut parsed = LocalConfig::new("other");
        parsed.apply_line(&line);
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn test_path_with_spaces_round_trips() {
        let mut cfg = LocalConfig::new("/tmp/my data/kv store.redb");
        cfg.create_if_missing = true;

        let line = cfg.to_string();
        assert!(line.starts_with("-f /tmp/my\\sdata/kv\\sstore.redb "));

        let mut parsed = LocalConfig::new("other");
        assert_eq!(parsed.apply_line(&line), 7);
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.db_path(), PathBuf::from("/tmp/my data/kv store.redb"));
    }

    #[test]
    fn test_home_expansion() {
        let cfg = LocalConfig::new("/abs/path.redb");
        assert_eq!(cfg.db_path(), PathBuf::from("/abs/path.redb"));

        if let Some(home) = std::env::var_os("HOME") {
            let cfg = LocalConfig::new("~/x.redb");
            assert_eq!(cfg.db_path(), PathBuf::from(home).join("x.redb"));
        }
    }
}
