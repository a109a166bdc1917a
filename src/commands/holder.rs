//! Command Metadata and the Command Table
//!
//! A `CommandHolder` pairs the metadata of one command with the function
//! that runs it. The `CommandTable` is the ordered, immutable registry of
//! holders for one backend. It is built once and then only read, so it is
//! shared between drivers behind an `Arc` without any locking.
//!
//! ## Name Matching
//!
//! Command names may span several words (`CONFIG GET`). Lookup consumes
//! the leading argv tokens that spell a registered name word-for-word,
//! ignoring ASCII case, and prefers the holder that consumes the most
//! words:
//!
//! ```text
//! registered: "GET CONFIG", "GET2"
//!
//! GET CONFIG alex   ──> "GET CONFIG" with args [alex]
//! GET CONFIGX alex  ──> no match ("CONFIGX" is not the word "CONFIG")
//! GET alex          ──> no match (no bare "GET")
//! ```

use crate::error::Result;
use crate::value::Value;
use bytes::Bytes;
use std::fmt;

/// Offset meaning "any number of extra arguments".
pub const INFINITE_ARGS: usize = usize::MAX;

/// Shown for commands without a version tag or example.
pub const UNDEFINED: &str = "undefined";

/// The function invoked for a matched command.
///
/// It receives the command context, the raw arguments that follow the
/// command name and the sink the command writes its reply values to.
pub type CommandFn<C> = fn(&mut C, &[Bytes], &mut Vec<Value>) -> Result<()>;

/// Static metadata describing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    /// Command name; may contain several space-separated words
    pub name: &'static str,
    /// Argument usage string, e.g. `<key> <value>`
    pub params: &'static str,
    /// Human help text
    pub summary: &'static str,
    /// Version the command appeared in
    pub since: Option<&'static str>,
    /// Example invocation
    pub example: Option<&'static str>,
    /// Minimum number of arguments
    pub min_args: usize,
    /// How many arguments beyond `min_args` are accepted
    pub max_args_offset: usize,
}

impl CommandInfo {
    /// Largest accepted argument count.
    pub fn max_args(&self) -> usize {
        self.min_args.saturating_add(self.max_args_offset)
    }

    /// Checks an argument count against `[min_args, min_args + offset]`.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && count <= self.max_args()
    }

    pub fn since_str(&self) -> &'static str {
        self.since.unwrap_or(UNDEFINED)
    }

    pub fn example_str(&self) -> &'static str {
        self.example.unwrap_or(UNDEFINED)
    }

    /// Name followed by the usage string.
    pub fn usage(&self) -> String {
        if self.params.is_empty() {
            self.name.to_string()
        } else {
            format!("{} {}", self.name, self.params)
        }
    }

    /// Multi-line help text, as printed by `HELP`.
    pub fn help_text(&self) -> String {
        format!(
            "{}\n  summary: {}\n  since: {}\n  example: {}",
            self.usage(),
            self.summary,
            self.since_str(),
            self.example_str()
        )
    }

    /// Number of argv tokens this name consumes, if `argv` starts with it.
    fn match_len(&self, argv: &[Bytes]) -> Option<usize> {
        let words: Vec<&str> = self.name.split_whitespace().collect();
        let mut seen = 0;

        for (i, token) in argv.iter().enumerate() {
            let mut token_words = token
                .split(|b| b.is_ascii_whitespace())
                .filter(|word| !word.is_empty())
                .peekable();
            token_words.peek()?;

            for word in token_words {
                if seen == words.len() || !word.eq_ignore_ascii_case(words[seen].as_bytes()) {
                    return None;
                }
                seen += 1;
            }

            if seen == words.len() {
                return Some(i + 1);
            }
        }

        None
    }
}

/// One registered command: metadata plus handler.
pub struct CommandHolder<C> {
    pub info: CommandInfo,
    handler: CommandFn<C>,
}

impl<C> CommandHolder<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &'static str,
        params: &'static str,
        summary: &'static str,
        since: Option<&'static str>,
        example: Option<&'static str>,
        min_args: usize,
        max_args_offset: usize,
        handler: CommandFn<C>,
    ) -> Self {
        Self {
            info: CommandInfo {
                name,
                params,
                summary,
                since,
                example,
                min_args,
                max_args_offset,
            },
            handler,
        }
    }

    pub fn name(&self) -> &'static str {
        self.info.name
    }

    /// Runs the handler.
    pub fn invoke(&self, ctx: &mut C, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
        (self.handler)(ctx, args, out)
    }
}

impl<C> fmt::Debug for CommandHolder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHolder")
            .field("info", &self.info)
            .finish()
    }
}

/// Immutable, order-preserving registry of commands.
pub struct CommandTable<C> {
    commands: Vec<CommandHolder<C>>,
}

impl<C> CommandTable<C> {
    pub fn new(commands: Vec<CommandHolder<C>>) -> Self {
        Self { commands }
    }

    /// Finds the most specific command spelled by the leading argv tokens.
    ///
    /// Returns the holder and the number of tokens its name consumed. On
    /// equal length the first registered holder wins.
    pub fn find(&self, argv: &[Bytes]) -> Option<(&CommandHolder<C>, usize)> {
        let mut best: Option<(&CommandHolder<C>, usize)> = None;

        for holder in &self.commands {
            if let Some(consumed) = holder.info.match_len(argv) {
                match best {
                    Some((_, best_len)) if best_len >= consumed => {}
                    _ => best = Some((holder, consumed)),
                }
            }
        }

        best
    }

    /// Looks up a command by its full name, ignoring case and extra spaces.
    pub fn get(&self, name: &str) -> Option<&CommandHolder<C>> {
        let wanted: Vec<&str> = name.split_whitespace().collect();
        self.commands.iter().find(|holder| {
            let words: Vec<&str> = holder.info.name.split_whitespace().collect();
            words.len() == wanted.len()
                && words
                    .iter()
                    .zip(&wanted)
                    .all(|(a, b)| a.eq_ignore_ascii_case(b))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandHolder<C>> {
        self.commands.iter()
    }

    /// Metadata of every command, in registration order.
    pub fn infos(&self) -> Vec<CommandInfo> {
        self.commands.iter().map(|h| h.info.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<C> fmt::Debug for CommandTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.commands.iter().map(|h| h.info.name))
            .finish()
    }
}
