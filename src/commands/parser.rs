//! Command Line Tokenizer
//!
//! Turns one line of user input into an argv vector of raw byte strings.
//! Tokens are not required to be UTF-8, so `\xNN` escapes can spell any
//! binary key. Commands decode a token as text only where they need a
//! number or a name.
//!
//! - Runs of whitespace separate tokens
//! - `"..."` and `'...'` group text (including spaces) into one token
//! - Inside double quotes: `\"`, `\\`, `\n`, `\r`, `\t` and `\xNN`
//! - Single quotes are literal, except `\'`
//!
//! ```text
//! SET name "Ariz K"   ──>  ["SET", "name", "Ariz K"]
//! SET k '' extra      ──>  ["SET", "k", "", "extra"]
//! ```

use crate::error::{Error, Result};
use bytes::Bytes;

/// Splits a command line into tokens.
pub fn split_command_line(line: &str) -> Result<Vec<Bytes>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut token: Vec<u8> = Vec::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            match c {
                '"' => read_double_quoted(&mut chars, &mut token)?,
                '\'' => read_single_quoted(&mut chars, &mut token)?,
                c => push_char(&mut token, c),
            }
        }

        tokens.push(Bytes::from(token));
    }

    Ok(tokens)
}

/// Yields the executable lines of a multi-line input.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn command_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Reads an argument as text.
pub fn arg_text<'a>(name: &str, arg: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(arg)
        .map_err(|_| Error::invalid_argument(format!("{} is not valid UTF-8", name)))
}

/// Joins tokens back into one line for messages, replacing invalid UTF-8.
pub fn display_args(args: &[Bytes]) -> String {
    args.iter()
        .map(|arg| String::from_utf8_lossy(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_char(token: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    token.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn read_double_quoted<I>(chars: &mut std::iter::Peekable<I>, token: &mut Vec<u8>) -> Result<()>
where
    I: Iterator<Item = char>,
{
    loop {
        match chars.next() {
            None => return Err(Error::invalid_argument("unbalanced quotes in command line")),
            Some('"') => return Ok(()),
            Some('\\') => match chars.next() {
                Some('n') => token.push(b'\n'),
                Some('r') => token.push(b'\r'),
                Some('t') => token.push(b'\t'),
                Some('x') => {
                    let hi = chars.next();
                    let lo = chars.next();
                    let byte = match (hi, lo) {
                        (Some(hi), Some(lo)) => {
                            let digits: String = [hi, lo].iter().collect();
                            u8::from_str_radix(&digits, 16).ok()
                        }
                        _ => None,
                    };
                    match byte {
                        Some(byte) => token.push(byte),
                        None => {
                            return Err(Error::invalid_argument(
                                "invalid \\x escape in command line",
                            ))
                        }
                    }
                }
                Some(c) => push_char(token, c),
                None => return Err(Error::invalid_argument("unbalanced quotes in command line")),
            },
            Some(c) => push_char(token, c),
        }
    }
}

fn read_single_quoted<I>(chars: &mut std::iter::Peekable<I>, token: &mut Vec<u8>) -> Result<()>
where
    I: Iterator<Item = char>,
{
    loop {
        match chars.next() {
            None => return Err(Error::invalid_argument("unbalanced quotes in command line")),
            Some('\'') => return Ok(()),
            Some('\\') if chars.peek() == Some(&'\'') => {
                chars.next();
                token.push(b'\'');
            }
            Some(c) => push_char(token, c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        let argv = split_command_line("  SET   key \t value  ").unwrap();
        assert_eq!(argv, vec!["SET", "key", "value"]);
        assert!(split_command_line("   ").unwrap().is_empty());
    }

    #[test]
    fn test_quotes() {
        let argv = split_command_line(r#"SET name "Ariz K" 'single q'"#).unwrap();
        assert_eq!(argv, vec!["SET", "name", "Ariz K", "single q"]);

        let argv = split_command_line(r#"SET k "" x"#).unwrap();
        assert_eq!(argv, vec!["SET", "k", "", "x"]);

        let argv = split_command_line(r#"SET k pre"mid dle"post"#).unwrap();
        assert_eq!(argv, vec!["SET", "k", "premid dlepost"]);
    }

    #[test]
    fn test_escapes() {
        let argv = split_command_line(r#"SET k "a\"b\\c\n\x41""#).unwrap();
        assert_eq!(argv[2], "a\"b\\c\nA");

        let argv = split_command_line(r"SET k 'it\'s'").unwrap();
        assert_eq!(argv[2], "it's");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            split_command_line(r#"SET k "open"#),
            Err(Error::InvalidArgument(_))
        ));
        assert!(split_command_line(r#"SET k "\xZZ""#).is_err());
        assert!(split_command_line(r#"SET k "\x4""#).is_err());
    }

    #[test]
    fn test_binary_tokens() {
        let argv = split_command_line(r#"GET "\xff\x00k""#).unwrap();
        assert_eq!(argv[1], Bytes::from_static(&[0xff, 0x00, b'k']));
        assert!(arg_text("key", &argv[1]).is_err());
        assert_eq!(arg_text("key", &argv[0]).unwrap(), "GET");
        assert_eq!(display_args(&argv[..1]), "GET");
    }

    #[test]
    fn test_command_lines() {
        let text = "SET a 1\n\n# comment\n  GET a  \n";
        let lines: Vec<&str> = command_lines(text).collect();
        assert_eq!(lines, vec!["SET a 1", "GET a"]);
    }
}
