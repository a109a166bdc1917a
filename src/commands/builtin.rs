//! Built-in Commands
//!
//! The command set shared by every backend, implemented once against the
//! generic [`Connection`]. A backend's table is this list followed by the
//! backend's own extra commands.
//!
//! ## Replies
//!
//! - `SET`, `RENAME`, `FLUSHDB`, `CREATEDB`, `REMOVEDB`, `SELECT`, `QUIT`: `OK`
//! - `GET`: the stored value
//! - `DEL`, `DBKCOUNT`, `EXPIRE`, `TTL`: an integer
//! - `SCAN`: `[cursor, [key ...]]`
//! - `KEYS`: `[key ...]`
//! - `INFO`, `CONFIG GET`, `HELP`: text

use crate::commands::holder::{CommandHolder, CommandTable, INFINITE_ARGS};
use crate::commands::parser::{arg_text, display_args};
use crate::connection::{Connection, NativeBackend};
use crate::error::{Error, Result};
use crate::value::{Key, NDbKValue, Value};
use bytes::Bytes;

/// Default page size of `SCAN`.
pub const DEFAULT_SCAN_COUNT: u64 = 10;

const SINCE: Option<&str> = Some("0.1.0");

/// The common commands, in registration order.
pub fn builtin_commands<B: NativeBackend>() -> Vec<CommandHolder<Connection<B>>> {
    vec![
        CommandHolder::new(
            "SET",
            "<key> <value>",
            "Set the string value of a key",
            SINCE,
            Some("SET greeting hello"),
            2,
            0,
            set::<B>,
        ),
        CommandHolder::new(
            "GET",
            "<key>",
            "Get the value of a key",
            SINCE,
            Some("GET greeting"),
            1,
            0,
            get::<B>,
        ),
        CommandHolder::new(
            "DEL",
            "<key> [key ...]",
            "Delete keys, returns how many existed",
            SINCE,
            Some("DEL a b c"),
            1,
            INFINITE_ARGS,
            del::<B>,
        ),
        CommandHolder::new(
            "RENAME",
            "<key> <newkey>",
            "Rename a key (not atomic)",
            SINCE,
            Some("RENAME old new"),
            2,
            0,
            rename::<B>,
        ),
        CommandHolder::new(
            "SCAN",
            "<cursor> [MATCH pattern] [COUNT count]",
            "Incrementally iterate the keys of the current database",
            SINCE,
            Some("SCAN 0 MATCH user:* COUNT 100"),
            1,
            4,
            scan::<B>,
        ),
        CommandHolder::new(
            "KEYS",
            "<key_start> <key_end> <limit>",
            "List keys in an inclusive range",
            SINCE,
            Some("KEYS a z 100"),
            3,
            0,
            keys::<B>,
        ),
        CommandHolder::new(
            "DBKCOUNT",
            "",
            "Number of keys in the current database",
            SINCE,
            None,
            0,
            0,
            dbkcount::<B>,
        ),
        CommandHolder::new(
            "FLUSHDB",
            "",
            "Remove every key of the current database",
            SINCE,
            None,
            0,
            0,
            flushdb::<B>,
        ),
        CommandHolder::new(
            "CREATEDB",
            "<name>",
            "Create a database",
            SINCE,
            Some("CREATEDB sessions"),
            1,
            0,
            createdb::<B>,
        ),
        CommandHolder::new(
            "REMOVEDB",
            "<name>",
            "Remove a database",
            SINCE,
            Some("REMOVEDB sessions"),
            1,
            0,
            removedb::<B>,
        ),
        CommandHolder::new(
            "SELECT",
            "<name>",
            "Switch to another database",
            SINCE,
            Some("SELECT sessions"),
            1,
            0,
            select::<B>,
        ),
        CommandHolder::new(
            "EXPIRE",
            "<key> <seconds>",
            "Set a key's time to live in seconds",
            SINCE,
            Some("EXPIRE session 3600"),
            2,
            0,
            expire::<B>,
        ),
        CommandHolder::new(
            "TTL",
            "<key>",
            "Get the time to live of a key in seconds",
            SINCE,
            Some("TTL session"),
            1,
            0,
            ttl::<B>,
        ),
        CommandHolder::new(
            "INFO",
            "[section]",
            "Backend statistics",
            SINCE,
            Some("INFO stats"),
            0,
            1,
            info::<B>,
        ),
        CommandHolder::new(
            "CONFIG GET",
            "<parameter>",
            "Read a connection setting",
            SINCE,
            Some("CONFIG GET delimiter"),
            1,
            0,
            config_get::<B>,
        ),
        CommandHolder::new(
            "HELP",
            "[command ...]",
            "List commands or describe one",
            SINCE,
            Some("HELP CONFIG GET"),
            0,
            INFINITE_ARGS,
            help::<B>,
        ),
        CommandHolder::new(
            "QUIT",
            "",
            "Close the connection",
            SINCE,
            None,
            0,
            0,
            quit::<B>,
        ),
    ]
}

/// The full table of a backend: built-ins followed by its extra commands.
pub fn command_table<B: NativeBackend>() -> CommandTable<Connection<B>> {
    let mut commands = builtin_commands::<B>();
    commands.extend(B::extra_commands());
    CommandTable::new(commands)
}

// ============================================================================
// Key Commands
// ============================================================================

/// SET key value
fn set<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    conn.set(NDbKValue::new(
        args[0].clone(),
        Value::text_or_bytes(args[1].clone()),
    ))?;
    out.push(Value::ok());
    Ok(())
}

/// GET key
fn get<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let item = conn.get(&Key::from(args[0].clone()))?;
    out.push(item.value);
    Ok(())
}

/// DEL key [key ...]
fn del<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let keys: Vec<Key> = args.iter().cloned().map(Key::from).collect();
    let removed = conn.delete(&keys)?;
    out.push(Value::Integer(removed.len() as i64));
    Ok(())
}

/// RENAME key newkey
fn rename<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    conn.rename(&Key::from(args[0].clone()), Key::from(args[1].clone()))?;
    out.push(Value::ok());
    Ok(())
}

/// SCAN cursor [MATCH pattern] [COUNT count]
fn scan<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let cursor = parse_u64("cursor", &args[0])?;
    let mut pattern: &str = "*";
    let mut count = DEFAULT_SCAN_COUNT;

    let mut options = args[1..].iter();
    while let Some(option) = options.next() {
        let option = arg_text("option", option)?;
        let value = options
            .next()
            .ok_or_else(|| Error::invalid_argument(format!("{} requires a value", option)))?;

        if option.eq_ignore_ascii_case("MATCH") {
            pattern = arg_text("pattern", value)?;
        } else if option.eq_ignore_ascii_case("COUNT") {
            count = parse_u64("count", value)?;
            if count == 0 {
                return Err(Error::invalid_argument("count must be positive"));
            }
        } else {
            return Err(Error::invalid_argument(format!("unknown SCAN option '{}'", option)));
        }
    }

    let (keys, next) = conn.scan(cursor, pattern, count)?;
    out.push(Value::Array(vec![
        Value::String(next.to_string()),
        Value::Array(keys.iter().map(Key::to_value).collect()),
    ]));
    Ok(())
}

/// KEYS key_start key_end limit
fn keys<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let limit = parse_u64("limit", &args[2])?;
    let keys = conn.keys(
        &Key::from(args[0].clone()),
        &Key::from(args[1].clone()),
        limit,
    )?;
    out.push(Value::Array(keys.iter().map(Key::to_value).collect()));
    Ok(())
}

/// EXPIRE key seconds
fn expire<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let seconds = parse_u64("seconds", &args[1])?;
    let set = conn.expire(&Key::from(args[0].clone()), seconds)?;
    out.push(Value::Integer(set as i64));
    Ok(())
}

/// TTL key
fn ttl<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let ttl = conn.ttl(&Key::from(args[0].clone()))?;
    out.push(Value::Integer(ttl));
    Ok(())
}

// ============================================================================
// Database Commands
// ============================================================================

fn dbkcount<B: NativeBackend>(conn: &mut Connection<B>, _args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let size = conn.db_size()?;
    out.push(Value::Integer(size as i64));
    Ok(())
}

fn flushdb<B: NativeBackend>(conn: &mut Connection<B>, _args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    conn.flush_db()?;
    out.push(Value::ok());
    Ok(())
}

fn createdb<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    conn.create_db(arg_text("name", &args[0])?)?;
    out.push(Value::ok());
    Ok(())
}

fn removedb<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    conn.remove_db(arg_text("name", &args[0])?)?;
    out.push(Value::ok());
    Ok(())
}

fn select<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    conn.select_db(arg_text("name", &args[0])?)?;
    out.push(Value::ok());
    Ok(())
}

// ============================================================================
// Server Commands
// ============================================================================

/// INFO [section]
///
/// With a section name only the lines under the matching `# Section`
/// header are returned.
fn info<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let text = conn.server_info_text()?;

    let text = match args.first() {
        None => text,
        Some(section) => {
            let section = arg_text("section", section)?;
            let mut selected = String::new();
            let mut inside = false;
            for line in text.lines() {
                if let Some(header) = line.strip_prefix('#') {
                    inside = header.trim().eq_ignore_ascii_case(section);
                }
                if inside {
                    selected.push_str(line);
                    selected.push('\n');
                }
            }
            selected
        }
    };

    out.push(Value::String(text));
    Ok(())
}

/// CONFIG GET parameter
fn config_get<B: NativeBackend>(conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let config = conn.config();
    let params = [
        ("db_name", config.db_name.clone()),
        ("delimiter", config.delimiter.clone()),
        ("ns_separator", config.ns_separator.clone()),
        ("create_if_missing", config.create_if_missing.to_string()),
    ];

    let wanted = arg_text("parameter", &args[0])?;
    let mut reply = Vec::new();
    for (name, value) in params {
        if wanted == "*" || name.eq_ignore_ascii_case(wanted) {
            reply.push(Value::string(name));
            reply.push(Value::String(value));
        }
    }

    if reply.is_empty() {
        return Err(Error::invalid_argument(format!(
            "unknown config parameter '{}'",
            wanted
        )));
    }

    out.push(Value::Array(reply));
    Ok(())
}

/// HELP [command ...]
fn help<B: NativeBackend>(_conn: &mut Connection<B>, args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let table = command_table::<B>();

    if args.is_empty() {
        let lines: Vec<String> = table.iter().map(|h| h.info.usage()).collect();
        out.push(Value::String(lines.join("\n")));
        return Ok(());
    }

    match table.find(args) {
        Some((holder, consumed)) if consumed == args.len() => {
            out.push(Value::String(holder.info.help_text()));
            Ok(())
        }
        _ => Err(Error::UnknownCommand(display_args(args))),
    }
}

fn quit<B: NativeBackend>(conn: &mut Connection<B>, _args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    conn.quit()?;
    out.push(Value::ok());
    Ok(())
}

fn parse_u64(name: &str, value: &[u8]) -> Result<u64> {
    let value = arg_text(name, value)?;
    value
        .parse()
        .map_err(|_| Error::invalid_argument(format!("{} is not a valid number: {}", name, value)))
}
