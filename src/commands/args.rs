//! Argument Validation
//!
//! Every handler validates its own arguments before touching an engine. Arity
//! violations all collapse into the same [`CommandError::InvalidCommand`];
//! integer arguments that fail to parse keep the parser's message.

use super::Command;
use crate::response::{ResponseResult, INVALID_COMMAND};
use crate::storage::{EngineError, PartialError};
use bytes::Bytes;
use thiserror::Error;

/// Why a command failed to apply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Wrong number or shape of arguments
    #[error("{}", INVALID_COMMAND)]
    InvalidCommand,

    /// An integer argument could not be parsed
    #[error("{0}")]
    Parse(String),

    /// The engine rejected the operation
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Some fields of a multi-field read failed
    #[error(transparent)]
    Partial(#[from] PartialError),
}

impl CommandError {
    /// Converts the failure into the response result that carries it.
    pub fn into_result(self) -> ResponseResult {
        match self {
            CommandError::Partial(partial) => ResponseResult::Errors(
                partial
                    .errors
                    .into_iter()
                    .map(|slot| slot.map(|e| Bytes::from(e.to_string())))
                    .collect(),
            ),
            other => ResponseResult::error(other.to_string()),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Requires exactly `N` arguments.
pub fn exact<const N: usize>(cmd: &Command) -> CommandResult<&[Bytes; N]> {
    <&[Bytes; N]>::try_from(cmd.args()).map_err(|_| CommandError::InvalidCommand)
}

/// Requires a key followed by at least one element. Returns `(key, elements)`.
pub fn key_and_elements(cmd: &Command) -> CommandResult<(&Bytes, &[Bytes])> {
    match cmd.args() {
        [key, rest @ ..] if !rest.is_empty() => Ok((key, rest)),
        _ => Err(CommandError::InvalidCommand),
    }
}

/// Requires a key followed by one or more field/value pairs.
pub fn key_and_pairs(cmd: &Command) -> CommandResult<(&Bytes, Vec<Bytes>, Vec<Bytes>)> {
    let (key, rest) = key_and_elements(cmd)?;
    if rest.len() % 2 != 0 {
        return Err(CommandError::InvalidCommand);
    }

    let (fields, values) = rest
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .unzip();
    Ok((key, fields, values))
}

/// Parses a signed 64-bit integer argument.
pub fn parse_i64(arg: &Bytes) -> CommandResult<i64> {
    let text = std::str::from_utf8(arg).map_err(|e| CommandError::Parse(e.to_string()))?;
    text.parse::<i64>()
        .map_err(|e| CommandError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        let cmd = Command::from_parts("HGET", ["h", "f"]);
        let [key, field] = exact::<2>(&cmd).unwrap();
        assert_eq!(key, &Bytes::from("h"));
        assert_eq!(field, &Bytes::from("f"));

        assert_eq!(exact::<3>(&cmd), Err(CommandError::InvalidCommand));
        assert_eq!(exact::<1>(&cmd), Err(CommandError::InvalidCommand));
    }

    #[test]
    fn test_key_and_elements() {
        let cmd = Command::from_parts("SADD", ["s", "a", "b"]);
        let (key, members) = key_and_elements(&cmd).unwrap();
        assert_eq!(key, &Bytes::from("s"));
        assert_eq!(members.len(), 2);

        let cmd = Command::from_parts("SADD", ["s"]);
        assert_eq!(key_and_elements(&cmd), Err(CommandError::InvalidCommand));
    }

    #[test]
    fn test_key_and_pairs_requires_odd_count() {
        let cmd = Command::from_parts("HMSET", ["h", "f1", "v1", "f2", "v2"]);
        let (_, fields, values) = key_and_pairs(&cmd).unwrap();
        assert_eq!(fields, vec![Bytes::from("f1"), Bytes::from("f2")]);
        assert_eq!(values, vec![Bytes::from("v1"), Bytes::from("v2")]);

        for bad in [&["h"][..], &["h", "f"][..], &["h", "f", "v", "f2"][..]] {
            let cmd = Command::from_parts("HMSET", bad.iter().copied());
            assert_eq!(key_and_pairs(&cmd), Err(CommandError::InvalidCommand));
        }
    }

    #[test]
    fn test_parse_i64() {
        assert_eq!(parse_i64(&Bytes::from("-12")), Ok(-12));
        assert_eq!(
            parse_i64(&Bytes::from("abc")),
            Err(CommandError::Parse("invalid digit found in string".to_string()))
        );
        assert!(matches!(
            parse_i64(&Bytes::from_static(b"\xff")),
            Err(CommandError::Parse(_))
        ));
    }

    #[test]
    fn test_into_result_shapes() {
        assert_eq!(
            CommandError::InvalidCommand.into_result(),
            ResponseResult::error(INVALID_COMMAND)
        );
        assert_eq!(
            CommandError::Engine(EngineError::WrongType).into_result(),
            ResponseResult::error(EngineError::WrongType.to_string())
        );

        let partial = PartialError {
            errors: vec![None, Some(EngineError::Syntax), None],
        };
        assert_eq!(
            CommandError::Partial(partial).into_result(),
            ResponseResult::Errors(vec![None, Some(Bytes::from("ERR syntax error")), None])
        );
    }
}
