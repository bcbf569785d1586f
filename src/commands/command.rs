use bytes::Bytes;
use std::fmt;

/// A decoded request: an operation name and its byte-string arguments.
///
/// Commands are immutable once built; handlers only ever read the arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<Bytes>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<Bytes>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Builds a command from string-like parts, mostly for tests and tools.
    ///
    /// ```
    /// use cellkv::commands::Command;
    ///
    /// let cmd = Command::from_parts("LPUSH", ["list", "a", "b"]);
    /// assert_eq!(cmd.args().len(), 3);
    /// ```
    pub fn from_parts<I, A>(name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        Self {
            name: name.to_string(),
            args: args
                .into_iter()
                .map(|a| Bytes::copy_from_slice(a.as_ref()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    /// The key the command operates on, used for routing.
    pub fn key(&self) -> Option<&Bytes> {
        self.args.first()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}
