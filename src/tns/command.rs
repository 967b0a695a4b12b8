//! Command line assembly for tns invocations

/// Default NativeScript CLI program name
pub const TNS_PROGRAM: &str = "tns";

/// Builds a tns command line from ordered, optionally conditional tokens
///
/// Tokens are joined with single spaces and never quoted, so callers must
/// pass well-formed tokens.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    tokens: Vec<String>,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::with_program(TNS_PROGRAM)
    }

    /// Start from a specific CLI program (e.g. a configured absolute path)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            tokens: vec![program.into()],
        }
    }

    pub fn append_param(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(token.into());
        self
    }

    /// Append `token` only when `condition` holds
    pub fn try_append_param(self, token: impl Into<String>, condition: bool) -> Self {
        if condition {
            self.append_param(token)
        } else {
            self
        }
    }

    /// Append pass-through arguments in order
    pub fn append_params<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn build(&self) -> String {
        self.tokens.join(" ")
    }
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}
