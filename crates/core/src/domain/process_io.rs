// Expected local-process conversation
//
// Tokens are consumed strictly in order by the process-IO parser.

/// One step of the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Expect output only
    Output {
        success: Vec<String>,
        error: Vec<String>,
    },
    /// Expect output ending with `prompt`, then send `reply`
    Input {
        success: Vec<String>,
        error: Vec<String>,
        prompt: String,
        reply: String,
    },
}

impl Token {
    pub fn output<S: Into<String>>(
        success: impl IntoIterator<Item = S>,
        error: impl IntoIterator<Item = S>,
    ) -> Self {
        Token::Output {
            success: success.into_iter().map(Into::into).collect(),
            error: error.into_iter().map(Into::into).collect(),
        }
    }

    pub fn input<S: Into<String>>(
        success: impl IntoIterator<Item = S>,
        error: impl IntoIterator<Item = S>,
        prompt: impl Into<String>,
        reply: impl Into<String>,
    ) -> Self {
        Token::Input {
            success: success.into_iter().map(Into::into).collect(),
            error: error.into_iter().map(Into::into).collect(),
            prompt: prompt.into(),
            reply: reply.into(),
        }
    }

    pub fn success(&self) -> &[String] {
        match self {
            Token::Output { success, .. } | Token::Input { success, .. } => success,
        }
    }

    pub fn error(&self) -> &[String] {
        match self {
            Token::Output { error, .. } | Token::Input { error, .. } => error,
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        match self {
            Token::Input { prompt, .. } => Some(prompt),
            Token::Output { .. } => None,
        }
    }

    pub fn reply(&self) -> Option<&str> {
        match self {
            Token::Input { reply, .. } => Some(reply),
            Token::Output { .. } => None,
        }
    }
}

/// Ordered sequence of tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessIoContent {
    tokens: Vec<Token>,
}

impl ProcessIoContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, token: Token) -> Self {
        self.tokens.push(token);
        self
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Conversation of a command that prints `Command <name> executed successfully.`
    pub fn command_executed() -> Self {
        Self::new().push(Token::output(
            ["Command", "executed successfully"],
            ["failed"],
        ))
    }

    /// Password change conversation: old password, new password, confirmation
    pub fn password_change(old_password: &str, new_password: &str) -> Self {
        Self::new()
            .push(Token::input(
                ["Enter the admin password"],
                ["failed"],
                "password>",
                old_password,
            ))
            .push(Token::input(
                ["Enter the new admin password"],
                ["failed"],
                "password>",
                new_password,
            ))
            .push(Token::input(
                ["Enter the new admin password again"],
                ["failed"],
                "again>",
                new_password,
            ))
            .push(Token::output(
                ["Command", "executed successfully"],
                ["failed"],
            ))
    }
}
