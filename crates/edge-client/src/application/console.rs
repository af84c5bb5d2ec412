//! The user-facing console seen by the application layer.

use std::io;

use async_trait::async_trait;

/// Line-oriented user interaction.
///
/// The binary wires this to stdin/stdout; tests script it.
#[async_trait]
pub trait Console: Send {
    /// Prints `prompt` without a newline and reads one line.
    ///
    /// Returns `Ok(None)` at end of input.  The line terminator is stripped.
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Prints one line.
    fn show(&mut self, line: &str);
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned input and records everything printed.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedConsole {
        input: VecDeque<String>,
        pub prompts: Vec<String>,
        pub output: Vec<String>,
    }

    impl ScriptedConsole {
        pub(crate) fn new<I, T>(input: I) -> Self
        where
            I: IntoIterator<Item = T>,
            T: Into<String>,
        {
            Self {
                input: input.into_iter().map(Into::into).collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Console for ScriptedConsole {
        async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
            self.prompts.push(prompt.to_string());
            Ok(self.input.pop_front())
        }

        fn show(&mut self, line: &str) {
            self.output.push(line.to_string());
        }
    }
}
