//! Interactive console on the process's stdin and stdout.

use std::io::{self, Write};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::application::console::Console;

pub struct StdConsole {
    lines: Lines<BufReader<Stdin>>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut out = io::stdout().lock();
            out.write_all(prompt.as_bytes())?;
            out.flush()?;
        }
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim_end_matches('\r').to_string()))
    }

    fn show(&mut self, line: &str) {
        println!("{line}");
    }
}
