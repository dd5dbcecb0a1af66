//! Terminal output with prompt redisplay
//!
//! Announcements can arrive while the player is being asked for a guess.
//! When that happens the message is printed on its own line and the console
//! remembers that the prompt has to be shown again. A newline is only
//! inserted when the prompt is still on screen without the player's Enter
//! after it. The network loop calls
//! [`Console::render`] after every event, which redraws the prompt only when
//! the `needs_redisplay` flag is set.

use std::io::{self, Stdout, Write};

pub struct Console<W: Write> {
    out: W,
    prompt: Option<String>,
    /// The prompt is the last thing on the current line
    prompt_drawn: bool,
    needs_redisplay: bool,
}

impl Console<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            prompt: None,
            prompt_drawn: false,
            needs_redisplay: false,
        }
    }

    /// Prints one announcement line
    pub fn message(&mut self, text: &str) -> io::Result<()> {
        if self.prompt_drawn {
            writeln!(self.out)?;
            self.prompt_drawn = false;
        }
        if self.prompt.is_some() {
            self.needs_redisplay = true;
        }
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    pub fn show_prompt(&mut self, prompt: impl Into<String>) -> io::Result<()> {
        self.prompt = Some(prompt.into());
        self.needs_redisplay = true;
        self.render()
    }

    pub fn clear_prompt(&mut self) {
        self.prompt = None;
        self.needs_redisplay = false;
    }

    /// The player pressed Enter, so the cursor is already on a fresh line
    pub fn line_entered(&mut self) {
        self.prompt_drawn = false;
    }

    pub fn needs_redisplay(&self) -> bool {
        self.needs_redisplay
    }

    /// Redraws the prompt if something was printed over it
    pub fn render(&mut self) -> io::Result<()> {
        if !self.needs_redisplay {
            return Ok(());
        }
        self.needs_redisplay = false;

        if let Some(prompt) = &self.prompt {
            write!(self.out, "{prompt} ")?;
            self.out.flush()?;
            self.prompt_drawn = true;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
