// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal [`Gui`]: messages go to stderr, answers come from stdin.
//!
//! Choices are numbered; an answer may be the number or the item text.
//! An empty answer, end of input or an interrupt dismisses the prompt.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::gui::{Gui, InputOptions};

type Input = Arc<Mutex<Box<dyn BufRead + Send>>>;
type Output = Arc<Mutex<Box<dyn Write + Send>>>;

pub struct TermGui {
    input: Input,
    output: Output,
    /// Read passwords from the controlling terminal without echo.
    mask_passwords: bool,
    /// Cancelled and replaced by [`TermGui::interrupt`].
    interrupt: Mutex<CancellationToken>,
}

impl TermGui {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self {
            input: Arc::new(Mutex::new(input)),
            output: Arc::new(Mutex::new(output)),
            mask_passwords: false,
            interrupt: Mutex::new(CancellationToken::new()),
        }
    }

    /// Prompt on stderr and read from stdin.
    pub fn stdio() -> Self {
        let mut gui = Self::new(Box::new(BufReader::new(std::io::stdin())), Box::new(std::io::stderr()));
        gui.mask_passwords = true;
        gui
    }

    /// Dismiss the pending prompt and cancel running progress. Later
    /// prompts are unaffected.
    pub fn interrupt(&self) {
        let previous = std::mem::replace(&mut *self.interrupt.lock(), CancellationToken::new());
        previous.cancel();
    }

    fn current_interrupt(&self) -> CancellationToken {
        self.interrupt.lock().clone()
    }

    fn say(&self, line: &str) {
        let mut out = self.output.lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    async fn read_line(&self, prompt: String, masked: bool) -> Option<String> {
        let interrupt = self.current_interrupt();
        let input = Arc::clone(&self.input);
        let output = Arc::clone(&self.output);
        let read = tokio::task::spawn_blocking(move || {
            if masked {
                return rpassword::prompt_password(prompt).ok();
            }
            {
                let mut out = output.lock();
                let _ = write!(out, "{prompt}");
                let _ = out.flush();
            }
            let mut line = String::new();
            match input.lock().read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_owned()),
            }
        });
        tokio::select! {
            biased;
            _ = interrupt.cancelled() => None,
            joined = read => joined.ok().flatten(),
        }
    }

    async fn choose(&self, items: &[String]) -> Option<String> {
        if items.is_empty() {
            return None;
        }
        for (idx, item) in items.iter().enumerate() {
            self.say(&format!("  {}) {item}", idx + 1));
        }
        let answer = self.read_line("> ".to_owned(), false).await?;
        resolve_choice(&answer, items)
    }
}

/// Match an answer against numbered `items`, by 1-based index or by text.
pub fn resolve_choice(answer: &str, items: &[String]) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    if let Ok(n) = answer.parse::<usize>() {
        return n.checked_sub(1).and_then(|idx| items.get(idx)).cloned();
    }
    items.iter().find(|item| item.eq_ignore_ascii_case(answer)).cloned()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[async_trait]
impl Gui for TermGui {
    async fn show_message(&self, message: &str, items: &[&str]) -> Option<String> {
        self.say(message);
        self.choose(&owned(items)).await
    }

    async fn error_message(&self, message: &str, items: &[&str]) -> Option<String> {
        self.say(&format!("error: {message}"));
        self.choose(&owned(items)).await
    }

    async fn warning_modal(&self, message: &str, items: &[&str]) -> Option<String> {
        self.say(&format!("warning: {message}"));
        self.choose(&owned(items)).await
    }

    async fn pick(&self, placeholder: &str, items: &[String]) -> Option<String> {
        self.say(placeholder);
        self.choose(items).await
    }

    async fn input(&self, options: &InputOptions) -> Option<String> {
        let mut prompt = options.prompt.clone();
        if let Some(ref value) = options.value {
            if !options.password {
                prompt.push_str(&format!(" [{value}]"));
            }
        } else if let Some(ref placeholder) = options.placeholder {
            prompt.push_str(&format!(" ({placeholder})"));
        }
        prompt.push_str(": ");
        let answer = self.read_line(prompt, options.password && self.mask_passwords).await?;
        if answer.is_empty() {
            return options.value.clone().or(Some(answer));
        }
        Some(answer)
    }

    async fn open_file(&self, path: &Path, position: Option<(usize, usize)>) {
        match position {
            Some((line, column)) => self.say(&format!("open: {}:{line}:{column}", path.display())),
            None => self.say(&format!("open: {}", path.display())),
        }
    }

    fn begin_progress(&self, title: &str) -> CancellationToken {
        self.say(title);
        self.current_interrupt().child_token()
    }
}

#[cfg(test)]
#[path = "term_tests.rs"]
mod tests;
