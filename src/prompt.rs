use std::collections::VecDeque;
use std::io::{BufRead, Write};

use anyhow::Context as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub key: String,
    pub label: String,
}

impl MenuOption {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// A question with a list of keyed options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub heading: String,
    pub options: Vec<MenuOption>,
    pub question: String,
}

/// Source of interactive answers.
pub trait Prompter: Send {
    /// Show `menu` and return the answer line, trimmed.
    fn ask(&mut self, menu: &Menu) -> anyhow::Result<String>;
}

/// Menu on stdout, answers from stdin.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn ask(&mut self, menu: &Menu) -> anyhow::Result<String> {
        blocking(|| {
            prompt_on(
                &mut std::io::stdout().lock(),
                &mut std::io::stdin().lock(),
                menu,
            )
        })
    }
}

/// Write `menu` to `out`, then read one answer line from `input`.
/// End of input is an error.
pub fn prompt_on(
    out: &mut impl Write,
    input: &mut impl BufRead,
    menu: &Menu,
) -> anyhow::Result<String> {
    writeln!(out, "\n{}", menu.heading).context("write prompt")?;
    for option in &menu.options {
        writeln!(out, " [{}] {}", option.key, option.label).context("write prompt")?;
    }
    write!(out, "\n{}", menu.question).context("write prompt")?;
    out.flush().context("flush prompt")?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("read answer from stdin")?;
    if read == 0 {
        anyhow::bail!("stdin closed while waiting for an answer to: {}", menu.question.trim());
    }
    Ok(line.trim().to_owned())
}

/// Run blocking terminal I/O with `block_in_place` on a multi-threaded
/// runtime so the other tasks keep their worker; inline anywhere else.
pub(crate) fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Replays canned answers in order and records every menu it was shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<Menu>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    pub fn asked(&self) -> &[Menu] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, menu: &Menu) -> anyhow::Result<String> {
        self.asked.push(menu.clone());
        let answer = self
            .answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted answer left for: {}", menu.question))?;
        Ok(answer.trim().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Menu {
        Menu {
            heading: "Pick one:".to_owned(),
            options: vec![MenuOption::new("1", "first")],
            question: "> ".to_owned(),
        }
    }

    #[test]
    fn scripted_prompter_replays_trimmed_answers_then_fails() -> anyhow::Result<()> {
        let mut prompter = ScriptedPrompter::new([" 1 ", "a"]);
        assert_eq!(prompter.ask(&menu())?, "1");
        assert_eq!(prompter.ask(&menu())?, "a");
        assert!(prompter.ask(&menu()).is_err());
        assert_eq!(prompter.asked().len(), 3);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn console_prompt_reads_off_the_async_workers() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut input = std::io::Cursor::new(&b" 1 \nnext\n"[..]);

        let answer = blocking(|| prompt_on(&mut out, &mut input, &menu()))?;
        assert_eq!(answer, "1");
        assert_eq!(String::from_utf8(out)?, "\nPick one:\n [1] first\n\n> ");
        Ok(())
    }

    #[tokio::test]
    async fn closed_input_is_an_error_on_a_single_threaded_runtime() {
        let mut out = Vec::new();
        let mut input = std::io::Cursor::new(&b""[..]);

        let err = blocking(|| prompt_on(&mut out, &mut input, &menu()))
            .expect_err("no answer to read");
        assert!(err.to_string().contains("stdin closed"));
    }
}
