use std::io::{self, BufRead, Write};

/// Outcome of the post-diff confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Apply,
    Cancel,
    EditAgain,
}

/// Seam for user interaction so sessions can be driven in tests.
pub trait Prompter {
    /// The "continue Editing, apply, cancel" decision after the diff.
    fn confirm_changes(&mut self) -> io::Result<ConfirmChoice>;

    /// Offer another editing round after a parse failure. Defaults to yes.
    fn retry_after_parse_error(&mut self) -> io::Result<bool>;

    /// Pick one of `count` candidates, 1-based.
    fn choose_candidate(&mut self, count: usize) -> io::Result<usize>;

    /// Session messages: diffs, "No changes; aborting.", warnings.
    fn inform(&mut self, message: &str);
}

/// Interactive prompter over stdin/stdout.
pub struct ConsolePrompter;

impl ConsolePrompter {
    fn ask(&self, prompt: &str) -> io::Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}

impl Prompter for ConsolePrompter {
    fn confirm_changes(&mut self) -> io::Result<ConfirmChoice> {
        loop {
            let answer = self.ask("continue Editing, apply, cancel? ")?;
            match answer.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
                Some('a') => return Ok(ConfirmChoice::Apply),
                Some('c') => return Ok(ConfirmChoice::Cancel),
                Some('e') => return Ok(ConfirmChoice::EditAgain),
                _ => continue,
            }
        }
    }

    fn retry_after_parse_error(&mut self) -> io::Result<bool> {
        let answer = self.ask("Edit again to fix? (Y/n) ")?;
        Ok(!answer.trim().eq_ignore_ascii_case("n"))
    }

    fn choose_candidate(&mut self, count: usize) -> io::Result<usize> {
        loop {
            let answer = self.ask(&format!("Choose a candidate (1-{count}): "))?;
            if let Ok(selection) = answer.trim().parse::<usize>() {
                if (1..=count).contains(&selection) {
                    return Ok(selection);
                }
            }
        }
    }

    fn inform(&mut self, message: &str) {
        println!("{message}");
    }
}
