//! Interactive disambiguation on the terminal.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use game_ledger_batch::Disambiguator;
use game_ledger_core::{DataSource, LedgerRow, MatchCandidate};

/// Asks the user to pick one of several candidates.
///
/// Source tasks run concurrently, so prompts are serialized; one question
/// is on screen at a time.
pub(crate) struct InteractivePrompt {
    terminal: Mutex<()>,
}

impl InteractivePrompt {
    pub(crate) fn new() -> Self {
        Self {
            terminal: Mutex::new(()),
        }
    }

    /// Run `f` with the terminal to itself. Waiting for the terminal happens
    /// off the async worker.
    fn exclusive<T>(&self, f: impl FnOnce() -> T) -> T {
        tokio::task::block_in_place(|| {
            let _guard = self.terminal.lock().unwrap_or_else(|e| e.into_inner());
            f()
        })
    }
}

impl Disambiguator for InteractivePrompt {
    fn resolve(&self, source: DataSource, row: &LedgerRow, candidates: &[MatchCandidate]) -> Option<usize> {
        let answer = self.exclusive(|| {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            ask(&mut stdin.lock(), &mut stdout, source, row, candidates)
        });
        match answer {
            Ok(choice) => choice,
            Err(e) => {
                log::warn!("cannot read selection for {}: {}", row.full_name(), e);
                None
            }
        }
    }
}

/// Print the numbered list and read a choice.
///
/// Numbers 1..=n pick a candidate and n+1 is "None of the above". Anything
/// else is asked again. End of input counts as "none".
pub(crate) fn ask<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    source: DataSource,
    row: &LedgerRow,
    candidates: &[MatchCandidate],
) -> io::Result<Option<usize>> {
    writeln!(out)?;
    writeln!(
        out,
        "Multiple matches from {} detected:",
        source.if_supports_color(Stdout, |t| t.bold())
    )?;
    writeln!(out)?;
    for (i, candidate) in candidates.iter().enumerate() {
        let url = candidate
            .url
            .as_deref()
            .map(|u| format!(" ({})", u))
            .unwrap_or_default();
        let id = candidate
            .source_id
            .as_deref()
            .map(|id| format!(", ID = {}", id))
            .unwrap_or_default();
        writeln!(out, "{}. {}{}{}", i + 1, candidate.title, url, id)?;
    }
    let none = candidates.len() + 1;
    writeln!(out, "{}. None of the above", none)?;
    write!(
        out,
        "Pick which option best matches {}: ",
        row.full_name().if_supports_color(Stdout, |t| t.cyan())
    )?;
    out.flush()?;

    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(None);
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..none).contains(&n) => return Ok(Some(n - 1)),
            Ok(n) if n == none => return Ok(None),
            _ => {
                write!(out, "Invalid selection, please select from the above list: ")?;
                out.flush()?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, mpsc};
    use std::time::Duration;

    use game_ledger_core::ValidationInfo;
    use tokio::sync::oneshot;

    fn candidates() -> Vec<MatchCandidate> {
        vec![
            MatchCandidate::new("Chrono Trigger", ValidationInfo::default())
                .with_url("https://example.test/ct")
                .with_source_id("4501"),
            MatchCandidate::new("Chrono Trigger DS", ValidationInfo::default()),
        ]
    }

    fn run(input: &str) -> (Option<usize>, String) {
        let row = LedgerRow::new("Chrono Trigger", "SNES");
        let mut out = Vec::new();
        let choice = ask(
            &mut input.as_bytes(),
            &mut out,
            DataSource::MobyGames,
            &row,
            &candidates(),
        )
        .unwrap();
        (choice, String::from_utf8(out).unwrap())
    }

    #[test]
    fn lists_candidates_with_url_and_id() {
        let (choice, out) = run("2\n");
        assert_eq!(choice, Some(1));
        assert!(out.contains("1. Chrono Trigger (https://example.test/ct), ID = 4501"));
        assert!(out.contains("2. Chrono Trigger DS\n"));
        assert!(out.contains("3. None of the above"));
    }

    #[test]
    fn last_option_declines() {
        assert_eq!(run("3\n").0, None);
    }

    #[test]
    fn invalid_input_is_asked_again() {
        let (choice, out) = run("0\nabc\n4\n 1 \n");
        assert_eq!(choice, Some(0));
        assert_eq!(out.matches("Invalid selection").count(), 3);
    }

    #[test]
    fn end_of_input_declines() {
        assert_eq!(run("").0, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn waiting_for_the_terminal_leaves_the_worker_free() {
        let prompt = Arc::new(InteractivePrompt::new());
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let first = tokio::spawn({
            let prompt = Arc::clone(&prompt);
            async move {
                prompt.exclusive(move || {
                    let _ = entered_tx.send(());
                    let _ = release_rx.recv();
                    1
                })
            }
        });
        entered_rx.await.unwrap();

        let (waiting_tx, waiting_rx) = oneshot::channel();
        let second = tokio::spawn({
            let prompt = Arc::clone(&prompt);
            async move {
                let _ = waiting_tx.send(());
                prompt.exclusive(|| 2)
            }
        });
        waiting_rx.await.unwrap();

        let other = tokio::spawn(async { 3 });
        let other = tokio::time::timeout(Duration::from_secs(5), other).await;
        assert_eq!(other.unwrap().unwrap(), 3);

        release_tx.send(()).unwrap();
        assert_eq!(first.await.unwrap(), 1);
        assert_eq!(second.await.unwrap(), 2);
    }
}
