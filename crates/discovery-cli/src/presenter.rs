use std::io::{BufRead, Write};

use discovery_core::{ConfirmRequest, Confirmation, Level, Presenter};

/// How the send confirmation gets answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmMode {
    /// `--yes`: accept without asking.
    AssumeYes,
    /// Ask on stdin.
    Prompt,
    /// stdin is busy (interactive session); decline and say how to send.
    Decline,
}

/// Notifications go to stderr with their icon. The confirmation shows the
/// summary on stdout.
pub struct TerminalPresenter {
    mode: ConfirmMode,
}

impl TerminalPresenter {
    pub fn new(mode: ConfirmMode) -> Self {
        Self { mode }
    }

    pub fn with_yes(yes: bool, otherwise: ConfirmMode) -> Self {
        Self::new(if yes { ConfirmMode::AssumeYes } else { otherwise })
    }
}

impl Presenter for TerminalPresenter {
    fn notify(&mut self, message: &str, level: Level) {
        eprintln!("{} {message}", level.icon());
    }

    fn confirm(&mut self, request: &ConfirmRequest) -> Confirmation {
        println!("{}\n", request.title);
        println!("{}\n", request.body);

        match self.mode {
            ConfirmMode::AssumeYes => Confirmation::Accepted,
            ConfirmMode::Decline => {
                eprintln!("not sent; rerun with --yes to send");
                Confirmation::Cancelled
            }
            ConfirmMode::Prompt => ask(&mut std::io::stdin().lock(), &mut std::io::stderr()),
        }
    }
}

/// Ask on `output`, read the reply from `input`. Any failure declines.
fn ask(input: &mut impl BufRead, output: &mut impl Write) -> Confirmation {
    if let Err(e) = write!(output, "Send via WhatsApp? [y/N] ") {
        tracing::warn!("failed to show confirmation prompt: {e}");
    }
    if let Err(e) = output.flush() {
        tracing::debug!("failed to flush confirmation prompt: {e}");
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => parse_reply(&answer),
        Err(e) => {
            tracing::warn!("failed to read confirmation: {e}");
            Confirmation::Cancelled
        }
    }
}

fn parse_reply(answer: &str) -> Confirmation {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Confirmation::Accepted,
        _ => Confirmation::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply() {
        assert_eq!(parse_reply("y\n"), Confirmation::Accepted);
        assert_eq!(parse_reply("  YES "), Confirmation::Accepted);
        assert_eq!(parse_reply("\n"), Confirmation::Cancelled);
        assert_eq!(parse_reply("no"), Confirmation::Cancelled);
        assert_eq!(parse_reply(""), Confirmation::Cancelled);
    }

    /// Accepts writes, fails every flush.
    struct NoFlush(Vec<u8>);

    impl Write for NoFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("closed"))
        }
    }

    #[test]
    fn test_ask_reads_reply_after_prompt() {
        let mut output = Vec::new();
        let reply = ask(&mut "yes\n".as_bytes(), &mut output);
        assert_eq!(reply, Confirmation::Accepted);
        assert_eq!(String::from_utf8(output).unwrap(), "Send via WhatsApp? [y/N] ");
    }

    #[test]
    fn test_ask_survives_failed_flush() {
        let mut output = NoFlush(Vec::new());
        assert_eq!(ask(&mut "y\n".as_bytes(), &mut output), Confirmation::Accepted);
        assert!(!output.0.is_empty());
    }

    #[test]
    fn test_ask_at_eof_declines() {
        let mut output = Vec::new();
        assert_eq!(ask(&mut "".as_bytes(), &mut output), Confirmation::Cancelled);
    }

    #[test]
    fn test_with_yes() {
        assert_eq!(
            TerminalPresenter::with_yes(true, ConfirmMode::Prompt).mode,
            ConfirmMode::AssumeYes
        );
        assert_eq!(
            TerminalPresenter::with_yes(false, ConfirmMode::Decline).mode,
            ConfirmMode::Decline
        );
    }

    #[test]
    fn test_assume_yes_accepts() {
        let mut presenter = TerminalPresenter::new(ConfirmMode::AssumeYes);
        let request = ConfirmRequest {
            title: "t".into(),
            body: "b".into(),
            link: "https://wa.me/1?text=b".into(),
        };
        assert_eq!(presenter.confirm(&request), Confirmation::Accepted);
    }
}
