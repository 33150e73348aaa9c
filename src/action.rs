//! Post-selection action dispatch.
//! The launcher passes the selected item's `arg` back to the workflow; a
//! `speak:` prefix requests speech playback before the clipboard copy.

use std::process::Command;

/// Prefix marking an action argument as a speech request.
pub const SPEAK_PREFIX: &str = "speak:";

#[derive(Debug, PartialEq, Eq)]
pub enum Action<'a> {
    /// Speak the text aloud, then copy it.
    Speak(&'a str),
    /// Copy the text.
    Copy(&'a str),
}

pub fn parse(arg: &str) -> Action<'_> {
    match arg.strip_prefix(SPEAK_PREFIX) {
        Some(text) => Action::Speak(text),
        None => Action::Copy(arg),
    }
}

/// Run the action and return the text to print (the launcher copies stdout
/// to the clipboard).
pub fn run(arg: &str) -> &str {
    match parse(arg) {
        Action::Speak(text) => {
            speak(text);
            text
        }
        Action::Copy(text) => text,
    }
}

/// Best-effort speech via the system `say` command. Failures are ignored;
/// the clipboard copy still happens.
fn speak(text: &str) {
    let spoken = Command::new("say")
        .args(["-v", "Alex"])
        .arg(text)
        .status()
        .map(|s| s.success())
        .unwrap_or(false);

    if !spoken {
        let _ = Command::new("say").arg(text).status();
    }
}
