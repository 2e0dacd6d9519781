use anyhow::{Context, Result};
use arboard::Clipboard;
use std::io::{self, Write};

/// Where the finished payload goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Clipboard,
    Stdout,
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().context("Failed to open the system clipboard")?;
    clipboard
        .set_text(text.to_owned())
        .context("Failed to copy to clipboard")?;
    Ok(())
}

/// Sends `text` to `destination`, falling back to stdout if the clipboard
/// is unavailable. Returns where the text actually went.
pub fn deliver(text: &str, destination: Destination) -> Result<Destination> {
    if destination == Destination::Clipboard {
        match copy_to_clipboard(text) {
            Ok(()) => return Ok(Destination::Clipboard),
            Err(e) => log::warn!("{:#}; printing to stdout instead", e),
        }
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", text).context("Failed to write to stdout")?;
    Ok(Destination::Stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_destination_skips_clipboard() {
        assert_eq!(
            deliver("payload", Destination::Stdout).unwrap(),
            Destination::Stdout
        );
    }
}
