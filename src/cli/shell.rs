//! Interactive shell
//!
//! Line commands stand in for the drop zone and the buttons: `open` drops a
//! file, `theme` flips the toggle, `download` and `reset` are the two result
//! buttons. Attempts run in the background so a new `open` can supersede one
//! that is still in flight.

use super::view::ProgressView;
use crate::controller::SessionController;
use crate::intake::IntakeFilter;
use crate::render::render;
use crate::session::Session;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::debug;

const HELP: &str = "\
Commands:
  open <path>      process an image (PNG, JPG, JPEG)
  theme            toggle light/dark mode
  download [dir]   save the result as removed-background.png
  reset            clear the session and upload a new image
  status           show the current screen
  help             show this help
  quit             leave";

/// One line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Open(Vec<PathBuf>),
    Theme,
    Download(Option<PathBuf>),
    Reset,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        match word.to_ascii_lowercase().as_str() {
            "open" | "o" => Ok(Self::Open(split_paths(rest))),
            "theme" | "t" => Ok(Self::Theme),
            "download" | "d" => Ok(Self::Download(
                Some(rest).filter(|r| !r.is_empty()).map(PathBuf::from),
            )),
            "reset" | "new" => Ok(Self::Reset),
            "status" | "s" => Ok(Self::Status),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command '{}'; type `help`", other)),
        }
    }
}

/// A single existing path may contain spaces; otherwise split on whitespace
fn split_paths(rest: &str) -> Vec<PathBuf> {
    if rest.is_empty() {
        Vec::new()
    } else if Path::new(rest).exists() {
        vec![PathBuf::from(rest)]
    } else {
        rest.split_whitespace().map(PathBuf::from).collect()
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Redraw the screen whenever an attempt settles
async fn follow_session(mut rx: watch::Receiver<Session>, max_upload_bytes: u64) {
    let mut view = ProgressView::new();
    loop {
        let settled = {
            let session = rx.borrow_and_update();
            view.update(session.state()).then(|| session.state().clone())
        };
        if let Some(state) = settled {
            print!("\n{}", render(&state, max_upload_bytes));
            prompt();
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}

pub(crate) struct Shell {
    controller: SessionController,
    intake: IntakeFilter,
    output_dir: PathBuf,
}

impl Shell {
    pub(crate) fn new(controller: SessionController, intake: IntakeFilter, output_dir: PathBuf) -> Self {
        Self {
            controller,
            intake,
            output_dir,
        }
    }

    fn print_screen(&self) {
        print!("{}", render(&self.controller.snapshot(), self.intake.max_bytes()));
    }

    /// Admit a selection and start an attempt in the background
    async fn open(&self, paths: &[PathBuf]) {
        match self.intake.admit(paths).await {
            Ok(file) => {
                let controller = self.controller.clone();
                tokio::spawn(async move {
                    let attempt = controller.on_drop(file).await;
                    debug!(%attempt, "attempt settled");
                });
            },
            Err(e) => println!("Rejected: {}", e),
        }
    }

    async fn download(&self, dir: Option<&Path>) {
        let dir = dir.unwrap_or(&self.output_dir);
        match self.controller.handle_download(dir).await {
            Ok(Some(path)) => println!("Saved {}", path.display()),
            Ok(None) => println!("Nothing to download yet"),
            Err(e) => println!("Download failed: {}", e),
        }
    }

    /// Read commands from stdin until `quit` or end of input
    pub(crate) async fn run(self, initial: Option<PathBuf>) -> Result<()> {
        let follower = tokio::spawn(follow_session(
            self.controller.subscribe(),
            self.intake.max_bytes(),
        ));

        self.print_screen();
        println!("{}", HELP);
        if let Some(path) = initial {
            self.open(&[path]).await;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        prompt();
        while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
            if line.trim().is_empty() {
                prompt();
                continue;
            }
            match line.parse::<Command>() {
                Ok(Command::Open(paths)) => self.open(&paths).await,
                Ok(Command::Theme) => {
                    let theme = self.controller.toggle_theme();
                    println!("Switched to {} mode", theme);
                },
                Ok(Command::Download(dir)) => self.download(dir.as_deref()).await,
                Ok(Command::Reset) => {
                    self.controller.reset();
                    self.print_screen();
                },
                Ok(Command::Status) => self.print_screen(),
                Ok(Command::Help) => println!("{}", HELP),
                Ok(Command::Quit) => break,
                Err(message) => println!("{}", message),
            }
            prompt();
        }

        follower.abort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("theme".parse::<Command>(), Ok(Command::Theme));
        assert_eq!("  RESET ".parse::<Command>(), Ok(Command::Reset));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("download".parse::<Command>(), Ok(Command::Download(None)));
        assert_eq!(
            "download out/dir".parse::<Command>(),
            Ok(Command::Download(Some(PathBuf::from("out/dir"))))
        );
        assert!("fly".parse::<Command>().is_err());
    }

    #[test]
    fn test_open_splits_unknown_paths() {
        assert_eq!("open".parse::<Command>(), Ok(Command::Open(Vec::new())));
        assert_eq!(
            "open /no/such/a.png /no/such/b.png".parse::<Command>(),
            Ok(Command::Open(vec![
                PathBuf::from("/no/such/a.png"),
                PathBuf::from("/no/such/b.png")
            ]))
        );
    }

    #[test]
    fn test_open_keeps_existing_path_with_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my cat.png");
        std::fs::write(&path, b"x").unwrap();

        let line = format!("open {}", path.display());
        assert_eq!(line.parse::<Command>(), Ok(Command::Open(vec![path])));
    }
}
