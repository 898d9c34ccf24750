//! Terminal drivers.
//!
//! Status lines and prompts go to stderr, paste content to stdout or a file.
//! Answers are read line by line from stdin. Command-line flags can answer
//! the first prompt of each kind ahead of time, so reads can run unattended.

use std::{
    ffi::OsStr,
    fs::OpenOptions,
    io::{self, Write},
    path::{Path, PathBuf},
};

use cinder_app::{
    Deletion, Presented, ReadDriver, ReadEvent, ReadSession, ReadState, WriteDriver, WriteFlow,
    WriteState, user_message,
};
use cinder_core::{Environment, StoreError, readable_bytes};
use cinder_crypto::Passphrase;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal or file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Question put to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Fetch failed; try again?
    RetryFetch,
    /// Paste is encrypted.
    Passphrase,
    /// Confirm the one-time reveal.
    Reveal,
    /// Delete failed; try again?
    RetryDelete,
    /// Content is shown; burn when ready.
    Burn,
}

impl Prompt {
    fn text(self) -> &'static str {
        match self {
            Self::RetryFetch => "Retry? [Y/n] ",
            Self::Passphrase => "Passphrase: ",
            Self::Reveal => "Reveal now? It is deleted once shown. [y/N] ",
            Self::RetryDelete => "Retry deleting? [Y/n] ",
            Self::Burn => "Press enter to burn. ",
        }
    }

    /// Event for an answer line. `None` means the reader leaves.
    pub fn answer(self, line: &str) -> Option<ReadEvent> {
        let word = line.trim().to_ascii_lowercase();
        let yes = matches!(word.as_str(), "y" | "yes");
        let no = matches!(word.as_str(), "n" | "no");

        match self {
            Self::RetryFetch => (!no).then_some(ReadEvent::RetryFetch),
            Self::Passphrase => {
                Some(ReadEvent::PassphraseSubmitted(Passphrase::new(line.trim_end_matches('\r'))))
            },
            Self::Reveal => yes.then_some(ReadEvent::RevealRequested),
            Self::RetryDelete => (!no).then_some(ReadEvent::RetryDelete),
            Self::Burn => Some(ReadEvent::BurnRequested),
        }
    }
}

/// Question the reader should be asked for this session, if any.
pub fn prompt_for(session: &ReadSession) -> Option<Prompt> {
    if session.is_busy() || session.is_burning() {
        return None;
    }
    match session.state() {
        ReadState::Loading => session.error().map(|_| Prompt::RetryFetch),
        ReadState::Encrypted => Some(Prompt::Passphrase),
        ReadState::NotEncrypted => Some(Prompt::Reveal),
        ReadState::Viewing if session.deletion() == Deletion::Failed => Some(Prompt::RetryDelete),
        ReadState::Viewing => Some(Prompt::Burn),
        ReadState::Burned => None,
    }
}

/// One-line description of the session.
pub fn status_line(session: &ReadSession) -> String {
    if let Some(err) = session.error() {
        return user_message(err);
    }

    let busy = session.is_busy();
    let line = match session.state() {
        ReadState::Loading => "Loading...",
        ReadState::Encrypted if busy => "Decrypting...",
        ReadState::Encrypted => "This paste is encrypted.",
        ReadState::NotEncrypted if busy => "Opening...",
        ReadState::NotEncrypted => "This paste can be read once.",
        ReadState::Viewing if session.is_burning() => "Burning...",
        ReadState::Viewing => match session.deletion() {
            Deletion::Confirmed => "Deleted from the server. This is the only copy.",
            Deletion::Failed => "Warning: deleting failed, the paste may still be readable.",
            Deletion::NotRequested | Deletion::InFlight => "Deleting from the server...",
        },
        ReadState::Burned => "Burned.",
    };
    line.to_owned()
}

/// File name safe to create in the working directory.
fn safe_file_name(name: &str) -> PathBuf {
    Path::new(name)
        .file_name()
        .map_or_else(|| PathBuf::from("cinder-download"), PathBuf::from)
}

/// Most numbered alternatives tried before giving up on a name.
const MAX_NAME_SUFFIX: u32 = 999;

/// `stem (n).ext` alongside `path`.
fn numbered(path: &Path, n: u32) -> PathBuf {
    let stem = path.file_stem().map(OsStr::to_string_lossy).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem} ({n}).{}", ext.to_string_lossy()),
        None => format!("{stem} ({n})"),
    };
    path.with_file_name(name)
}

/// Write `body` to `path`, or to the first free `stem (n).ext` next to it.
/// Existing files are never touched. Returns the path written.
fn save_new(path: &Path, body: &[u8]) -> io::Result<PathBuf> {
    for n in 0..=MAX_NAME_SUFFIX {
        let candidate = if n == 0 { path.to_path_buf() } else { numbered(path, n) };
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(body)?;
                file.flush()?;
                return Ok(candidate);
            },
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {},
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} and its numbered alternatives all exist", path.display()),
    ))
}

/// Interactive reader on stdin/stderr.
pub struct TerminalReader<E: Environment> {
    lines: Lines<BufReader<Stdin>>,
    env: E,
    prompt: Option<Prompt>,
    asked: bool,
    last_status: Option<String>,
    shown: bool,
    passphrase: Option<Passphrase>,
    auto_reveal: bool,
    auto_burn: bool,
    output: Option<PathBuf>,
}

impl<E: Environment> TerminalReader<E> {
    /// Reader on the process's stdin. `env` dates download names.
    pub fn new(env: E) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            env,
            prompt: None,
            asked: false,
            last_status: None,
            shown: false,
            passphrase: None,
            auto_reveal: false,
            auto_burn: false,
            output: None,
        }
    }

    /// Try `passphrase` before asking.
    #[must_use]
    pub fn with_passphrase(mut self, passphrase: Option<Passphrase>) -> Self {
        self.passphrase = passphrase;
        self
    }

    /// Answer the reveal and burn prompts ahead of time.
    #[must_use]
    pub fn answering(mut self, reveal: bool, burn: bool) -> Self {
        self.auto_reveal = reveal;
        self.auto_burn = burn;
        self
    }

    /// Save files to `output` instead of their download name. Like download
    /// names, an existing file there is kept and a numbered name used.
    #[must_use]
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    fn auto_answer(&mut self, prompt: Prompt) -> Option<ReadEvent> {
        match prompt {
            Prompt::Passphrase => self.passphrase.take().map(ReadEvent::PassphraseSubmitted),
            Prompt::Reveal if self.auto_reveal => {
                self.auto_reveal = false;
                Some(ReadEvent::RevealRequested)
            },
            Prompt::Burn if self.auto_burn => {
                self.auto_burn = false;
                Some(ReadEvent::BurnRequested)
            },
            _ => None,
        }
    }

    fn show(&self, presented: &Presented) -> io::Result<()> {
        if let Some(text) = presented.message() {
            let mut out = io::stdout().lock();
            out.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                writeln!(out)?;
            }
            return out.flush();
        }

        let path = self.output.clone().unwrap_or_else(|| {
            safe_file_name(&presented.download_name(self.env.wall_clock_secs()))
        });
        let path = save_new(&path, presented.body())?;
        writeln!(
            io::stderr(),
            "{} ({}) saved to {}",
            presented.content_type(),
            presented.readable_size(),
            path.display()
        )
    }
}

impl<E: Environment> ReadDriver for TerminalReader<E> {
    type Error = TerminalError;

    async fn next_input(&mut self) -> Result<Option<ReadEvent>, Self::Error> {
        let Some(prompt) = self.prompt else {
            return std::future::pending().await;
        };

        if let Some(event) = self.auto_answer(prompt) {
            self.prompt = None;
            return Ok(Some(event));
        }

        if !self.asked {
            let mut err = io::stderr();
            write!(err, "{}", prompt.text())?;
            err.flush()?;
            self.asked = true;
        }

        match self.lines.next_line().await? {
            Some(line) => {
                self.prompt = None;
                Ok(prompt.answer(&line))
            },
            // EOF: the reader is gone
            None => Ok(None),
        }
    }

    fn render(&mut self, session: &ReadSession) -> Result<(), Self::Error> {
        let status = status_line(session);
        if self.last_status.as_deref() != Some(status.as_str()) {
            writeln!(io::stderr(), "{status}")?;
            self.last_status = Some(status);
        }

        if let Some(presented) = session.presented()
            && !self.shown
        {
            self.show(presented)?;
            self.shown = true;
        }

        let prompt = prompt_for(session);
        if prompt != self.prompt {
            self.prompt = prompt;
            self.asked = false;
        }
        Ok(())
    }
}

/// Writer prompts on stdin/stderr.
pub struct TerminalWriter {
    assume_yes: bool,
    interactive: bool,
    max_attempts: u32,
    last_state: &'static str,
}

impl TerminalWriter {
    /// `interactive` is false when stdin carried the content and cannot
    /// answer questions.
    pub fn new(assume_yes: bool, interactive: bool, max_attempts: u32) -> Self {
        Self { assume_yes, interactive, max_attempts, last_state: "" }
    }
}

impl WriteDriver for TerminalWriter {
    type Error = TerminalError;

    async fn confirm_large(&mut self, size: u64) -> Result<bool, Self::Error> {
        if self.assume_yes {
            return Ok(true);
        }

        let mut err = io::stderr();
        if !self.interactive {
            writeln!(err, "Encrypting {} is slow; pass --yes to go ahead.", readable_bytes(size))?;
            return Ok(false);
        }

        write!(err, "Encrypting {} is slow. Continue? [y/N] ", readable_bytes(size))?;
        err.flush()?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let answer = lines.next_line().await?.unwrap_or_default();
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    async fn retry_upload(&mut self, error: &StoreError, attempts: u32) -> Result<bool, Self::Error> {
        let retry = attempts < self.max_attempts;
        writeln!(io::stderr(), "Upload failed ({error}), attempt {attempts} of {}.", self.max_attempts)?;
        Ok(retry)
    }

    fn render(&mut self, flow: &WriteFlow) -> Result<(), Self::Error> {
        let state = flow.state();
        let name = state.name();
        if name == self.last_state {
            return Ok(());
        }
        self.last_state = name;

        match state {
            WriteState::Sealing => writeln!(io::stderr(), "Sealing...")?,
            WriteState::Uploading => writeln!(io::stderr(), "Uploading...")?,
            _ => {},
        }
        Ok(())
    }
}
