//! Subcommand implementations.

use std::{
    io::{self, Write},
    path::Path,
};

use cinder_app::{
    AppConfig, ReadRuntime, ReadSession, SystemEnv, WriteDriver, WriteRequest, WriteRuntime,
};
use cinder_core::{Environment, Handle, Paste, PasteError, PasteStore};
use cinder_crypto::{IV_LEN, Passphrase, seal};
use cinder_proto::{FramedContent, encode};
use cinder_store::RedbStore;
use tokio::io::AsyncReadExt;

use crate::{
    Cli, CliError, Command, OpenArgs, ReadArgs, SealArgs, TerminalError, TerminalReader,
    TerminalWriter, WriteArgs,
};

/// Run the parsed command line.
///
/// # Errors
///
/// Returns the first error that stopped the command.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.app_config();
    let Cli { db, command, .. } = cli;
    let env = SystemEnv::new();

    match command {
        Command::Write(args) => {
            let store = RedbStore::open(&db, env)?;
            let interactive = args.file.is_some();
            let body = read_input(args.file.as_deref()).await?;
            let writer = TerminalWriter::new(args.yes, interactive, args.attempts);

            let link = publish(store, env, config, &args, body, writer).await?;
            writeln!(io::stdout(), "{link}")?;
        },
        Command::Read(args) => {
            let store = RedbStore::open(&db, env)?;
            read(store, env, &config, &args).await?;
        },
        Command::Seal(SealArgs { file, title, passphrase }) => {
            let input = read_input(file.as_deref()).await?;
            let passphrase = passphrase.and_then(Passphrase::non_empty);
            let mut iv = [0u8; IV_LEN];
            env.random_bytes(&mut iv);

            let envelope = tokio::task::spawn_blocking(move || {
                seal_content(&title, &input, passphrase.as_ref(), iv)
            })
            .await?;

            let mut out = io::stdout().lock();
            out.write_all(&envelope)?;
            out.flush()?;
        },
        Command::Open(OpenArgs { file, passphrase }) => {
            let input = read_input(file.as_deref()).await?;
            let passphrase = passphrase.and_then(Passphrase::non_empty);

            let content =
                tokio::task::spawn_blocking(move || open_envelope(input, passphrase.as_ref()))
                    .await??;

            if !content.title.is_empty() {
                writeln!(io::stderr(), "title: {}", content.title())?;
            }
            let mut out = io::stdout().lock();
            out.write_all(&content.body)?;
            out.flush()?;
        },
        Command::Purge => {
            let store = RedbStore::open(&db, env)?;
            let purged = store.purge_expired().await?;
            tracing::info!(purged, db = %db.display(), "purged expired pastes");
            writeln!(io::stderr(), "Purged {purged} expired paste(s).")?;
        },
    }
    Ok(())
}

/// Publish `body` through a write runtime and return the share link.
///
/// The title defaults to the input file name. The content type defaults to
/// `text/plain` for messages and to a guess from the file extension for
/// files.
///
/// # Errors
///
/// Returns `CliError::Runtime` if the write is rejected, declined or the
/// upload gives up.
pub async fn publish<S, E, D>(
    store: S,
    env: E,
    config: AppConfig,
    args: &WriteArgs,
    body: Vec<u8>,
    driver: D,
) -> Result<String, CliError>
where
    S: PasteStore,
    E: Environment,
    D: WriteDriver<Error = TerminalError>,
{
    let file_name = args.file.as_deref().and_then(Path::file_name);
    let title = match (&args.title, file_name) {
        (Some(title), _) => title.clone(),
        (None, Some(name)) => name.to_string_lossy().into_owned(),
        (None, None) => String::new(),
    };
    let content_type = args.content_type.clone().unwrap_or_else(|| match &args.file {
        Some(path) => mime_guess::from_path(path).first_or_octet_stream().to_string(),
        None => "text/plain".to_owned(),
    });

    let mut request =
        WriteRequest::file(title, content_type, body).with_expiration(args.expires);
    if let Some(passphrase) = args.passphrase.as_deref().and_then(Passphrase::non_empty) {
        request = request.with_passphrase(passphrase);
    }

    let (handle, link) = WriteRuntime::new(driver, store, env, config).run(request).await?;
    tracing::info!(%handle, expires = %args.expires, "published");
    Ok(link)
}

/// Read the paste behind `args.link` on the terminal.
///
/// Ctrl-C abandons the session; a revealed paste is still deleted.
///
/// # Errors
///
/// - `CliError::InvalidLink` if the link carries no handle
/// - `CliError::Paste` with `NotFound` if the paste was already burned
/// - `CliError::Runtime` if the terminal fails
pub async fn read<S, E>(
    store: S,
    env: E,
    config: &AppConfig,
    args: &ReadArgs,
) -> Result<ReadSession, CliError>
where
    S: PasteStore,
    E: Environment,
{
    let handle =
        Handle::from_link(&args.link).ok_or_else(|| CliError::InvalidLink(args.link.clone()))?;

    let reader = TerminalReader::new(env.clone())
        .with_passphrase(args.passphrase.as_deref().and_then(Passphrase::non_empty))
        .answering(args.yes, args.burn)
        .with_output(args.output.clone());

    let runtime = ReadRuntime::new(reader, store, env, handle, config);
    let cancel = runtime.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let result = runtime.run().await;
    interrupt.abort();

    let session = result?;
    if let Some(PasteError::NotFound) = session.error() {
        return Err(PasteError::NotFound.into());
    }
    Ok(session)
}

/// Frame and seal content into an envelope.
///
/// Runs PBKDF2 when `passphrase` is set; call it off the async executor.
pub fn seal_content(
    title: &str,
    input: &[u8],
    passphrase: Option<&Passphrase>,
    iv: [u8; IV_LEN],
) -> Vec<u8> {
    seal(&encode(title, input), passphrase, iv)
}

/// Open an envelope produced by [`seal_content`].
///
/// # Errors
///
/// - `PasteError::PasswordRequired` if encrypted and no passphrase is given
/// - `PasteError::WrongPassword` if the passphrase does not match
/// - `PasteError::MalformedFraming` if the envelope is truncated
pub fn open_envelope(
    input: Vec<u8>,
    passphrase: Option<&Passphrase>,
) -> Result<FramedContent, PasteError> {
    Paste::new("application/octet-stream", input).decrypted(passphrase)
}

async fn read_input(file: Option<&Path>) -> io::Result<Vec<u8>> {
    match file {
        Some(path) => tokio::fs::read(path).await,
        None => {
            let mut input = Vec::new();
            tokio::io::stdin().read_to_end(&mut input).await?;
            Ok(input)
        },
    }
}
