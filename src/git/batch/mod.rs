// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Object stream client over `git cat-file --batch`.
//!
//! ```text
//! BatchSession (one child, one ordered pipe pair)
//!   |
//!   | read_object(id, kind, limit)
//!   |   stdin  <- "<id>\n"
//!   |   stdout -> "<id> <type> <size>\n"     | "<id> missing\n"
//!   |              |                              |
//!   |              v                              v
//!   |        validate id, kind              ObjectNotFound
//!   |              |                        (session usable)
//!   |              v
//!   |   BlobReader (borrows the session)
//!   |     yields min(size, limit) bytes
//!   |     close(): payload fully read -> consume "\n", session reusable
//!   |              otherwise          -> backend killed, session closed
//!   |
//!   | close() -> stdin EOF, wait for exit
//! ```
//!
//! Requests carry no identifiers, so the session is strictly sequential: the
//! reader borrows the session mutably until it is closed. Any protocol
//! violation kills the backend; the session then refuses further reads.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader, ReadBuf};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::backend::ShellBackend;
use super::types::{ObjectId, ObjectKind, ScanEnvironment};
use crate::core::process::builder::ProcessBuilder;
use crate::error::{BatchError, ProcessError};

/// A parsed `cat-file --batch` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Header {
    Missing,
    Object { kind: String, size: u64 },
}

/// A long-lived `git cat-file --batch` process.
///
/// Not safe for concurrent use; open one session per sequence of reads.
#[derive(Debug)]
pub struct BatchSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    cancel: CancellationToken,
    closed: bool,
}

impl BatchSession {
    /// Starts `git cat-file --batch` for a repository.
    ///
    /// Objects in the alternate directories of `env` are readable through
    /// the session.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::Spawn` if the backend cannot be started.
    pub fn open(
        git: &ShellBackend,
        repo: &Path,
        env: &ScanEnvironment,
        cancel: CancellationToken,
    ) -> Result<Self, BatchError> {
        let builder = git
            .command(repo, env)
            .args(["cat-file", "--batch"])
            .name("git cat-file");
        Self::spawn(builder, cancel)
    }

    /// Starts a session on an arbitrary backend speaking the batch protocol.
    pub(crate) fn spawn(
        builder: ProcessBuilder,
        cancel: CancellationToken,
    ) -> Result<Self, BatchError> {
        let command = builder.command_line();
        let mut child = builder.spawn_piped().map_err(BatchError::Spawn)?;

        let missing = |stream: &'static str| {
            BatchError::Spawn(ProcessError::MissingPipe {
                command: command.clone(),
                stream,
            })
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            cancel,
            closed: false,
        })
    }

    /// Returns true once the backend has been torn down.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Requests an object and validates the response header.
    ///
    /// A `limit` of zero delivers the whole object; otherwise at most `limit`
    /// bytes are delivered.
    ///
    /// # Errors
    ///
    /// - `ObjectNotFound` if the object does not exist; the session stays usable.
    /// - `ProtocolMismatch`, `UnexpectedObjectType`, `MalformedResponse`,
    ///   `Transport` or `Cancelled`; the session is torn down.
    /// - `SessionClosed` if an earlier failure tore the session down.
    pub async fn read_object(
        &mut self,
        id: &ObjectId,
        expected: ObjectKind,
        limit: u64,
    ) -> Result<BlobReader<'_>, BatchError> {
        if self.closed {
            return Err(BatchError::SessionClosed);
        }

        let requested = id.to_string();
        trace!(id = %requested, kind = %expected, limit, "cat-file request");

        let cancel = self.cancel.clone();
        let exchanged = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            line = exchange(&mut self.stdin, &mut self.stdout, &requested) => Some(line),
        };
        let header = match exchanged {
            None => Err(BatchError::Cancelled),
            Some(Ok(line)) => parse_header(&line, &requested),
            Some(Err(e)) => Err(e),
        };

        match header {
            Ok(Header::Missing) => Err(BatchError::ObjectNotFound { id: *id }),
            Ok(Header::Object { kind, .. }) if kind != expected.as_str() => {
                self.terminate().await;
                Err(BatchError::UnexpectedObjectType {
                    id: *id,
                    expected: expected.to_string(),
                    actual: kind,
                })
            }
            Ok(Header::Object { size, .. }) => {
                let delivered = if limit > 0 { size.min(limit) } else { size };
                Ok(BlobReader {
                    session: self,
                    id: *id,
                    declared_size: size,
                    delivered_size: delivered,
                    remaining: delivered,
                    closed: false,
                })
            }
            Err(e) => {
                self.terminate().await;
                Err(e)
            }
        }
    }

    /// Shorthand for reading a blob.
    ///
    /// # Errors
    ///
    /// See [`BatchSession::read_object`].
    pub async fn read_blob(
        &mut self,
        id: &ObjectId,
        limit: u64,
    ) -> Result<BlobReader<'_>, BatchError> {
        self.read_object(id, ObjectKind::Blob, limit).await
    }

    /// Ends the session, letting the backend exit on end of input.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::Transport` if waiting for the backend fails.
    pub async fn close(self) -> Result<(), BatchError> {
        let Self {
            mut child,
            stdin,
            closed,
            ..
        } = self;
        drop(stdin);
        if closed {
            return Ok(());
        }

        let status = child
            .wait()
            .await
            .map_err(|source| BatchError::Transport {
                context: "waiting for cat-file to exit",
                source,
            })?;
        if !status.success() {
            warn!(status = %status, "cat-file exited unsuccessfully");
        }
        debug!("cat-file session closed");
        Ok(())
    }

    /// Kills the backend and marks the session closed.
    async fn terminate(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.child.start_kill() {
            debug!(error = %e, "cat-file already exited");
        }
        if let Err(e) = self.child.wait().await {
            warn!(error = %e, "failed to reap cat-file");
        }
        debug!("cat-file session terminated");
    }

    /// Synchronous variant of `terminate` for drop paths.
    fn kill_now(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.child.start_kill() {
            debug!(error = %e, "cat-file already exited");
        }
    }
}

/// Writes one request and reads the header line answering it.
async fn exchange(
    stdin: &mut ChildStdin,
    stdout: &mut BufReader<ChildStdout>,
    requested: &str,
) -> Result<String, BatchError> {
    let transport =
        |context: &'static str| move |source: io::Error| BatchError::Transport { context, source };

    stdin
        .write_all(format!("{requested}\n").as_bytes())
        .await
        .map_err(transport("writing request"))?;
    stdin.flush().await.map_err(transport("writing request"))?;

    let mut line = Vec::new();
    let read = stdout
        .read_until(b'\n', &mut line)
        .await
        .map_err(transport("reading header"))?;
    if read == 0 || line.last() != Some(&b'\n') {
        return Err(BatchError::Transport {
            context: "reading header",
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "backend closed its output"),
        });
    }
    line.pop();
    Ok(String::from_utf8_lossy(&line).into_owned())
}

/// Parses `<id> <type> <size>` or `<id> missing`.
fn parse_header(line: &str, requested: &str) -> Result<Header, BatchError> {
    let fields: Vec<&str> = line.split(' ').collect();
    let Some(actual) = fields.first().filter(|id| !id.is_empty()) else {
        return Err(BatchError::MalformedResponse {
            detail: format!("empty header for '{requested}'"),
        });
    };
    if *actual != requested {
        return Err(BatchError::ProtocolMismatch {
            expected: requested.to_string(),
            actual: (*actual).to_string(),
        });
    }

    match fields.as_slice() {
        [_, "missing"] => Ok(Header::Missing),
        [_, kind, size] => {
            let size = size
                .parse::<u64>()
                .map_err(|_| BatchError::MalformedResponse {
                    detail: format!("invalid size in header '{line}'"),
                })?;
            Ok(Header::Object {
                kind: (*kind).to_string(),
                size,
            })
        }
        _ => Err(BatchError::MalformedResponse {
            detail: format!("unexpected header '{line}'"),
        }),
    }
}

/// Content stream of one object read.
///
/// Yields exactly [`delivered_size`](Self::delivered_size) bytes. Must be
/// finished with [`close`](Self::close); dropping an open reader kills the
/// backend.
#[derive(Debug)]
pub struct BlobReader<'a> {
    session: &'a mut BatchSession,
    id: ObjectId,
    declared_size: u64,
    delivered_size: u64,
    remaining: u64,
    closed: bool,
}

impl BlobReader<'_> {
    #[must_use]
    pub const fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Size of the object as reported by the backend.
    #[must_use]
    pub const fn declared_size(&self) -> u64 {
        self.declared_size
    }

    /// Number of bytes this reader yields.
    #[must_use]
    pub const fn delivered_size(&self) -> u64 {
        self.delivered_size
    }

    /// Returns true if the size limit cut the content short.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.delivered_size < self.declared_size
    }

    /// Reads the remaining content into memory, observing cancellation.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` or `Transport`; either tears the session down.
    pub async fn read_content(&mut self) -> Result<Vec<u8>, BatchError> {
        let capacity = usize::try_from(self.remaining).unwrap_or(0);
        let mut content = Vec::with_capacity(capacity);

        let cancel = self.session.cancel.clone();
        let read = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            read = AsyncReadExt::read_to_end(self, &mut content) => Some(read),
        };

        match read {
            Some(Ok(_)) => Ok(content),
            Some(Err(source)) => {
                self.session.terminate().await;
                Err(BatchError::Transport {
                    context: "reading object content",
                    source,
                })
            }
            None => {
                self.session.terminate().await;
                Err(BatchError::Cancelled)
            }
        }
    }

    /// Releases the read.
    ///
    /// After a complete read the trailing separator is consumed and the
    /// session can serve the next request. After a partial or truncated read
    /// the backend is killed and the session is closed.
    ///
    /// # Errors
    ///
    /// Returns `MalformedResponse`, `Transport` or `Cancelled` if the
    /// separator cannot be consumed; the session is torn down.
    pub async fn close(mut self) -> Result<(), BatchError> {
        self.closed = true;
        if self.session.closed {
            return Ok(());
        }
        if self.remaining > 0 || self.is_truncated() {
            trace!(id = %self.id, remaining = self.remaining, "partial read, discarding session");
            self.session.terminate().await;
            return Ok(());
        }

        let cancel = self.session.cancel.clone();
        let mut separator = [0_u8; 1];
        let read = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            read = self.session.stdout.read_exact(&mut separator) => Some(read),
        };

        let result = match read {
            Some(Ok(_)) if separator[0] == b'\n' => return Ok(()),
            Some(Ok(_)) => Err(BatchError::MalformedResponse {
                detail: format!("missing separator after object '{}'", self.id),
            }),
            Some(Err(source)) => Err(BatchError::Transport {
                context: "reading object separator",
                source,
            }),
            None => Err(BatchError::Cancelled),
        };
        self.session.terminate().await;
        result
    }
}

impl AsyncRead for BlobReader<'_> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.remaining == 0 || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        if this.session.closed {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "cat-file session is closed",
            )));
        }
        if this.session.cancel.is_cancelled() {
            return Poll::Ready(Err(io::Error::other("cat-file read cancelled")));
        }

        let before = buf.filled().len();
        let mut limited = (&mut this.session.stdout).take(this.remaining);
        ready!(Pin::new(&mut limited).poll_read(cx, buf))?;
        let read = (buf.filled().len() - before) as u64;

        if read == 0 {
            this.session.kill_now();
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("cat-file ended {} bytes early", this.remaining),
            )));
        }
        this.remaining -= read;
        Poll::Ready(Ok(()))
    }
}

impl Drop for BlobReader<'_> {
    fn drop(&mut self) {
        if !self.closed && !self.session.closed {
            warn!(id = %self.id, "object reader dropped without close, killing cat-file");
            self.session.kill_now();
        }
    }
}
