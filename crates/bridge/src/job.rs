//! Local job adapter.
//!
//! Spawns a command with piped stdio and exposes it through the
//! engine-stream traits, so the CLI can put a real process on the other
//! side of the bridge: stdout/stderr chunks become `Stdout`/`Stderr`
//! messages followed by a final `Exit`, and `Stdin` messages are written
//! to the child. Resize is ignored, piped stdio has no window size.

use std::future::Future;
use std::process::Stdio;

use protocol::SessionMessage;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;

use crate::stream::{EngineReader, EngineWriter, StreamError};

/// Buffer size for reading from the job's pipes.
const READ_BUFFER_SIZE: usize = 4096;

/// Channel capacity for buffered job output.
const CHANNEL_CAPACITY: usize = 256;

/// Receiving half: job output and exit as session messages.
pub struct JobReader {
    rx: mpsc::Receiver<SessionMessage>,
}

/// Sending half: operator input into the job's stdin.
pub struct JobWriter {
    stdin: ChildStdin,
}

/// Spawns `program` with the given arguments and returns the engine-stream
/// halves for it.
pub fn spawn(program: &str, args: &[String]) -> std::io::Result<(JobReader, JobWriter)> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let Some(stdin) = child.stdin.take() else {
        return Err(std::io::Error::other("job stdin was not piped"));
    };
    let Some(stdout) = child.stdout.take() else {
        return Err(std::io::Error::other("job stdout was not piped"));
    };
    let Some(stderr) = child.stderr.take() else {
        return Err(std::io::Error::other("job stderr was not piped"));
    };

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    let stdout_task = tokio::spawn(copy_stream(stdout, tx.clone(), SessionMessage::Stdout));
    let stderr_task = tokio::spawn(copy_stream(stderr, tx.clone(), SessionMessage::Stderr));
    tokio::spawn(async move {
        // Both pipes must drain before the exit message; Exit promises no
        // further output follows.
        let _ = stdout_task.await;
        let _ = stderr_task.await;
        let code = reap(&mut child).await;
        let _ = tx.send(SessionMessage::Exit(code)).await;
    });

    Ok((JobReader { rx }, JobWriter { stdin }))
}

async fn reap(child: &mut Child) -> i32 {
    match child.wait().await {
        Ok(status) => status.code().unwrap_or_else(|| {
            tracing::debug!("job terminated by signal");
            -1
        }),
        Err(err) => {
            tracing::error!(error = %err, "failed to reap job process");
            -1
        }
    }
}

async fn copy_stream<R>(
    mut source: R,
    tx: mpsc::Sender<SessionMessage>,
    wrap: fn(Vec<u8>) -> SessionMessage,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(wrap(buf[..n].to_vec())).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "job output read failed");
                break;
            }
        }
    }
}

impl EngineReader for JobReader {
    fn recv(
        &mut self,
    ) -> impl Future<Output = Result<Option<SessionMessage>, StreamError>> + Send {
        async move { Ok(self.rx.recv().await) }
    }
}

impl EngineWriter for JobWriter {
    fn send(
        &mut self,
        message: SessionMessage,
    ) -> impl Future<Output = Result<(), StreamError>> + Send {
        async move {
            match message {
                SessionMessage::Stdin(data) => {
                    self.stdin
                        .write_all(&data)
                        .await
                        .map_err(|err| StreamError::Failed(format!("job stdin: {}", err)))?;
                    self.stdin
                        .flush()
                        .await
                        .map_err(|err| StreamError::Failed(format!("job stdin: {}", err)))
                }
                SessionMessage::Resize { cols, rows } => {
                    tracing::debug!(cols, rows, "resize ignored: job runs on piped stdio");
                    Ok(())
                }
                other => {
                    tracing::trace!(kind = other.kind(), "ignoring message kind for job input");
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(reader: &mut JobReader) -> (Vec<u8>, Vec<u8>, i32) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        loop {
            match reader.recv().await.unwrap() {
                Some(SessionMessage::Stdout(data)) => stdout.extend_from_slice(&data),
                Some(SessionMessage::Stderr(data)) => stderr.extend_from_slice(&data),
                Some(SessionMessage::Exit(code)) => return (stdout, stderr, code),
                Some(other) => panic!("unexpected message: {:?}", other),
                None => panic!("stream ended without exit"),
            }
        }
    }

    #[tokio::test]
    async fn test_job_output_and_exit() {
        let (mut reader, _writer) = spawn("echo", &["hello".to_string()]).unwrap();
        let (stdout, stderr, code) = drain(&mut reader).await;
        assert_eq!(stdout, b"hello\n");
        assert!(stderr.is_empty());
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_job_exit_code_propagates() {
        let (mut reader, _writer) =
            spawn("sh", &["-c".to_string(), "exit 3".to_string()]).unwrap();
        let (_, _, code) = drain(&mut reader).await;
        assert_eq!(code, 3);
    }

    #[tokio::test]
    async fn test_job_stdin_roundtrip() {
        let (mut reader, mut writer) = spawn("cat", &[]).unwrap();
        writer
            .send(SessionMessage::Stdin(b"ping".to_vec()))
            .await
            .unwrap();
        // Dropping the writer closes the job's stdin and lets cat exit.
        drop(writer);

        let (stdout, _, code) = drain(&mut reader).await;
        assert_eq!(stdout, b"ping");
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_resize_is_ignored() {
        let (mut reader, mut writer) = spawn("cat", &[]).unwrap();
        writer
            .send(SessionMessage::Resize { cols: 80, rows: 24 })
            .await
            .unwrap();
        drop(writer);

        let (stdout, _, code) = drain(&mut reader).await;
        assert!(stdout.is_empty());
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        assert!(spawn("/no/such/binary", &[]).is_err());
    }
}
