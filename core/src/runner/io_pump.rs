use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::util::RingBytes;

/// Split stdout into lines and forward each one. A trailing fragment without `\n`
/// is delivered at EOF.
pub fn pump_stdout_lines<R>(
    mut rd: R,
    line_tx: mpsc::Sender<String>,
) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        let mut line_buf: Vec<u8> = Vec::with_capacity(8 * 1024);

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| RunnerError::StreamIo {
                stream: "stdout",
                source: e,
            })?;
            if n == 0 {
                break;
            }
            total += n as u64;

            line_buf.extend_from_slice(&buf[..n]);
            while let Some(pos) = line_buf.iter().position(|&b| b == b'\n') {
                let mut one = line_buf.drain(..=pos).collect::<Vec<u8>>();
                trim_newline(&mut one);
                let line = String::from_utf8_lossy(&one).into_owned();
                if line_tx.send(line).await.is_err() {
                    // Receiver gone: keep draining so the child never blocks on a full pipe.
                    line_buf.clear();
                }
            }
        }

        if !line_buf.is_empty() {
            trim_newline(&mut line_buf);
            if !line_buf.is_empty() {
                let line = String::from_utf8_lossy(&line_buf).into_owned();
                let _ = line_tx.send(line).await;
            }
        }

        Ok(total)
    })
}

/// Capture stderr into a bounded ring.
pub fn pump_stderr_capture<R>(
    mut rd: R,
    ring: Arc<RingBytes>,
) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 8 * 1024];
        let mut total = 0u64;
        loop {
            let n = rd.read(&mut buf).await.map_err(|e| RunnerError::StreamIo {
                stream: "stderr",
                source: e,
            })?;
            if n == 0 {
                break;
            }
            ring.push(&buf[..n]);
            total += n as u64;
        }
        Ok(total)
    })
}

fn trim_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn flushes_last_line_without_newline_on_eof() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel::<String>(8);

        let task = pump_stdout_lines(rd, tx);

        wr.write_all(b"first\r\nsec").await.unwrap();
        wr.write_all(b"ond\nhello").await.unwrap();
        drop(wr);

        assert_eq!(rx.recv().await.as_deref(), Some("first"));
        assert_eq!(rx.recv().await.as_deref(), Some("second"));
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
        assert_eq!(rx.recv().await, None);

        assert_eq!(task.await.unwrap().unwrap(), 19);
    }

    #[tokio::test]
    async fn stderr_is_captured() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let ring = RingBytes::new(64);
        let task = pump_stderr_capture(rd, ring.clone());

        wr.write_all(b"boom\n").await.unwrap();
        drop(wr);

        task.await.unwrap().unwrap();
        assert_eq!(ring.to_string_lossy(), "boom\n");
    }
}
