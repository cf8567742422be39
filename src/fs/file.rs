use std::fmt::{self, Debug, Formatter};
use std::fs::{self, Metadata};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use super::OpenOptions;
use crate::bridge::Bridge;
use crate::runtime::{self, Handle};

type Inner = Arc<Mutex<Option<BufReader<fs::File>>>>;

/// An open file whose blocking calls run on the bridge's worker thread.
///
/// Reads are buffered. Writes and seeks first discard any read-ahead, so
/// reads and writes can be interleaved the same way as with a plain
/// [`std::fs::File`].
///
/// Every method suspends the calling task until the worker has run the
/// underlying call, and returns the same errors the synchronous call would.
pub struct File {
    inner: Inner,
    bridge: Bridge,
    handle: Handle,
}

impl Drop for File {
    fn drop(&mut self) {
        let inner = self.inner.clone();
        // the last handle to the file is closed on the worker
        let close = move || drop(take(&inner));
        match runtime::current() {
            // the runtime thread must not block on a full queue
            Some(rt) => {
                let closing = self.bridge.submit(close, rt.handle());
                rt.spawn(async move {
                    closing.await.ok();
                })
                .detach();
            }
            None => drop(self.bridge.detach(close)),
        }
    }
}

impl File {
    pub(crate) fn new(file: BufReader<fs::File>, bridge: Bridge, handle: Handle) -> File {
        File {
            inner: Arc::new(Mutex::new(Some(file))),
            bridge,
            handle,
        }
    }

    /// Attempts to open a file in read-only mode.
    ///
    /// See the [`OpenOptions::open`] method for more details.
    ///
    /// # Errors
    ///
    /// This function will return an error if `path` does not already exist.
    /// Other errors may also be returned according to [`OpenOptions::open`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use asyncfile::fs::File;
    ///
    /// #[asyncfile::main]
    /// async fn main() -> std::io::Result<()> {
    ///     let mut f = File::open("foo.txt").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn open(path: impl AsRef<Path>) -> io::Result<File> {
        OpenOptions::new().read(true).open(path).await
    }

    /// Opens a file in write-only mode.
    ///
    /// This function will create a file if it does not exist,
    /// and will truncate it if it does.
    ///
    /// # Errors
    ///
    /// See [`OpenOptions::open`].
    pub async fn create(path: impl AsRef<Path>) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await
    }

    /// Opens a file with a mode string such as `"r"`, `"w+"` or `"ab"`.
    /// See [`OpenOptions::from_mode`] for the accepted modes.
    ///
    /// # Errors
    ///
    /// Errors with [`io::ErrorKind::InvalidInput`] for an invalid mode, and
    /// otherwise as [`OpenOptions::open`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use asyncfile::fs::File;
    ///
    /// #[asyncfile::main]
    /// async fn main() -> std::io::Result<()> {
    ///     let mut f = File::with_mode("notes.txt", "a+").await?;
    ///     f.write_all("one more line\n").await?;
    ///     f.close().await
    /// }
    /// ```
    pub async fn with_mode(path: impl AsRef<Path>, mode: &str) -> io::Result<File> {
        OpenOptions::from_mode(mode)?.open(path).await
    }

    /// Returns a new `OpenOptions` object.
    #[must_use]
    pub fn options() -> OpenOptions {
        OpenOptions::new()
    }

    /// Runs `f` against the underlying file on the worker thread.
    async fn blocking<F, T>(&self, f: F) -> io::Result<T>
    where
        F: FnOnce(&mut BufReader<fs::File>) -> io::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        let call = move || {
            let mut file = inner.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(file) = file.as_mut() else {
                return Err(closed());
            };
            f(file)
        };
        self.bridge.submit(call, self.handle.clone()).await?
    }

    /// Reads at most `len` bytes. An empty vector means the end of the file
    /// was reached.
    ///
    /// # Errors
    /// See [`Read::read`].
    pub async fn read(&mut self, len: usize) -> io::Result<Vec<u8>> {
        self.blocking(move |file| {
            let mut buf = vec![0; len];
            let n = file.read(&mut buf)?;
            buf.truncate(n);
            Ok(buf)
        })
        .await
    }

    /// Reads all bytes until the end of the file.
    ///
    /// # Errors
    /// See [`Read::read_to_end`].
    pub async fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        self.blocking(|file| {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            Ok(buf)
        })
        .await
    }

    /// Reads all bytes until the end of the file as UTF-8.
    ///
    /// # Errors
    /// See [`Read::read_to_string`].
    pub async fn read_to_string(&mut self) -> io::Result<String> {
        self.blocking(|file| {
            let mut buf = String::new();
            file.read_to_string(&mut buf)?;
            Ok(buf)
        })
        .await
    }

    /// Reads the next line, including its line terminator. Returns an empty
    /// string at the end of the file.
    ///
    /// # Errors
    /// See [`BufRead::read_line`].
    pub async fn read_line(&mut self) -> io::Result<String> {
        self.blocking(|file| {
            let mut line = String::new();
            file.read_line(&mut line)?;
            Ok(line)
        })
        .await
    }

    /// Turns the file into a stream of lines.
    #[must_use]
    pub fn lines(self) -> Lines {
        Lines { file: self }
    }

    /// Writes the entire buffer at the current position.
    ///
    /// # Errors
    /// See [`Write::write_all`].
    pub async fn write_all(&mut self, buf: impl AsRef<[u8]>) -> io::Result<()> {
        let buf = buf.as_ref().to_vec();
        self.blocking(move |file| {
            file.seek(SeekFrom::Current(0))?;
            file.get_mut().write_all(&buf)
        })
        .await
    }

    /// # Errors
    /// See [`Write::flush`].
    pub async fn flush(&mut self) -> io::Result<()> {
        self.blocking(|file| file.get_mut().flush()).await
    }

    /// Seeks to an offset, in bytes, returning the new position from the
    /// start of the file.
    ///
    /// # Errors
    /// See [`Seek::seek`].
    pub async fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.blocking(move |file| file.seek(pos)).await
    }

    /// Returns the current position from the start of the file.
    ///
    /// # Errors
    /// See [`Seek::stream_position`].
    pub async fn stream_position(&mut self) -> io::Result<u64> {
        self.blocking(|file| file.stream_position()).await
    }

    /// Truncates or extends the file to `size` bytes.
    ///
    /// # Errors
    /// See [`std::fs::File::set_len`].
    pub async fn set_len(&self, size: u64) -> io::Result<()> {
        self.blocking(move |file| file.get_ref().set_len(size)).await
    }

    /// # Errors
    /// See [`std::fs::File::metadata`].
    pub async fn metadata(&self) -> io::Result<Metadata> {
        self.blocking(|file| file.get_ref().metadata()).await
    }

    /// Flushes all data and metadata to disk.
    ///
    /// # Errors
    /// See [`std::fs::File::sync_all`].
    pub async fn sync_all(&self) -> io::Result<()> {
        self.blocking(|file| file.get_ref().sync_all()).await
    }

    /// Closes the file.
    ///
    /// The method completes once the close operation has completed,
    /// guaranteeing that resources associated with the file have been released.
    ///
    /// If `close` is not called before dropping the file, the file is closed in
    /// the background, but there is no guarantee as to **when** the close
    /// operation will complete.
    ///
    /// # Errors
    /// Errors if the bridge was shut down before the file could be closed.
    pub async fn close(self) -> io::Result<()> {
        let inner = self.inner.clone();
        self.bridge
            .submit(move || drop(take(&inner)), self.handle.clone())
            .await?;
        Ok(())
    }
}

impl Debug for File {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

/// A stream of lines read from a [`File`], created by [`File::lines`].
#[derive(Debug)]
pub struct Lines {
    file: File,
}

impl Lines {
    /// Returns the next line without its line terminator, or `None` at the
    /// end of the file.
    ///
    /// # Errors
    /// See [`BufRead::read_line`].
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = self.file.read_line().await?;
        if line.is_empty() {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    #[must_use]
    pub fn into_inner(self) -> File {
        self.file
    }
}

fn take(inner: &Inner) -> Option<BufReader<fs::File>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner).take()
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "I/O operation on closed file")
}
