use std::fs;
use std::io;
use std::path::Path;

use crate::task::spawn_blocking;

/// Read the entire contents of a file into a bytes vector.
///
/// This is a convenience wrapper running [`std::fs::read`] on the blocking
/// worker.
///
/// # Errors
///
/// This function will return an error if `path` does not already exist.
/// Other errors may also be returned according to [`std::fs::read`].
///
/// # Examples
///
/// ```no_run
/// # asyncfile::block_on(async {
/// use asyncfile::fs;
/// use std::net::SocketAddr;
///
/// let foo: SocketAddr = String::from_utf8_lossy(&fs::read("address.txt").await?).parse()?;
/// # Ok::<(), Box<dyn std::error::Error>>(()) }).unwrap();
/// ```
pub async fn read(path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
    let path = path.as_ref().to_owned();
    spawn_blocking(move || fs::read(path)).await?
}

/// Read the entire contents of a file into a string.
///
/// # Errors
///
/// This function will return an error if `path` does not already exist,
/// or if the contents of the file are not valid UTF-8.
pub async fn read_to_string(path: impl AsRef<Path>) -> io::Result<String> {
    let path = path.as_ref().to_owned();
    spawn_blocking(move || fs::read_to_string(path)).await?
}

/// Write a slice as the entire contents of a file, creating it if needed
/// and truncating it if it exists.
///
/// # Errors
///
/// See [`std::fs::write`].
pub async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> io::Result<()> {
    let path = path.as_ref().to_owned();
    let contents = contents.as_ref().to_vec();
    spawn_blocking(move || fs::write(path, contents)).await?
}

/// Removes a file from the filesystem.
///
/// # Errors
///
/// See [`std::fs::remove_file`].
pub async fn remove_file(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref().to_owned();
    spawn_blocking(move || fs::remove_file(path)).await?
}
