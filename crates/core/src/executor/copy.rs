//! Chunked file copy.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::watch;

use crate::queue::ControlSignal;

const PARTIAL_SUFFIX: &str = ".part";

/// Copy `source` to `destination` in `chunk_size` chunks.
///
/// Data is written to a sibling `.part` file, synced, then renamed into
/// place, so a reader never sees a half-written destination. Missing parent
/// directories are created. Returns the number of bytes written.
///
/// An existing `destination` is never replaced: the copy fails with
/// [`io::ErrorKind::AlreadyExists`]. An [`ControlSignal::Abort`] on `control`
/// interrupts the copy between chunks with [`io::ErrorKind::Interrupted`].
/// Either way the `.part` file is removed.
pub async fn copy_file(
    source: &Path,
    destination: &Path,
    chunk_size: usize,
    control: &watch::Receiver<ControlSignal>,
) -> io::Result<u64> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(destination);
    let result = match write_partial(source, &partial, chunk_size.max(1), control).await {
        Ok(bytes) => place(&partial, destination).await.map(|()| bytes),
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = fs::remove_file(&partial).await;
    }
    result
}

async fn write_partial(
    source: &Path,
    partial: &Path,
    chunk_size: usize,
    control: &watch::Receiver<ControlSignal>,
) -> io::Result<u64> {
    let source_file = File::open(source).await?;
    let dest_file = File::create(partial).await?;

    let mut reader = BufReader::with_capacity(chunk_size, source_file);
    let mut writer = BufWriter::with_capacity(chunk_size, dest_file);
    let mut buffer = vec![0u8; chunk_size];
    let mut total_bytes = 0u64;

    loop {
        if *control.borrow() == ControlSignal::Abort {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "copy aborted"));
        }
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read]).await?;
        total_bytes += bytes_read as u64;
    }

    writer.flush().await?;
    writer.into_inner().sync_all().await?;
    Ok(total_bytes)
}

async fn place(partial: &Path, destination: &Path) -> io::Result<()> {
    if fs::try_exists(destination).await? {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", destination.display()),
        ));
    }
    fs::rename(partial, destination).await
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copy_creates_parents_and_matches_content() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("song.mp3");
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&source, &content).unwrap();
        let (_tx, control) = watch::channel(ControlSignal::Continue);

        let destination = dir.path().join("usb/Salsa/song.mp3");
        let bytes = copy_file(&source, &destination, 333, &control).await.unwrap();

        assert_eq!(bytes, content.len() as u64);
        assert_eq!(std::fs::read(&destination).unwrap(), content);
        assert!(!partial_path(&destination).exists());
    }

    #[tokio::test]
    async fn test_missing_source_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out/a.mp3");
        let (_tx, control) = watch::channel(ControlSignal::Continue);

        let err = copy_file(&dir.path().join("missing.mp3"), &destination, 1024, &control)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!destination.exists());
        assert!(!partial_path(&destination).exists());
    }

    #[tokio::test]
    async fn test_existing_destination_is_not_replaced() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("new.mp3");
        std::fs::write(&source, b"new content").unwrap();
        let destination = dir.path().join("old.mp3");
        std::fs::write(&destination, b"keep me").unwrap();
        let (_tx, control) = watch::channel(ControlSignal::Continue);

        let err = copy_file(&source, &destination, 4, &control).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&destination).unwrap(), b"keep me");
        assert!(!partial_path(&destination).exists());
    }

    #[tokio::test]
    async fn test_abort_interrupts_copy() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("long.mp3");
        std::fs::write(&source, vec![7u8; 4096]).unwrap();
        let destination = dir.path().join("usb/long.mp3");
        let (tx, control) = watch::channel(ControlSignal::Continue);
        tx.send_replace(ControlSignal::Abort);

        let err = copy_file(&source, &destination, 16, &control).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
        assert!(!destination.exists());
        assert!(!partial_path(&destination).exists());
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/mnt/usb/a.mp3")),
            PathBuf::from("/mnt/usb/a.mp3.part")
        );
    }
}
