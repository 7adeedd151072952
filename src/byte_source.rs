//! ByteSource trait - random-access byte source for section walking.

use std::io::{self, Read, Seek, SeekFrom};

/// Positionable byte source consumed by the section walker.
///
/// Implemented for every `Read + Seek` type, including `std::fs::File`,
/// `BufReader<File>`, `Cursor<Vec<u8>>` and `&mut` references to them.
pub trait ByteSource {
    /// Position the source at an absolute offset and report where it landed.
    ///
    /// A result different from `offset` means the offset is unreachable.
    fn seek_to(&mut self, offset: u64) -> io::Result<u64>;

    /// Read up to `len` bytes from the current position.
    ///
    /// Returns fewer bytes only when the source ends first.
    fn read_up_to(&mut self, len: u64) -> io::Result<Vec<u8>>;
}

impl<T: Read + Seek> ByteSource for T {
    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        // Plain seeks succeed past the end; report the end instead.
        let end = self.seek(SeekFrom::End(0))?;
        if offset > end {
            return Ok(end);
        }
        self.seek(SeekFrom::Start(offset))
    }

    fn read_up_to(&mut self, len: u64) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        Read::take(&mut *self, len).read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

// Async ByteSource trait (requires 'async' feature)
#[cfg(feature = "async")]
use std::future::Future;
#[cfg(feature = "async")]
use std::pin::Pin;

/// Async counterpart of [`ByteSource`].
///
/// Implemented for every tokio `AsyncRead + AsyncSeek + Unpin + Send` type,
/// such as `tokio::fs::File`.
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub trait AsyncByteSource: Send {
    fn seek_to(
        &mut self,
        offset: u64,
    ) -> Pin<Box<dyn Future<Output = io::Result<u64>> + Send + '_>>;

    fn read_up_to(
        &mut self,
        len: u64,
    ) -> Pin<Box<dyn Future<Output = io::Result<Vec<u8>>> + Send + '_>>;
}

#[cfg(feature = "async")]
impl<T> AsyncByteSource for T
where
    T: tokio::io::AsyncRead + tokio::io::AsyncSeek + Unpin + Send,
{
    fn seek_to(
        &mut self,
        offset: u64,
    ) -> Pin<Box<dyn Future<Output = io::Result<u64>> + Send + '_>> {
        Box::pin(async move {
            use tokio::io::AsyncSeekExt;
            let end = AsyncSeekExt::seek(&mut *self, SeekFrom::End(0)).await?;
            if offset > end {
                return Ok(end);
            }
            AsyncSeekExt::seek(&mut *self, SeekFrom::Start(offset)).await
        })
    }

    fn read_up_to(
        &mut self,
        len: u64,
    ) -> Pin<Box<dyn Future<Output = io::Result<Vec<u8>>> + Send + '_>> {
        Box::pin(async move {
            use tokio::io::AsyncReadExt;
            let mut buffer = Vec::new();
            AsyncReadExt::take(&mut *self, len)
                .read_to_end(&mut buffer)
                .await?;
            Ok(buffer)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_seek_within_bounds() {
        let mut source = Cursor::new(vec![0u8; 100]);
        assert_eq!(ByteSource::seek_to(&mut source, 40).unwrap(), 40);
        assert_eq!(ByteSource::seek_to(&mut source, 100).unwrap(), 100);
    }

    #[test]
    fn test_seek_past_end_reports_end() {
        let mut source = Cursor::new(vec![0u8; 100]);
        assert_eq!(ByteSource::seek_to(&mut source, 101).unwrap(), 100);
        assert_eq!(ByteSource::seek_to(&mut source, u64::MAX).unwrap(), 100);
    }

    #[test]
    fn test_read_up_to_stops_at_end() {
        let mut source = Cursor::new((0u8..10).collect::<Vec<_>>());
        ByteSource::seek_to(&mut source, 6).unwrap();
        assert_eq!(ByteSource::read_up_to(&mut source, 3).unwrap(), vec![6, 7, 8]);
        assert_eq!(ByteSource::read_up_to(&mut source, 3).unwrap(), vec![9]);
        assert!(ByteSource::read_up_to(&mut source, 3).unwrap().is_empty());
    }

    #[test]
    fn test_huge_read_does_not_preallocate() {
        let mut source = Cursor::new(vec![1u8; 4]);
        assert_eq!(ByteSource::read_up_to(&mut source, u64::MAX).unwrap().len(), 4);
    }
}
