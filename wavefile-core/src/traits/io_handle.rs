use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};

/// Byte sink a `WaveWriter` can emit into. Seeking is required to patch the
/// header once the final sizes are known.
pub trait ByteSink: Write + Seek {}

impl<T: Write + Seek> ByteSink for T {}

/// Byte source a `WaveReader` can parse.
pub trait ByteSource: Read + Seek {}

impl<T: Read + Seek> ByteSource for T {}

/// Who owns the underlying stream.
///
/// A session that opened a file from a path owns it and releases it on
/// close; a handle supplied by the caller is only borrowed and left open.
#[derive(Debug)]
pub enum IoHandle<'a, T> {
    OwnedPath(T),
    BorrowedHandle(&'a mut T),
}

impl<T> IoHandle<'_, T> {
    pub fn is_owned(&self) -> bool {
        matches!(self, IoHandle::OwnedPath(_))
    }

    fn get_mut(&mut self) -> &mut T {
        match self {
            IoHandle::OwnedPath(inner) => inner,
            IoHandle::BorrowedHandle(inner) => inner,
        }
    }
}

impl<T: Read> Read for IoHandle<'_, T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.get_mut().read(buf)
    }
}

impl<T: Write> Write for IoHandle<'_, T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.get_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.get_mut().flush()
    }
}

impl<T: Seek> Seek for IoHandle<'_, T> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.get_mut().seek(pos)
    }
}

/// File-backed sink used when a writer is opened from a path.
pub type FileSink = BufWriter<File>;

/// File-backed source used when a reader is opened from a path.
pub type FileSource = BufReader<File>;
