//! Streaming block reader for dump files.
//!
//! Dumps run to several gigabytes, so they are never loaded whole. The
//! reader hands out blocks of at most `block_lines` lines; peak memory is
//! one block regardless of file size.

use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Lazy sequence of line blocks from one source
///
/// The source is dropped (closing the file) the moment it is exhausted or
/// fails; after that the iterator only returns `None`.
#[derive(Debug)]
pub struct BlockReader<R> {
    source: Option<R>,
    block_lines: usize,
}

impl BlockReader<BufReader<File>> {
    /// Open a dump file for block reading
    ///
    /// **Public** - main entry point used by commands
    ///
    /// # Errors
    /// * I/O error opening the file
    /// * `InvalidInput` if `block_lines` is 0
    pub fn open(path: impl AsRef<Path>, block_lines: usize) -> io::Result<Self> {
        let path = path.as_ref();
        debug!("Opening dump {} ({} lines per block)", path.display(), block_lines);
        let file = File::open(path)?;
        Self::new(BufReader::new(file), block_lines)
    }
}

impl<R: BufRead> BlockReader<R> {
    /// Wrap any buffered source
    pub fn new(source: R, block_lines: usize) -> io::Result<Self> {
        if block_lines == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "block size must be greater than 0",
            ));
        }
        Ok(Self {
            source: Some(source),
            block_lines,
        })
    }

    /// True once the underlying source has been released
    pub fn is_exhausted(&self) -> bool {
        self.source.is_none()
    }
}

impl<R: BufRead> Iterator for BlockReader<R> {
    type Item = io::Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source.as_mut()?;
        let mut block = Vec::with_capacity(self.block_lines.min(4096));
        let mut finished = false;
        let mut failure = None;

        while block.len() < self.block_lines {
            let mut line = String::new();
            match source.read_line(&mut line) {
                Ok(0) => {
                    finished = true;
                    break;
                }
                Ok(_) => {
                    if line.ends_with('\n') {
                        line.pop();
                        if line.ends_with('\r') {
                            line.pop();
                        }
                    }
                    block.push(line);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if finished || failure.is_some() {
            self.source = None;
        }
        if let Some(e) = failure {
            return Some(Err(e));
        }
        if block.is_empty() {
            None
        } else {
            Some(Ok(block))
        }
    }
}

/// Count lines in a file without holding it in memory
///
/// **Public** - used for progress totals
///
/// A final line without a trailing newline still counts.
pub fn count_lines(path: impl AsRef<Path>) -> io::Result<u64> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = [0u8; 64 * 1024];
    let mut count = 0u64;
    let mut last = b'\n';

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        count += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
        last = buf[n - 1];
    }

    if last != b'\n' {
        count += 1;
    }
    Ok(count)
}
