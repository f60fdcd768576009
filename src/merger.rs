use anyhow::{Context, Result};
use std::{fs, io::Write, path::Path};

/// Accumulates decrypted segment bytes in playback order and persists them as
/// one file. Chunks are only ever appended; there is no reordering and
/// nothing touches the filesystem until every segment has been pushed.
#[derive(Default)]
pub struct Assembler {
    chunks: Vec<Vec<u8>>,
    stored_bytes: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Vec<u8>) {
        self.stored_bytes += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn stored(&self) -> usize {
        self.stored_bytes
    }

    /// Concatenates every chunk with no separator and writes the result.
    pub fn write_to(self, path: &Path) -> Result<()> {
        let mut file = fs::File::create(path)
            .with_context(|| format!("could not create {}", path.display()))?;

        for chunk in &self.chunks {
            file.write_all(chunk)?;
        }

        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_are_written_in_push_order() {
        let mut assembler = Assembler::new();
        assembler.push(b"first".to_vec());
        assembler.push(b"second".to_vec());
        assembler.push(b"third".to_vec());
        assert_eq!(assembler.stored(), 16);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        assembler.write_to(&path).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"firstsecondthird");
    }

    #[test]
    fn empty_assembler_writes_an_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        Assembler::new().write_to(&path).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"");
    }
}
