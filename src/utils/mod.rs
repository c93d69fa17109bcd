//! Utility functions for sfxlib

use std::io;
use std::path::Path;

/// Remove a file if it exists; a missing file is not an error
pub fn remove_stale_file(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::trace!("🧹 Removed stale file {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_stale_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("__stale__.prg");

        // Missing file is fine
        remove_stale_file(&path).unwrap();

        std::fs::write(&path, b"old").unwrap();
        remove_stale_file(&path).unwrap();
        assert!(!path.exists());
    }
}
