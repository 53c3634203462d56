use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Failure modes for [`save_fractal`], reported back to the caller as a
/// value rather than an unwind — a save collision or I/O failure is an
/// ordinary outcome of calling `/save` twice, not a bug.
#[derive(Debug)]
pub enum SaveError {
    AlreadyExists { path: PathBuf },
    Io(io::Error),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists { path } => {
                write!(f, "destination already exists: {}", path.display())
            }
            Self::Io(err) => write!(f, "I/O error while saving: {err}"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AlreadyExists { .. } => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for SaveError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Writes `<base_dir>/<save_file>.png` and `<base_dir>/<save_file>_metadata.txt`.
/// Fails loudly rather than overwriting if the PNG path already exists.
pub fn save_fractal(
    base_dir: &Path,
    save_file: &str,
    png_bytes: &[u8],
    metadata: &str,
) -> Result<(), SaveError> {
    fs::create_dir_all(base_dir)?;

    let png_path = base_dir.join(format!("{save_file}.png"));
    if png_path.exists() {
        return Err(SaveError::AlreadyExists { path: png_path });
    }

    fs::write(&png_path, png_bytes)?;
    fs::write(base_dir.join(format!("{save_file}_metadata.txt")), metadata)?;
    Ok(())
}
