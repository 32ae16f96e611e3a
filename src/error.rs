use std::{error, fmt, io};

/// Recoverable, user-visible failure conditions.
///
/// None of these unwinds a session; the collaborator reports them and
/// prompts again. Malformed FAT chains and over-length permissive reads
/// are deliberately *not* represented here — those propagate as whatever
/// bytes the offset arithmetic lands on.
#[derive(Debug)]
pub enum FsError {
    /// The image file is missing or could not be opened.
    ImageUnreadable(io::Error),
    /// `open` was issued while an image is already open.
    AlreadyOpen,
    /// A command other than `open` was issued with no image open.
    NotOpen,
    /// No entry in the working directory matched the given name.
    EntryNotFound,
    /// A navigation target without the directory attribute bit.
    NotADirectory,
    /// A command was invoked without its required parameter.
    MissingArgument,
    /// I/O failure against the open image.
    Io(io::Error),
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::ImageUnreadable(e) => write!(f, "file system image not found: {e}"),
            FsError::AlreadyOpen => write!(f, "file system image is already open"),
            FsError::NotOpen => write!(f, "file system image must be opened first"),
            FsError::EntryNotFound => write!(f, "file not found"),
            FsError::NotADirectory => write!(f, "entry is not a directory"),
            FsError::MissingArgument => write!(f, "required argument not given"),
            FsError::Io(e) => write!(f, "image i/o error: {e}"),
        }
    }
}

impl error::Error for FsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            FsError::ImageUnreadable(e) | FsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FsError {
    fn from(e: io::Error) -> Self {
        FsError::Io(e)
    }
}
