//! Reading batch scripts from disk.

use std::path::Path;

use cap_std::ambient_authority;
use cap_std::fs::Dir;

use crate::errors::AppError;

/// Reads the script at `path` through a capability handle on its directory.
pub(crate) fn read_script(path: &Path) -> Result<String, AppError> {
    let read_error = |source| AppError::ReadScript {
        path: path.to_path_buf(),
        source,
    };
    let file_name = path.file_name().ok_or_else(|| {
        read_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path does not name a file",
        ))
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
    dir.read_to_string(file_name).map_err(read_error)
}
