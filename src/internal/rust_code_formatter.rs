use crate::Result;
use std::path::Path;

use std::process::Command;

/// Tries to format the source code of a given file.
///
/// A missing `rustfmt` is an error, a non-zero exit status is not: the unformatted module is
/// still valid source.
pub(crate) fn try_format(path_to_file: &Path) -> Result<()> {
    Command::new("rustfmt")
        .args(["--edition", "2021"])
        .arg(path_to_file)
        .status()
        .map(|status| {
            if !status.success() {
                log::warn!("rustfmt failed on {}: {}", path_to_file.display(), status);
            }
        })
        .map_err(|e| std::io::Error::new(e.kind(), format!("Failed to format file: {}", e)).into())
}
