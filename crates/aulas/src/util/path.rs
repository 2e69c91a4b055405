use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

pub trait PathExt {
    /// Returns a sibling path with `_{suffix}` appended to the file stem,
    /// keeping the extension so tools can still infer the container.
    ///
    /// `lesson.tar.mp4` with `partial` becomes `lesson.tar_partial.mp4`.
    fn with_suffix<T: AsRef<OsStr>>(&self, suffix: T) -> PathBuf;
}

impl PathExt for Path {
    fn with_suffix<T: AsRef<OsStr>>(&self, suffix: T) -> PathBuf {
        let mut filename = OsString::new();

        if let Some(file_stem) = self.file_stem() {
            filename.push(file_stem);
        }
        filename.push("_");
        filename.push(suffix);

        if let Some(ext) = self.extension() {
            filename.push(".");
            filename.push(ext);
        }

        self.with_file_name(filename)
    }
}

/// Last path component of an URI, without query string or fragment.
pub fn uri_file_name(uri: &str) -> &str {
    let uri = uri.split(['?', '#']).next().unwrap_or(uri);
    uri.rsplit('/').next().unwrap_or(uri)
}
