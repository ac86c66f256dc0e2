//! Extensions to and utilities concerning [`PathBuf`]s.
//!
//! # Overview
//!
//! The external tools driven by the alignment QC write their artifacts next to
//! their inputs, named `<input>.<extra extension>` (`sample.bam.bai`,
//! `targets.bed.interval_list`, ...). [`AppendExtension`] builds those names.
//!
//! ```
//! use std::path::PathBuf;
//! // Trait must be in scope to use it.
//! use prpr::utils::pathbuf::AppendExtension;
//!
//! assert_eq!(
//!     PathBuf::from("hello.txt").append_extension("world"),
//!     PathBuf::from("hello.txt.world"))
//! ```

use std::ffi::OsStr;
use std::path::PathBuf;

/// A trait that adds an [`append_extension`][AppendExtension::append_extension]
/// method to [`PathBuf`].
pub trait AppendExtension {
    /// Appends an extension to the file name, keeping any existing extension.
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use prpr::utils::pathbuf::AppendExtension;
    ///
    /// let bam = PathBuf::from("~/test.bam");
    /// let bai = bam.append_extension("bai");
    /// assert_eq!(bai.file_name().unwrap(), "test.bam.bai");
    ///
    /// let bed = PathBuf::from("targets");
    /// assert_eq!(bed.append_extension("interval_list"), PathBuf::from("targets.interval_list"));
    /// ```
    fn append_extension<P>(self, ext: P) -> Self
    where
        P: AsRef<OsStr>;
}

impl AppendExtension for PathBuf {
    fn append_extension<P>(mut self, ext: P) -> Self
    where
        P: AsRef<OsStr>,
    {
        let new_ext = match self.extension() {
            Some(existing) => {
                let mut new_ext = existing.to_os_string();
                new_ext.push(".");
                new_ext.push(ext);
                new_ext
            }
            None => ext.as_ref().to_os_string(),
        };

        self.set_extension(new_ext);
        self
    }
}
