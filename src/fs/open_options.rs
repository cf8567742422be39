use std::fs;
use std::io::{self, BufReader, ErrorKind};
use std::path::Path;

use super::File;
use crate::bridge::{self, Bridge};
use crate::runtime::current_unwrap;

/// Options and flags which can be used to configure how a file is opened.
///
/// This mirrors [`std::fs::OpenOptions`]; the open itself runs on the
/// blocking worker. Besides the builder methods, options can be parsed from
/// a mode string with [`OpenOptions::from_mode`].
#[derive(Clone, Debug)]
pub struct OpenOptions {
    options: fs::OpenOptions,
    bridge: Option<Bridge>,
}

impl OpenOptions {
    /// Creates a blank new set of options ready for configuration.
    ///
    /// All options are initially set to `false`.
    #[must_use]
    pub fn new() -> OpenOptions {
        OpenOptions {
            options: fs::OpenOptions::new(),
            bridge: None,
        }
    }

    /// Parses a mode string made of exactly one of `r`, `w`, `a` or `x`,
    /// optionally followed by `+`, and at most one of `b` or `t`:
    ///
    /// | mode | meaning |
    /// |------|---------|
    /// | `r`  | read |
    /// | `w`  | write, create, truncate |
    /// | `a`  | append, create |
    /// | `x`  | write, fail if the file exists |
    /// | `+`  | also read and write |
    ///
    /// `b` and `t` are accepted for compatibility and have no effect:
    /// files are always byte oriented.
    ///
    /// # Errors
    /// Returns an error of kind [`ErrorKind::InvalidInput`] for any other mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use asyncfile::fs::OpenOptions;
    ///
    /// assert!(OpenOptions::from_mode("r+b").is_ok());
    /// assert!(OpenOptions::from_mode("rw").is_err());
    /// ```
    pub fn from_mode(mode: &str) -> io::Result<OpenOptions> {
        let mut kind = None;
        let mut plus = false;
        let mut text_or_binary = false;
        for c in mode.chars() {
            match c {
                'r' | 'w' | 'a' | 'x' if kind.is_none() => kind = Some(c),
                '+' if !plus => plus = true,
                'b' | 't' if !text_or_binary => text_or_binary = true,
                _ => return Err(invalid_mode(mode)),
            }
        }
        let Some(kind) = kind else {
            return Err(invalid_mode(mode));
        };

        let mut options = OpenOptions::new();
        match kind {
            'r' => options.read(true),
            'w' => options.write(true).create(true).truncate(true),
            'a' => options.append(true).create(true),
            _ => options.write(true).create_new(true),
        };
        if plus {
            options.read(true).write(true);
        }
        Ok(options)
    }

    pub fn read(&mut self, read: bool) -> &mut OpenOptions {
        self.options.read(read);
        self
    }

    pub fn write(&mut self, write: bool) -> &mut OpenOptions {
        self.options.write(write);
        self
    }

    pub fn append(&mut self, append: bool) -> &mut OpenOptions {
        self.options.append(append);
        self
    }

    pub fn truncate(&mut self, truncate: bool) -> &mut OpenOptions {
        self.options.truncate(truncate);
        self
    }

    pub fn create(&mut self, create: bool) -> &mut OpenOptions {
        self.options.create(create);
        self
    }

    pub fn create_new(&mut self, create_new: bool) -> &mut OpenOptions {
        self.options.create_new(create_new);
        self
    }

    /// Routes every blocking call of the opened file through `bridge`
    /// instead of the process-wide one.
    pub fn bridge(&mut self, bridge: Bridge) -> &mut OpenOptions {
        self.bridge = Some(bridge);
        self
    }

    /// Opens a file at `path` with the options specified by `self`.
    ///
    /// # Errors
    ///
    /// The same errors as [`std::fs::OpenOptions::open`].
    ///
    /// # Panics
    /// Panics if called from the outside of a runtime context.
    pub async fn open(&self, path: impl AsRef<Path>) -> io::Result<File> {
        let rt = current_unwrap("OpenOptions::open");
        let bridge = match &self.bridge {
            Some(bridge) => bridge.clone(),
            None => bridge::global_or_init(|| rt.config.bridge.clone()).clone(),
        };
        let options = self.options.clone();
        let path = path.as_ref().to_owned();
        let file = bridge
            .submit(move || options.open(path), rt.handle())
            .await??;
        Ok(File::new(BufReader::new(file), bridge, rt.handle()))
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions::new()
    }
}

fn invalid_mode(mode: &str) -> io::Error {
    io::Error::new(ErrorKind::InvalidInput, format!("invalid mode: {mode:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_modes() {
        for mode in ["r", "w", "a", "x", "r+", "w+b", "ab+", "rt", "xb"] {
            assert!(OpenOptions::from_mode(mode).is_ok(), "{mode}");
        }
    }

    #[test]
    fn rejects_invalid_modes() {
        for mode in ["", "b", "+", "rw", "r++", "rbt", "q", "ra"] {
            let error = OpenOptions::from_mode(mode).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidInput, "{mode}");
        }
    }
}
