// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The failure modes of a render.  None of them are recoverable: a
//! run either completes from dispatch to barrier and is persisted, or
//! it stops and nothing is written.

use std::path::Path;

use failure::Fail;

/// Everything that can stop a render.
#[derive(Debug, Fail)]
pub enum Error {
    /// The image buffer, or a lane's staging buffer, could not be
    /// obtained.
    #[fail(display = "could not allocate {} bytes for the {}", bytes, what)]
    AllocationFailure {
        /// Requested size.
        bytes: usize,
        /// Which buffer was being allocated.
        what: &'static str,
    },

    /// The output file could not be opened or fully written.
    #[fail(display = "could not write {}: {}", path, cause)]
    PersistenceFailure {
        /// The destination that was being written.
        path: String,
        /// The underlying I/O or encoder failure.
        #[fail(cause)]
        cause: std::io::Error,
    },

    /// A configuration value makes the run meaningless.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// A lane worker died before draining its queue.
    #[fail(display = "lane {} failed before draining", _0)]
    LaneFailure(usize),

    /// A thread of the render panicked and was not joined by its lane.
    #[fail(display = "a render thread panicked")]
    WorkerPanic,
}

impl Error {
    pub(crate) fn persistence(path: &Path, cause: std::io::Error) -> Self {
        Error::PersistenceFailure {
            path: path.display().to_string(),
            cause,
        }
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
