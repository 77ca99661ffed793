// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::fmt::Debug;
use std::fmt::Display;

use mpegvbr::error::DecodeError;
use mpegvbr::error::SourceError;

/// Inspector error.
#[derive(Clone, Debug)]
pub enum Error {
    /// A variant that indicates that the input is not an MPEG audio stream.
    Format(FormatError),
    /// A variant that indicates an error from the header decoder.
    Decode(DecodeError),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(e) => write!(f, "{e}"),
            Self::Decode(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        Self::Decode(e.into())
    }
}

/// An error type for input format error.
#[derive(Clone, Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct FormatError {
    /// The location of error in bytes.
    location: u64,
    /// Message that described the reason.
    message: String,
}

impl FormatError {
    /// Constructs new `FormatError`.
    pub fn new(location: u64, message: &str) -> Self {
        Self {
            location,
            message: message.to_owned(),
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input format error detected at byte {}. (reason={})",
            self.location, self.message
        )
    }
}

impl std::error::Error for FormatError {}
