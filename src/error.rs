// Copyright 2022-2024 Google LLC
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

//! Error and verification traits

use std::error::Error;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

/// Joins component names (stored innermost-first) into a dotted path.
fn dotted_path(components: &[String]) -> String {
    let mut path = String::new();
    for (i, name) in components.iter().rev().enumerate() {
        if i != 0 {
            path.push('.');
        }
        path.push_str(name);
    }
    path
}

/// Error emitted when the stream content is inconsistent with the format.
///
/// This error maintains a path to the field that could not be decoded in the
/// nested records (e.g. `xing.lame.replay_gain.radio_name`).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct CorruptDataError {
    components: Vec<String>,
    reason: String,
}

impl CorruptDataError {
    /// Makes corrupt-data error for a field `component`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::error::*;
    /// let err = CorruptDataError::new("flags", "unexpected end of stream");
    /// assert_eq!(
    ///     format!("{}", err),
    ///     "corrupt data: `flags` could not be decoded. reason: unexpected end of stream"
    /// );
    /// ```
    pub fn new(component: &str, reason: &str) -> Self {
        Self {
            components: vec![component.to_owned()],
            reason: reason.to_owned(),
        }
    }

    /// Prepends the name of an enclosing record to the error location.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::error::*;
    /// let err = CorruptDataError::new("flags", "unexpected end of stream");
    /// let err = err.within("xing");
    /// assert_eq!(err.path(), "xing.flags");
    /// ```
    #[must_use]
    pub fn within(self, component: &str) -> Self {
        let mut components = self.components;
        components.push(component.to_owned());
        Self {
            components,
            reason: self.reason,
        }
    }

    /// Gets dot-separated path string for the error location.
    pub fn path(&self) -> String {
        dotted_path(&self.components)
    }

    /// Gets the reason of the error.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Error for CorruptDataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for CorruptDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "corrupt data: `{}` could not be decoded. reason: {}",
            self.path(),
            self.reason
        )
    }
}

/// Error emitted when an argument given by the caller is not acceptable.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct InvalidArgumentError {
    var: String,
    reason: String,
    actual: String,
}

impl InvalidArgumentError {
    /// Makes invalid-argument error from `actual: impl Display`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::error::*;
    /// let err = InvalidArgumentError::from_display("data", "must be 8 bytes long", &7);
    /// assert_eq!(
    ///     format!("{}", err),
    ///     "`data` is invalid: must be 8 bytes long (actual=7)"
    /// );
    /// ```
    pub fn from_display<T>(var: &str, reason: &str, actual: &T) -> Self
    where
        T: fmt::Display,
    {
        Self {
            var: var.to_owned(),
            reason: reason.to_owned(),
            actual: format!("{actual}"),
        }
    }

    /// Gets the name of the argument.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Error for InvalidArgumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` is invalid: {} (actual={})",
            self.var, self.reason, self.actual
        )
    }
}

/// Struct that wraps errors from [`ByteSource`].
///
/// [`ByteSource`]: crate::source::ByteSource
#[derive(Clone, Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SourceError {
    source_name: Option<String>,
    reason: SourceErrorReason,
}

impl SourceError {
    /// Constructs `SourceError` by choosing a reason.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::error::*;
    /// let err = SourceError::by_reason(SourceErrorReason::Open);
    /// assert_eq!(
    ///     format!("{}", err),
    ///     "error occurred while reading <unknown>. reason: cannot open file."
    /// );
    /// ```
    pub const fn by_reason(reason: SourceErrorReason) -> Self {
        Self {
            source_name: None,
            reason,
        }
    }

    /// Constructs `SourceError` with unknown (hidden) reason.
    pub const fn from_unknown() -> Self {
        Self {
            source_name: None,
            reason: SourceErrorReason::IO(None),
        }
    }

    /// Constructs `SourceError` from an [`io::Error`].
    ///
    /// [`io::Error`]: std::io::Error
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::error::*;
    /// # use std::io;
    /// let err = SourceError::from_io_error(io::Error::new(io::ErrorKind::Other, "oh no!"));
    /// assert_eq!(
    ///     format!("{}", err),
    ///     "error occurred while reading <unknown>. reason: I/O error: oh no!."
    /// );
    /// ```
    pub fn from_io_error<E: Error + Send + Sync + 'static>(e: E) -> Self {
        Self {
            source_name: None,
            reason: SourceErrorReason::IO(Some(Arc::new(e))),
        }
    }

    /// Set path as the source name (informative when the source is file-based.)
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::error::*;
    /// let err = SourceError::by_reason(SourceErrorReason::Open);
    /// let err = err.set_path("missing.mp3");
    /// assert_eq!(
    ///     format!("{}", err),
    ///     "error occurred while reading missing.mp3. reason: cannot open file."
    /// );
    /// ```
    #[must_use]
    pub fn set_path<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            source_name: Some(path.as_ref().to_string_lossy().to_string()),
            ..self
        }
    }

    /// Returns the reason of this error.
    pub const fn reason(&self) -> &SourceErrorReason {
        &self.reason
    }
}

/// Enum covering possible error reasons from [`ByteSource`].
///
/// [`ByteSource`]: crate::source::ByteSource
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum SourceErrorReason {
    /// The source file cannot be opened.
    Open,
    /// The requested position cannot be represented on this platform.
    InvalidPosition,
    /// Other IO-related error.
    IO(Option<Arc<dyn Error + Send + Sync + 'static>>),
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error occurred while reading {}. reason: {}.",
            self.source_name
                .as_ref()
                .map_or("<unknown>", String::as_str),
            self.reason
        )
    }
}

impl fmt::Display for SourceErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => {
                write!(f, "cannot open file")
            }
            Self::InvalidPosition => {
                write!(f, "position is out of the addressable range")
            }
            Self::IO(Some(cause)) => {
                write!(f, "I/O error: {cause}")
            }
            Self::IO(None) => {
                write!(f, "unknown I/O error")
            }
        }
    }
}

/// Enum for possible decoder errors.
#[non_exhaustive]
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug)]
pub enum DecodeError {
    /// The byte source failed to seek or read.
    Source(SourceError),
    /// The stream content is truncated or inconsistent after a signature matched.
    CorruptData(CorruptDataError),
    /// The caller passed an argument that cannot be processed.
    InvalidArgument(InvalidArgumentError),
}

impl DecodeError {
    /// Returns `true` if the error is due to corrupt stream content.
    pub const fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::CorruptData(_))
    }

    /// Returns `true` if the error is due to an invalid argument.
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Prepends the name of an enclosing record if this is a corrupt-data error.
    #[must_use]
    pub fn within(self, component: &str) -> Self {
        match self {
            Self::CorruptData(e) => Self::CorruptData(e.within(component)),
            Self::Source(_) | Self::InvalidArgument(_) => self,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(e) => e.fmt(f),
            Self::CorruptData(e) => e.fmt(f),
            Self::InvalidArgument(e) => e.fmt(f),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(e) => Some(e),
            Self::CorruptData(e) => Some(e),
            Self::InvalidArgument(e) => Some(e),
        }
    }
}

impl From<SourceError> for DecodeError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

impl From<CorruptDataError> for DecodeError {
    fn from(e: CorruptDataError) -> Self {
        Self::CorruptData(e)
    }
}

impl From<InvalidArgumentError> for DecodeError {
    fn from(e: InvalidArgumentError) -> Self {
        Self::InvalidArgument(e)
    }
}

/// Error object returned when config integrity verification failed.
///
/// This error maintains a path to the component that is actually erroneous
/// in the nested components.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct VerifyError {
    components: Vec<String>,
    reason: String,
}

impl VerifyError {
    /// Makes verification error for an invalid variable `component`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::error::*;
    /// let err = VerifyError::new("max_music_bytes", "must be positive");
    /// assert_eq!(
    ///     format!("{}", err),
    ///     "verification error: `max_music_bytes` is not valid. reason: must be positive"
    /// );
    /// ```
    pub fn new(component: &str, reason: &str) -> Self {
        Self {
            components: vec![component.to_owned()],
            reason: reason.to_owned(),
        }
    }

    /// Prepends the name of an enclosing component to the error location.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::error::*;
    /// let err = VerifyError::new("max_music_bytes", "must be positive");
    /// let err = err.within("crc");
    /// assert_eq!(err.path(), "crc.max_music_bytes");
    /// ```
    #[must_use]
    pub fn within(self, component: &str) -> Self {
        let mut components = self.components;
        let reason = self.reason;
        components.push(component.to_owned());
        Self { components, reason }
    }

    /// Gets dot-separated path string for the error location.
    pub fn path(&self) -> String {
        dotted_path(&self.components)
    }
}

impl Error for VerifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verification error: `{}` is not valid. reason: {}",
            self.path(),
            self.reason
        )
    }
}

/// A wrapper that ensures that the inner `T` is verified and unchanged.
///
/// `Verified<T>` can be obtained via [`Verify::into_verified`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Verified<T>(T);

impl<T> std::ops::Deref for Verified<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

/// Trait for verifiable structs.
pub trait Verify: Sized + seal_verify::Sealed {
    /// Verifies there's no internal data inconsistency.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError` if there's an invalid variable.
    ///
    /// # Examples
    ///
    /// [`config::CrcCheck`] implements `Verify`.
    ///
    /// [`config::CrcCheck`]: crate::config::CrcCheck
    ///
    /// ```
    /// # use mpegvbr::error::*;
    /// # use mpegvbr::config::CrcCheck;
    /// let mut crc = CrcCheck::default();
    /// crc.max_music_bytes = 0;  // invalid setting
    /// assert!(crc.verify().is_err());
    ///
    /// crc.max_music_bytes = 1 << 20; // valid setting
    /// assert!(crc.verify().is_ok());
    /// ```
    fn verify(&self) -> Result<(), VerifyError>;

    /// Wraps into `Verified` to indicate that the data is already verified.
    ///
    /// # Errors
    ///
    /// Returns the original input and `VerifyError` if `verify` failed.
    fn into_verified(self) -> Result<Verified<Self>, (Self, VerifyError)> {
        let result = self.verify();
        if let Err(e) = result {
            Err((self, e))
        } else {
            Ok(Verified(self))
        }
    }
}

/// A wrapping function to make it compatible with "?" operator.
pub(crate) fn verify_macro_impl(cond: bool, varname: &str, msg: &str) -> Result<(), VerifyError> {
    if !cond {
        return Err(VerifyError::new(varname, msg));
    }
    Ok(())
}

/// Checks if `$cond` is true and do `return Err(...)` if so.
///
/// An error object `VerifyErr` is constructed using `$varname` and
/// `$msg` that are formatted using the extra args (`$args`).
macro_rules! verify_true {
    ($varname:literal, $cond:expr, $msg:literal, $($args: expr),*) => {
        crate::error::verify_macro_impl(
            $cond,
            &format!($varname, $($args),*),
            &format!($msg, $($args),*),
        )
    };
    ($varname:literal, $cond:expr, $msg:literal) => {
        verify_true!($varname, $cond, $msg,)
    }
}
pub(crate) use verify_true;

/// Checks if `$actual` is in the range, and emits err with default msgs if not.
///
/// An error is constructed using the same way as [`verify_true`].
macro_rules! verify_range {
    ($varname: literal, $actual:expr, $lowlimit:tt ..) => {{
        #[allow(unused_parens)]
        let limit = $lowlimit;
        verify_true!(
            $varname,
            $actual >= limit,
            "must be greater than or equal to {limit}"
        )
    }};
    ($varname: literal, $actual:expr, ..= $highlimit:tt) => {{
        #[allow(unused_parens)]
        let limit = $highlimit;
        verify_true!(
            $varname,
            $actual <= limit,
            "must be less than or equal to {limit}"
        )
    }};
}
pub(crate) use verify_range;

mod seal_verify {
    pub trait Sealed {}

    impl Sealed for crate::config::CrcCheck {}
    impl Sealed for crate::config::Inspector {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_data_path_is_built_outside_in() {
        let err = CorruptDataError::new("radio_name", "expected radio adjustment data")
            .within("replay_gain")
            .within("lame");
        assert_eq!(err.path(), "lame.replay_gain.radio_name");
        assert_eq!(err.reason(), "expected radio adjustment data");
    }

    #[test]
    fn decode_error_within_only_touches_corrupt_data() {
        let err: DecodeError = CorruptDataError::new("toc", "unexpected end of stream").into();
        let err = err.within("xing");
        assert!(err.is_corrupt_data());
        assert_eq!(
            format!("{err}"),
            "corrupt data: `xing.toc` could not be decoded. reason: unexpected end of stream"
        );

        let err: DecodeError =
            InvalidArgumentError::from_display("streams", "no LAME header found", &0).into();
        let err = err.within("xing");
        assert!(err.is_invalid_argument());
        assert_eq!(
            format!("{err}"),
            "`streams` is invalid: no LAME header found (actual=0)"
        );
    }

    #[test]
    fn decode_error_exposes_source() {
        let err: DecodeError = SourceError::by_reason(SourceErrorReason::Open).into();
        assert!(err.source().is_some());
        assert!(!err.is_corrupt_data());
    }

    #[test]
    fn verify_macros() {
        fn check(v: usize) -> Result<(), VerifyError> {
            verify_range!("value", v, 1..)?;
            verify_range!("value", v, ..= 10)
        }
        assert!(check(0).is_err());
        assert!(check(1).is_ok());
        assert!(check(10).is_ok());
        let err = check(11).unwrap_err();
        assert_eq!(
            format!("{err}"),
            "verification error: `value` is not valid. reason: must be less than or equal to 10"
        );
    }
}
