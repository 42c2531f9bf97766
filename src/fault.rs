//! A `Fault` pairs the real error from some function with a description safe to show users.
//! Internal errors can mention connection strings, file paths and other details that should
//! stay inside the server; the public half is all a client ever sees.

mod http;

use std::fmt;
use std::fmt::{Display, Formatter};

/// An error with two faces: the internal one gets logged, the public one gets served.
#[derive(Debug)]
pub struct Fault {
    /// Whatever actually went wrong. Never shown to users.
    pub internal: anyhow::Error,
    /// The sanitized description served to users.
    pub public: PublicError,
}

/// Displaying a Fault only shows the public half.
impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "{}", self.public)
    }
}

/// Return type for anything that can fail with a Fault.
pub type Fallible<T> = Result<T, Fault>;

/// What a client is told about an error.
#[derive(Debug)]
pub struct PublicError {
    pub cause: Cause,
    pub text: &'static str,
}

/// Broad classification of an error, from the client's point of view.
/// Kept separate from HTTP status codes so that components like the datastore
/// can classify failures without knowing anything about HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    ServerError,
    InvalidInput,
    NotFound,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for PublicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}: {}", self.cause, self.text)
    }
}

impl Default for PublicError {
    // Deliberately vague: the fallback for errors nobody described.
    fn default() -> Self {
        Self {
            cause: Cause::ServerError,
            text: "Internal server error",
        }
    }
}

pub trait Describe {
    /// Turn an error into a Fault by describing it to your users.
    fn describe(self, public: PublicError) -> Fault;
}

impl<Internal: Into<anyhow::Error>> Describe for Internal {
    fn describe(self, public: PublicError) -> Fault {
        Fault {
            internal: self.into(),
            public,
        }
    }
}

/// Any ordinary error can become a Fault with the default public description.
/// Use `describe` instead wherever a more specific public message exists.
impl<Internal: Into<anyhow::Error>> From<Internal> for Fault {
    fn from(internal: Internal) -> Fault {
        internal.describe(Default::default())
    }
}

pub trait DescribeErr<T> {
    /// Shorthand for `result.map_err(|e| e.describe(public))`.
    fn describe_err(self, public: PublicError) -> Result<T, Fault>;
}

impl<T, E> DescribeErr<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn describe_err(self, public: PublicError) -> Result<T, Fault> {
        self.map_err(|e| e.describe(public))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_never_leaks_the_internal_error() {
        let io_err = std::fs::read("secret-dsn-file-keep-private").unwrap_err();
        let fault = io_err.describe(PublicError {
            cause: Cause::ServerError,
            text: "Could not read data",
        });
        assert_eq!(fault.to_string(), "ServerError: Could not read data");
    }

    #[test]
    fn test_undescribed_errors_get_the_vague_default() {
        let fault: Fault = std::fs::read("also-private").unwrap_err().into();
        assert_eq!(fault.public.cause, Cause::ServerError);
        assert_eq!(fault.to_string(), "ServerError: Internal server error");
    }
}
