use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

pub type Result<T, E = Csv2SheetError> = std::result::Result<T, E>;

/// Boxed error source.
pub type BoxedError = Box<dyn Error + Sync + Send>;

/// The error type used across all csv2sheet crates.
///
/// Errors carry a human readable message, an optional source, and an ordered
/// list of key/value fields for additional context (status codes, urls,
/// object names, etc).
#[derive(Debug)]
pub struct Csv2SheetError {
    inner: Box<Csv2SheetErrorInner>,
}

#[derive(Debug)]
struct Csv2SheetErrorInner {
    msg: String,
    source: Option<BoxedError>,
    fields: Vec<ErrorField>,
    backtrace: Backtrace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ErrorField {
    key: String,
    value: String,
}

impl Csv2SheetError {
    pub fn new(msg: impl Into<String>) -> Self {
        Csv2SheetError {
            inner: Box::new(Csv2SheetErrorInner {
                msg: msg.into(),
                source: None,
                fields: Vec::new(),
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn with_source(msg: impl Into<String>, source: BoxedError) -> Self {
        let mut err = Self::new(msg);
        err.inner.source = Some(source);
        err
    }

    /// Attach a field to this error.
    ///
    /// Fields are printed in insertion order after the message.
    pub fn with_field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.inner.fields.push(ErrorField {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn get_msg(&self) -> &str {
        &self.inner.msg
    }

    /// Get the value of a field by key, if it exists.
    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.inner
            .fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }

    pub fn get_backtrace(&self) -> &Backtrace {
        &self.inner.backtrace
    }
}

impl fmt::Display for Csv2SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.msg)?;

        for field in &self.inner.fields {
            write!(f, "\n  {}: {}", field.key, field.value)?;
        }

        if let Some(source) = &self.inner.source {
            write!(f, "\nError source: {source}")?;
        }

        if self.inner.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\nBacktrace: {}", self.inner.backtrace)?;
        }

        Ok(())
    }
}

impl Error for Csv2SheetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<std::io::Error> for Csv2SheetError {
    fn from(value: std::io::Error) -> Self {
        Csv2SheetError::with_source("IO error", Box::new(value))
    }
}

impl From<fmt::Error> for Csv2SheetError {
    fn from(value: fmt::Error) -> Self {
        Csv2SheetError::with_source("Format error", Box::new(value))
    }
}

impl From<std::string::FromUtf8Error> for Csv2SheetError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Csv2SheetError::with_source("Invalid utf8", Box::new(value))
    }
}

/// Extension trait for wrapping arbitrary errors with some context.
pub trait ResultExt<T, E> {
    /// Wrap an error with a static context string.
    fn context(self, msg: &'static str) -> Result<T>;

    /// Wrap an error with a context string generated from a function.
    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: Fn() -> String;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(Csv2SheetError::with_source(msg, Box::new(e))),
        }
    }

    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: Fn() -> String,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(Csv2SheetError::with_source(f(), Box::new(e))),
        }
    }
}

pub trait OptionExt<T> {
    /// Return an error if the option is None.
    fn required(self, msg: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(Csv2SheetError::new(format!("Missing required value: {msg}"))),
        }
    }
}
