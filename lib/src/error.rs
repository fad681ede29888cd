use std::{fmt, io};
use std::panic::Location;
use std::convert::Infallible;
use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A build error: one or more details, each rendered with its context, plus
/// an optional underlying cause that is rendered nested beneath it.
#[derive(Debug)]
pub struct Error {
    details: Vec<Box<dyn ErrorDetail>>,
    cause: Option<Box<Error>>,
    location: &'static Location<'static>,
}

pub trait ErrorDetail: fmt::Display + fmt::Debug + Send + Sync {
    /// Key/value (or bare value) lines printed below the detail's message.
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }
}

impl Error {
    #[track_caller]
    pub fn from_std<E>(error: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Error::from(Box::new(error) as Box<dyn StdError + Send + Sync>)
    }

    /// Makes `self` the innermost cause of `outer` and returns `outer`.
    pub fn chain(self, mut outer: Error) -> Self {
        fn attach(error: Error, behind: &mut Error) {
            match behind.cause.as_mut() {
                Some(cause) => attach(error, cause),
                None => behind.cause = Some(Box::new(error)),
            }
        }

        attach(self, &mut outer);
        outer
    }

    /// The message of the outermost detail.
    pub fn message(&self) -> String {
        self.details.first().map(|d| d.to_string()).unwrap_or_default()
    }

    /// Iterates from this error through each nested cause.
    pub fn causes(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |e| e.cause.as_deref())
    }

    /// Returns `true` if any detail in the chain is an I/O "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.causes()
            .flat_map(|e| e.details.iter())
            .any(|d| d.context().iter().any(|(k, _)| k.as_deref() == Some(NOT_FOUND_KEY)))
    }
}

const NOT_FOUND_KEY: &str = "io error kind";

impl ErrorDetail for &(dyn StdError + Send + Sync) {
    fn context(&self) -> Vec<(Option<String>, String)> {
        std::iter::successors(self.source(), |&e| e.source())
            .map(|e| (None, e.to_string()))
            .collect()
    }
}

impl ErrorDetail for Box<dyn StdError + Send + Sync> {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let error: &(dyn StdError + Send + Sync) = &**self;
        error.context()
    }
}

impl ErrorDetail for io::Error {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let mut context = vec![];
        if self.kind() == io::ErrorKind::NotFound {
            context.push((Some(NOT_FOUND_KEY.into()), "not found".into()));
        }

        let error: &(dyn StdError + Send + Sync) = self;
        context.extend(error.context());
        context
    }
}

macro_rules! impl_error_detail_with_std_error {
    ($T:ty) => {
        impl $crate::error::ErrorDetail for $T {
            fn context(&self) -> Vec<(Option<String>, String)> {
                let error: &(dyn std::error::Error + Send + Sync) = self;
                error.context()
            }
        }
    }
}

impl_error_detail_with_std_error!(toml::de::Error);
impl_error_detail_with_std_error!(serde_json::Error);
impl_error_detail_with_std_error!(jwalk::Error);
impl_error_detail_with_std_error!(std::path::StripPrefixError);
impl_error_detail_with_std_error!(chrono::ParseError);

impl ErrorDetail for String { }
impl ErrorDetail for &str { }

impl<T: ErrorDetail + 'static> From<T> for Error {
    #[track_caller]
    fn from(detail: T) -> Self {
        Error {
            cause: None,
            details: vec![Box::new(detail)],
            location: Location::caller(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_nested(f: &mut fmt::Formatter<'_>, depth: usize, e: &Error) -> fmt::Result {
            let indent = " ".repeat(depth * 4);
            let newline = format!("\n{indent}");
            for detail in &e.details {
                writeln!(f, "{indent}{}", detail.to_string().replace('\n', &newline))?;
                for (key, value) in detail.context() {
                    let value = value.replace('\n', &newline);
                    match key {
                        Some(key) => writeln!(f, "{indent}{key}: {value}")?,
                        None => writeln!(f, "{indent}{value}")?,
                    }
                }

                if std::env::var_os("RUST_BACKTRACE").is_some() {
                    writeln!(f, "{indent}[{}]", e.location)?;
                }
            }

            match &e.cause {
                Some(cause) => write_nested(f, depth + 1, cause),
                None => Ok(()),
            }
        }

        write_nested(f, 0, self)
    }
}

/// An ad-hoc error built by the [`error!`] macro.
#[derive(Debug)]
pub struct MakeshiftError {
    pub message: String,
    pub parameters: Vec<(Option<String>, String)>,
}

#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($msg:expr, $($rest:tt)*) => (
        $crate::error::Error::from($crate::error::MakeshiftError {
            message: $msg.to_string(),
            parameters: {
                #[allow(unused_mut)]
                let mut v: Vec<(Option<String>, String)> = Vec::new();
                $crate::error!(@param v $($rest)*);
                v
            },
        })
    );

    ($msg:expr) => ( $crate::error!($msg,) );

    (@param $v:ident $key:expr => $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $key => $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $key:expr => $value:expr) => {
        $v.push((Some($key.to_string()), $value.to_string()));
    };

    (@param $v:ident $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $value:expr) => {
        $v.push((None, $value.to_string()));
    };

    (@param $v:ident $(,)?) => { };
}

impl fmt::Display for MakeshiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl ErrorDetail for MakeshiftError {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.parameters.clone()
    }
}

pub trait Chainable<T> {
    fn chain(self, other: impl Into<Error>) -> Result<T>;

    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, other: impl Into<Error>) -> Result<T> {
        self.map_err(|e| e.into().chain(other.into()))
    }

    #[track_caller]
    fn chain_with<F, Err>(self, f: F) -> Result<T>
        where F: FnOnce() -> Err, Err: Into<Error>,
    {
        self.map_err(|e| e.into().chain(f().into()))
    }
}

impl ErrorDetail for Infallible { }

#[cfg(test)]
mod tests {
    use super::*;

    fn missing() -> Result<String> {
        Ok(std::fs::read_to_string("/definitely/not/a/real/file.md")?)
    }

    #[test]
    fn chained_errors_render_nested() {
        let error = missing()
            .chain_with(|| error!("failed to read note", "path" => "notes/a.md"))
            .unwrap_err();

        let rendered = error.to_string();
        let outer = rendered.find("failed to read note").unwrap();
        let path = rendered.find("path: notes/a.md").unwrap();
        assert!(outer < path);
        assert!(rendered.lines().any(|l| l.starts_with("    ")));
        assert_eq!(error.message(), "failed to read note");
        assert_eq!(error.causes().count(), 2);
    }

    #[test]
    fn not_found_is_detected_through_chain() {
        let error = missing().chain(error!("outer")).unwrap_err();
        assert!(error.is_not_found());

        let error: Error = error!("unrelated", "key" => "value");
        assert!(!error.is_not_found());
    }

    #[derive(Debug)]
    struct Flush(io::Error);

    impl fmt::Display for Flush {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("failed to flush")
        }
    }

    impl StdError for Flush {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn std_error_sources_become_context_lines() {
        let error = Error::from_std(Flush(io::Error::new(io::ErrorKind::Other, "disk full")));
        let rendered = error.to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[..2], ["failed to flush", "disk full"]);
    }

    #[test]
    fn err_macro_collects_parameters() {
        let result: Result<()> = err!("bad thing", "first", "second" => 2);
        let rendered = result.unwrap_err().to_string();
        assert!(rendered.contains("bad thing"));
        assert!(rendered.contains("first"));
        assert!(rendered.contains("second: 2"));
    }
}
