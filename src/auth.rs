use std::fmt;

/// An API credential read from configuration.
///
/// Wrapped so that it never ends up in logs through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Returns the configured value or a `MissingConfig` error naming the variable.
pub fn require<'a, T>(value: Option<&'a T>, var: &'static str) -> crate::error::Result<&'a T>
where
    T: ?Sized,
{
    value.ok_or(crate::error::DashError::MissingConfig(var))
}
