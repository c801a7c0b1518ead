use std::fmt;

/// A sensitive configuration value, such as the webhook shared secret.
///
/// Both `Debug` and `Display` print a fixed mask instead of the value, so a `Secret` can never leak through log
/// statements or error formatting. Access to the wrapped value is explicit, via [`Secret::reveal`], which keeps
/// every use of the secret grep-able.
#[derive(Clone, Default)]
pub struct Secret<T>(T);

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the wrapped value.
    pub fn reveal(&self) -> &T {
        &self.0
    }

    /// Unwrap the value, consuming the mask.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}
