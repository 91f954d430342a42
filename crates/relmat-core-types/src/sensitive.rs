//! Redaction for values that must not reach log output
//!
//! Customer emails pass through the save hooks. `Sensitive::email` keeps
//! only the domain, which is enough to tell test data from real data in a
//! log line; `Sensitive::new` hides everything.

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

const REDACTED: &str = "***REDACTED***";

/// A value whose Debug, Display and Serialize output is a fixed mask
///
/// # Example
///
/// ```
/// use relmat_core_types::Sensitive;
///
/// let email = Sensitive::email("mia@mia.com");
/// assert_eq!(email.to_string(), "***@mia.com");
/// assert_eq!(format!("{:?}", Sensitive::new(7)), "***REDACTED***");
/// assert_eq!(email.expose(), &"mia@mia.com");
/// ```
#[derive(Clone)]
pub struct Sensitive<T> {
    value: T,
    mask: Cow<'static, str>,
}

impl<T> Sensitive<T> {
    /// Hide the value entirely
    pub fn new(value: T) -> Self {
        Self {
            value,
            mask: Cow::Borrowed(REDACTED),
        }
    }

    pub fn expose(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: AsRef<str>> Sensitive<T> {
    /// Hide the local part of an email address, keep `@domain`
    ///
    /// A value without exactly one `@` is hidden entirely.
    pub fn email(value: T) -> Self {
        let mask = match value.as_ref().split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.contains('@') => {
                Cow::Owned(format!("***@{}", domain))
            }
            _ => Cow::Borrowed(REDACTED),
        };
        Self { value, mask }
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mask)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mask)
    }
}

impl<T> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_keeps_domain_only() {
        let s = Sensitive::email("valerie@valerie.com".to_string());
        assert_eq!(format!("{}", s), "***@valerie.com");
        assert_eq!(format!("{:?}", s), "***@valerie.com");
        assert_eq!(s.into_inner(), "valerie@valerie.com");
    }

    #[test]
    fn test_malformed_email_fully_hidden() {
        assert_eq!(Sensitive::email("no-at-sign").to_string(), REDACTED);
        assert_eq!(Sensitive::email("@x.com").to_string(), REDACTED);
        assert_eq!(Sensitive::email("a@b@c").to_string(), REDACTED);
    }

    #[test]
    fn test_serialize_uses_mask() {
        let json = serde_json::to_string(&Sensitive::email("x@x.com")).unwrap();
        assert_eq!(json, "\"***@x.com\"");
        let json = serde_json::to_string(&Sensitive::new(42)).unwrap();
        assert_eq!(json, "\"***REDACTED***\"");
    }
}
