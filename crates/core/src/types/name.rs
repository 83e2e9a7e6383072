//! Display names from OAuth profiles.

/// A display name split into the parts stored on a user profile.
///
/// The first whitespace-separated token becomes the first name; every
/// remaining token, joined by a single space, becomes the last name.
///
/// ```
/// use solemart_core::DisplayName;
///
/// let name = DisplayName::split("Ada  King Lovelace").unwrap();
/// assert_eq!(name.first_name, "Ada");
/// assert_eq!(name.last_name.as_deref(), Some("King Lovelace"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName {
    /// First token of the display name.
    pub first_name: String,
    /// Remaining tokens, if any.
    pub last_name: Option<String>,
}

impl DisplayName {
    /// Split a display name into first and last name.
    ///
    /// Returns `None` for blank input.
    #[must_use]
    pub fn split(full: &str) -> Option<Self> {
        let mut tokens = full.split_whitespace();
        let first_name = tokens.next()?.to_string();
        let rest: Vec<&str> = tokens.collect();
        let last_name = if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        };

        Some(Self {
            first_name,
            last_name,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_single_token() {
        let name = DisplayName::split("Cher").unwrap();
        assert_eq!(name.first_name, "Cher");
        assert_eq!(name.last_name, None);
    }

    #[test]
    fn test_split_two_tokens() {
        let name = DisplayName::split(" Grace Hopper ").unwrap();
        assert_eq!(name.first_name, "Grace");
        assert_eq!(name.last_name.as_deref(), Some("Hopper"));
    }

    #[test]
    fn test_split_blank() {
        assert_eq!(DisplayName::split(""), None);
        assert_eq!(DisplayName::split("  \t "), None);
    }
}
