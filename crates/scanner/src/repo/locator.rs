use crate::core::error::ScanError;
use url::Url;

/// An owner/name pair identifying one remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    pub owner: String,
    pub name: String,
}

impl RepoLocator {
    /// Parses a full `https://github.com/{owner}/{name}` URL or a bare
    /// `owner/name` reference. Anything else is `InvalidReference`.
    pub fn parse(reference: &str) -> Result<Self, ScanError> {
        let invalid = || ScanError::InvalidReference(reference.to_string());

        let (owner, name) = match Url::parse(reference) {
            Ok(url) => {
                let mut segments = url
                    .path_segments()
                    .ok_or_else(invalid)?
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string());
                let owner = segments.next().ok_or_else(invalid)?;
                let name = segments.next().ok_or_else(invalid)?;
                (owner, name)
            }
            // Not an absolute URL; accept the bare owner/name shorthand.
            Err(_) => {
                let mut segments = reference.split('/').filter(|s| !s.is_empty());
                let owner = segments.next().ok_or_else(invalid)?.to_string();
                let name = segments.next().ok_or_else(invalid)?.to_string();
                if segments.next().is_some() {
                    return Err(invalid());
                }
                (owner, name)
            }
        };

        let name = name.trim_end_matches(".git").to_string();
        if owner.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self { owner, name })
    }
}

impl std::fmt::Display for RepoLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_https_url() {
        let locator = RepoLocator::parse("https://github.com/seraphimsakiewicz/evently").unwrap();
        assert_eq!(locator.owner, "seraphimsakiewicz");
        assert_eq!(locator.name, "evently");
    }

    #[test]
    fn test_parses_bare_reference() {
        let locator = RepoLocator::parse("rust-lang/cargo").unwrap();
        assert_eq!(locator.owner, "rust-lang");
        assert_eq!(locator.name, "cargo");
    }

    #[test]
    fn test_strips_git_suffix() {
        let locator = RepoLocator::parse("https://github.com/foo/bar.git").unwrap();
        assert_eq!(locator.name, "bar");
    }

    #[test]
    fn test_rejects_missing_segments() {
        assert!(matches!(
            RepoLocator::parse("https://github.com/onlyowner"),
            Err(ScanError::InvalidReference(_))
        ));
        assert!(matches!(
            RepoLocator::parse("justaname"),
            Err(ScanError::InvalidReference(_))
        ));
        assert!(matches!(
            RepoLocator::parse(""),
            Err(ScanError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_rejects_extra_bare_segments() {
        assert!(RepoLocator::parse("a/b/c").is_err());
    }

    #[test]
    fn test_display() {
        let locator = RepoLocator::parse("foo/bar").unwrap();
        assert_eq!(locator.to_string(), "foo/bar");
    }
}
