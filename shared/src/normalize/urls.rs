//! URL classification for login URIs
//!
//! Bitwarden's mobile apps register app identifiers as pseudo-URIs
//! (`androidapp://com.example`, `iosapp://com.example`). Those become
//! dedicated properties so autofill in Android/iOS KeePass clients picks
//! them up; ordinary URLs fill the entry URL first and then numbered
//! `KP2A_URL_n` properties.

use crate::models::EntryProperty;

const ANDROID_SCHEME: &str = "androidapp";
const IOS_SCHEME: &str = "iosapp";

/// How a login's URIs map onto an entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlAssignment {
    /// Value for the entry's URL attribute
    pub primary: Option<String>,
    /// Extra properties, in URI order
    pub properties: Vec<EntryProperty>,
}

/// Classify URIs in source order. `None` values count as empty strings.
pub fn classify_uris<'a, I>(uris: I) -> UrlAssignment
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut assignment = UrlAssignment::default();
    let (mut android_apps, mut ios_apps, mut extra_urls) = (0usize, 0usize, 0usize);

    for uri in uris {
        let uri = uri.unwrap_or_default();

        match uri.split_once("://") {
            Some((ANDROID_SCHEME, app_id)) => {
                let name = if android_apps == 0 {
                    "AndroidApp".to_string()
                } else {
                    format!("AndroidApp_{android_apps}")
                };
                android_apps += 1;
                assignment.properties.push(EntryProperty::plain(name, app_id));
            }
            Some((IOS_SCHEME, app_id)) => {
                ios_apps += 1;
                assignment
                    .properties
                    .push(EntryProperty::plain(format!("iOS app #{ios_apps}"), app_id));
            }
            _ if assignment.primary.is_none() => assignment.primary = Some(uri.to_string()),
            _ => {
                extra_urls += 1;
                assignment
                    .properties
                    .push(EntryProperty::plain(format!("KP2A_URL_{extra_urls}"), uri));
            }
        }
    }

    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(assignment: &UrlAssignment) -> Vec<(&str, &str)> {
        assignment
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_str()))
            .collect()
    }

    #[test]
    fn test_mixed_uris() {
        let assignment = classify_uris([
            Some("https://a.com"),
            Some("androidapp://com.b"),
            Some("https://c.com"),
        ]);
        assert_eq!(assignment.primary.as_deref(), Some("https://a.com"));
        assert_eq!(
            names(&assignment),
            vec![("AndroidApp", "com.b"), ("KP2A_URL_1", "https://c.com")]
        );
    }

    #[test]
    fn test_android_numbering() {
        let assignment = classify_uris([
            Some("androidapp://one"),
            Some("androidapp://two"),
            Some("androidapp://three"),
        ]);
        assert_eq!(assignment.primary, None);
        assert_eq!(
            names(&assignment),
            vec![
                ("AndroidApp", "one"),
                ("AndroidApp_1", "two"),
                ("AndroidApp_2", "three"),
            ]
        );
    }

    #[test]
    fn test_ios_numbering_starts_at_one() {
        let assignment = classify_uris([Some("iosapp://a"), Some("iosapp://b")]);
        assert_eq!(names(&assignment), vec![("iOS app #1", "a"), ("iOS app #2", "b")]);
    }

    #[test]
    fn test_null_uri_takes_primary_slot() {
        let assignment = classify_uris([None, Some("https://x.org")]);
        assert_eq!(assignment.primary.as_deref(), Some(""));
        assert_eq!(names(&assignment), vec![("KP2A_URL_1", "https://x.org")]);
    }

    #[test]
    fn test_only_first_separator_splits() {
        let assignment = classify_uris([Some("androidapp://weird://id")]);
        assert_eq!(names(&assignment), vec![("AndroidApp", "weird://id")]);
    }

    #[test]
    fn test_scheme_match_is_exact() {
        let assignment = classify_uris([Some("AndroidApp://com.b")]);
        assert_eq!(assignment.primary.as_deref(), Some("AndroidApp://com.b"));
        assert!(assignment.properties.is_empty());
    }

    #[test]
    fn test_no_uris() {
        assert_eq!(classify_uris(std::iter::empty()), UrlAssignment::default());
    }
}
