//! Supported HTTP verbs
//!
//! Endpoint documents name verbs as strings in any case. They are mapped
//! through a fixed table when the document is loaded, so an unknown verb
//! is rejected before any request is sent.

use std::fmt;
use std::str::FromStr;

/// An HTTP verb an endpoint may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

/// Lookup table from lowercase verb name to method
const VERBS: &[(&str, Method)] = &[
    ("get", Method::Get),
    ("post", Method::Post),
    ("put", Method::Put),
    ("patch", Method::Patch),
    ("delete", Method::Delete),
    ("head", Method::Head),
    ("options", Method::Options),
];

impl Method {
    /// Lowercase verb name, as written in endpoint documents
    pub fn name(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Options => "options",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        VERBS
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, method)| *method)
            .ok_or_else(|| {
                let supported: Vec<&str> = VERBS.iter().map(|(name, _)| *name).collect();
                format!(
                    "unsupported method '{}' (supported: {})",
                    s,
                    supported.join(", ")
                )
            })
    }
}

impl TryFrom<String> for Method {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Post".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("delete".parse::<Method>().unwrap(), Method::Delete);
    }

    #[test]
    fn test_unknown_verb_is_rejected() {
        let err = "fetch".parse::<Method>().unwrap_err();
        assert!(err.contains("unsupported method 'fetch'"));
        assert!(err.contains("options"));
    }

    #[test]
    fn test_display_is_uppercase() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(Method::default().to_string(), "GET");
    }

    #[test]
    fn test_table_and_names_agree() {
        for (name, method) in VERBS {
            assert_eq!(method.name(), *name);
            assert_eq!(name.parse::<Method>().unwrap(), *method);
        }
        assert_eq!(VERBS.len(), 7);
    }

    #[test]
    fn test_every_verb_maps_to_reqwest() {
        for (name, method) in VERBS {
            assert_eq!(method.to_reqwest().as_str().to_ascii_lowercase(), *name);
        }
    }
}
