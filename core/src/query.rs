//! Extra query-string options and URL construction.

use url::Url;

/// Query parameters appended to a request URL, in insertion order.
///
/// `as_object` is a local flag asking [`build_url`] for a structured `Url`
/// instead of a string. It is never written to the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    params: Vec<(String, String)>,
    as_object: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that resolve to a structured URL.
    pub fn structured() -> Self {
        Self {
            as_object: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn as_object(&self) -> bool {
        self.as_object
    }
}

/// A URL in the representation the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedUrl {
    Text(String),
    Structured(Url),
}

impl ResolvedUrl {
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedUrl::Text(s) => s,
            ResolvedUrl::Structured(u) => u.as_str(),
        }
    }

    pub fn into_string(self) -> String {
        match self {
            ResolvedUrl::Text(s) => s,
            ResolvedUrl::Structured(u) => u.into(),
        }
    }
}

/// Join `base` and `path` and append every option as a query parameter.
pub fn join_url(base: &str, path: &str, options: &QueryOptions) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("{base}{path}"))?;
    if !options.params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &options.params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// [`join_url`], in the representation `options` asks for.
pub fn build_url(base: &str, path: &str, options: &QueryOptions) -> Result<ResolvedUrl, url::ParseError> {
    let url = join_url(base, path, options)?;
    Ok(if options.as_object {
        ResolvedUrl::Structured(url)
    } else {
        ResolvedUrl::Text(url.into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:3000";

    #[test]
    fn plain_path() {
        let url = build_url(BASE, "/api/key/42", &QueryOptions::new()).unwrap();
        assert_eq!(url, ResolvedUrl::Text("http://localhost:3000/api/key/42".to_string()));
    }

    #[test]
    fn options_keep_insertion_order() {
        let opts = QueryOptions::new().with("zeta", 1).with("alpha", "two words");
        let url = build_url(BASE, "/api/key/42", &opts).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/key/42?zeta=1&alpha=two+words"
        );
    }

    #[test]
    fn structured_flag_is_not_sent() {
        let opts = QueryOptions::structured().with("version", 3);
        let url = build_url(BASE, "/api/v1/auth/refresh", &opts).unwrap();
        match url {
            ResolvedUrl::Structured(u) => {
                assert_eq!(u.path(), "/api/v1/auth/refresh");
                assert_eq!(u.query(), Some("version=3"));
            }
            other => panic!("expected structured url, got {other:?}"),
        }
    }

    #[test]
    fn bad_base_is_an_error() {
        assert!(build_url("not a url", "/x", &QueryOptions::new()).is_err());
    }
}
