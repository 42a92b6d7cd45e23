use crate::scope::Scope;

/// Builds the URL the operator opens to grant the app access:
/// `<authorize>?client_id=<id>&response_type=code&scope=<scopes>`.
///
/// Values are not percent-encoded; see [`params_to_query_string`].
#[derive(Debug, Clone)]
pub struct AuthUrlBuilder {
    authorize_url: String,
    client_id: String,
    scopes: Vec<Scope>,
}

impl AuthUrlBuilder {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            authorize_url: format!("{}/authorize", super::DEFAULT_AUTH_BASE),
            client_id: client_id.into(),
            scopes: Vec::new(),
        }
    }

    /// Override the authorize endpoint (full URL, without query string).
    pub fn authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    /// Add a scope; repeats are ignored, first position wins.
    pub fn scope(mut self, scope: Scope) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    pub fn scopes<I: IntoIterator<Item = Scope>>(self, scopes: I) -> Self {
        scopes.into_iter().fold(self, |b, s| b.scope(s))
    }

    pub fn build(&self) -> String {
        let scope = self
            .scopes
            .iter()
            .map(Scope::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        let params = [
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
        ];
        format!("{}?{}", self.authorize_url, params_to_query_string(&params))
    }
}

/// Join flat `field=value` pairs with `&`, in order.
///
/// No escaping is done; values containing reserved characters must already
/// be encoded (see [`encode_query_value`]).
pub fn params_to_query_string(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode a value for use with [`params_to_query_string`].
pub fn encode_query_value(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_has_no_trailing_ampersand() {
        let q = params_to_query_string(&[("client_id", "X"), ("response_type", "code"), ("scope", "a b")]);
        assert_eq!(q, "client_id=X&response_type=code&scope=a b");
        assert_eq!(params_to_query_string(&[]), "");
    }

    #[test]
    fn encode_query_value_escapes_reserved() {
        assert_eq!(
            encode_query_value("https://open.spotify.com/"),
            "https%3A%2F%2Fopen.spotify.com%2F"
        );
    }
}
