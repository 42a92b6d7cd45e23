use circuit_spotify::api::auth_url::{params_to_query_string, AuthUrlBuilder};
use circuit_spotify::Scope;

#[test]
fn auth_url_has_expected_shape() {
    let url = AuthUrlBuilder::new("X")
        .scopes([Scope::UserReadCurrentlyPlaying, Scope::UserReadPlaybackState])
        .build();
    assert_eq!(
        url,
        "https://accounts.spotify.com/authorize?client_id=X&response_type=code&scope=user-read-currently-playing user-read-playback-state"
    );
}

#[test]
fn each_scope_appears_once() {
    let url = AuthUrlBuilder::new("abc")
        .scope(Scope::Streaming)
        .scope(Scope::UserTopRead)
        .scope(Scope::Streaming)
        .build();
    let query = url.split_once('?').unwrap().1;
    assert!(!query.ends_with('&'));
    let scope = query.split('&').find_map(|p| p.strip_prefix("scope=")).unwrap();
    assert_eq!(scope, "streaming user-top-read");
    assert_eq!(url.matches("streaming").count(), 1);
}

#[test]
fn query_string_for_plain_scopes() {
    let q = params_to_query_string(&[("client_id", "X"), ("response_type", "code"), ("scope", "a b")]);
    assert_eq!(q, "client_id=X&response_type=code&scope=a b");
}

#[test]
fn authorize_url_override_and_no_scopes() {
    let url = AuthUrlBuilder::new("id")
        .authorize_url("http://127.0.0.1:1234/authorize")
        .build();
    assert_eq!(url, "http://127.0.0.1:1234/authorize?client_id=id&response_type=code&scope=");
}
