use circuit_spotify::api::mock::{Method, MockTransport};
use circuit_spotify::api::spotify::NOTHING_PLAYING_HINT;
use circuit_spotify::error::{Error, TransportError};
use circuit_spotify::models::NowPlaying;
use circuit_spotify::nvm::MemoryNvm;
use circuit_spotify::store::{ACCESS_TOKEN_LEN, REFRESH_TOKEN_LEN};
use circuit_spotify::{ApiClient, Credentials, Endpoints, Scope, TokenClient, TokenStore};
use serde_json::json;

const URL: &str = "https://api.spotify.com/v1/me/player/currently-playing";

fn filled(c: char, n: usize) -> String {
    std::iter::repeat(c).take(n).collect()
}

fn api(transport: MockTransport) -> ApiClient<MockTransport, MemoryNvm> {
    let mut store = TokenStore::new(MemoryNvm::new(1024));
    store
        .write(&filled('O', ACCESS_TOKEN_LEN), &filled('R', REFRESH_TOKEN_LEN))
        .unwrap();
    let creds = Credentials {
        client_id: "cid".into(),
        client_secret: "csecret".into(),
        redirect_url: "https%3A%2F%2Fopen.spotify.com%2F".into(),
        code: Some("code".into()),
    };
    ApiClient::new(TokenClient::new(
        transport,
        store,
        creds,
        Endpoints::default(),
        &[Scope::UserReadCurrentlyPlaying],
    ))
}

fn expired() -> serde_json::Value {
    json!({"error": {"status": 401, "message": "The access token expired"}})
}

#[test]
fn sends_bearer_token_from_store() {
    let body = json!({"is_playing": true, "item": {"name": "Song"}});
    let mut client = api(MockTransport::new().reply(body.clone()));
    assert_eq!(client.get_currently_playing().unwrap(), body);

    let calls = client.tokens().transport().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::Get);
    assert_eq!(calls[0].url, URL);
    let expected = format!("Bearer {}", filled('O', ACCESS_TOKEN_LEN));
    assert_eq!(calls[0].param("Authorization"), Some(expected.as_str()));
}

#[test]
fn expired_token_refreshes_once_and_resends() {
    let new_access = filled('N', ACCESS_TOKEN_LEN);
    let second = json!({"is_playing": false, "item": {"name": "Paused song"}});
    let transport = MockTransport::new()
        .reply(expired())
        .reply(json!({"access_token": new_access, "expires_in": 3600}))
        .reply(second.clone());
    let mut client = api(transport);

    assert_eq!(client.get_currently_playing().unwrap(), second);

    let t = client.tokens().transport();
    assert_eq!(t.calls_to(Method::Get), 2);
    assert_eq!(t.calls_to(Method::Post), 1);
    let calls = t.calls();
    assert_eq!(calls[1].method, Method::Post);
    let resent = format!("Bearer {}", new_access);
    assert_eq!(calls[2].param("Authorization"), Some(resent.as_str()));
    // both fields rewritten, refresh token unchanged
    assert_eq!(client.tokens().store().read_refresh().unwrap(), filled('R', REFRESH_TOKEN_LEN));
}

#[test]
fn second_expiry_is_returned_as_data() {
    let transport = MockTransport::new()
        .reply(expired())
        .reply(json!({"access_token": filled('N', ACCESS_TOKEN_LEN)}))
        .reply(expired());
    let mut client = api(transport);

    assert_eq!(client.get_currently_playing().unwrap(), expired());
    let t = client.tokens().transport();
    assert_eq!(t.calls().len(), 3);
    assert_eq!(t.pending(), 0);
}

#[test]
fn other_api_errors_do_not_trigger_refresh() {
    let body = json!({"error": {"status": 401, "message": "Invalid access token"}});
    let mut client = api(MockTransport::new().reply(body.clone()));
    assert_eq!(client.get_currently_playing().unwrap(), body);
    assert_eq!(client.tokens().transport().calls_to(Method::Post), 0);
}

#[test]
fn no_data_condition_becomes_error_object() {
    let transport = MockTransport::new().fail(TransportError::NoData("ETIMEDOUT".into()));
    let mut client = api(transport);
    let data = client.get_currently_playing().unwrap();

    let message = data["error"]["message"].as_str().unwrap();
    assert!(message.contains("ETIMEDOUT"));
    let details = data["error"]["details"].as_str().unwrap();
    assert_eq!(details, NOTHING_PLAYING_HINT);
    assert!(details.contains("not having a song playing"));
}

#[test]
fn no_data_during_retry_is_also_converted() {
    let transport = MockTransport::new()
        .reply(expired())
        .reply(json!({"access_token": filled('N', ACCESS_TOKEN_LEN)}))
        .fail(TransportError::NoData("connection reset".into()));
    let mut client = api(transport);
    let data = client.get_currently_playing().unwrap();
    assert!(data["error"]["details"].is_string());
}

#[test]
fn other_transport_errors_propagate() {
    let transport = MockTransport::new().fail(TransportError::Other("dns failure".into()));
    let mut client = api(transport);
    let err = client.get_currently_playing().unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Other(_))));
}

#[test]
fn refresh_failure_propagates_without_resend() {
    let transport = MockTransport::new()
        .reply(expired())
        .reply(json!({"error": "invalid_client"}));
    let mut client = api(transport);
    assert!(matches!(client.get_currently_playing(), Err(Error::AuthExchange(_))));
    assert_eq!(client.tokens().transport().calls_to(Method::Get), 1);
}

#[test]
fn now_playing_classifies_results() {
    let transport = MockTransport::new()
        .reply(json!({
            "is_playing": true,
            "item": {"name": "Song", "artists": [{"name": "Band"}]}
        }))
        .fail(TransportError::NoData("empty body".into()));
    let mut client = api(transport);

    match client.now_playing().unwrap() {
        NowPlaying::Playing(cp) => assert_eq!(cp.item.unwrap().summary(), "Band - Song"),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(client.now_playing().unwrap(), NowPlaying::Nothing { .. }));
}

#[test]
fn authorization_header_reads_store() {
    let client = api(MockTransport::new());
    let (name, value) = client.authorization_header().unwrap();
    assert_eq!(name, "Authorization");
    assert_eq!(value, format!("Bearer {}", filled('O', ACCESS_TOKEN_LEN)));
}
