use std::fmt;
use std::str::FromStr;

/// Authorization scopes understood by the Spotify accounts service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    // Images
    UgcImageUpload,
    // Spotify Connect
    UserReadPlaybackState,
    UserModifyPlaybackState,
    UserReadCurrentlyPlaying,
    // Playback
    AppRemoteControl,
    Streaming,
    // Playlists
    PlaylistReadPrivate,
    PlaylistReadCollaborative,
    PlaylistModifyPrivate,
    PlaylistModifyPublic,
    // Follow
    UserFollowModify,
    UserFollowRead,
    // Listening history
    UserReadPlaybackPosition,
    UserTopRead,
    UserReadRecentlyPlayed,
    // Library
    UserLibraryModify,
    UserLibraryRead,
    // Users
    UserReadEmail,
    UserReadPrivate,
    // Open access
    UserSoaLink,
    UserSoaUnlink,
    UserManageEntitlements,
    UserManagePartner,
    UserCreatePartner,
}

impl Scope {
    pub const ALL: [Scope; 24] = [
        Scope::UgcImageUpload,
        Scope::UserReadPlaybackState,
        Scope::UserModifyPlaybackState,
        Scope::UserReadCurrentlyPlaying,
        Scope::AppRemoteControl,
        Scope::Streaming,
        Scope::PlaylistReadPrivate,
        Scope::PlaylistReadCollaborative,
        Scope::PlaylistModifyPrivate,
        Scope::PlaylistModifyPublic,
        Scope::UserFollowModify,
        Scope::UserFollowRead,
        Scope::UserReadPlaybackPosition,
        Scope::UserTopRead,
        Scope::UserReadRecentlyPlayed,
        Scope::UserLibraryModify,
        Scope::UserLibraryRead,
        Scope::UserReadEmail,
        Scope::UserReadPrivate,
        Scope::UserSoaLink,
        Scope::UserSoaUnlink,
        Scope::UserManageEntitlements,
        Scope::UserManagePartner,
        Scope::UserCreatePartner,
    ];

    /// Wire value used in the `scope` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::UgcImageUpload => "ugc-image-upload",
            Scope::UserReadPlaybackState => "user-read-playback-state",
            Scope::UserModifyPlaybackState => "user-modify-playback-state",
            Scope::UserReadCurrentlyPlaying => "user-read-currently-playing",
            Scope::AppRemoteControl => "app-remote-control",
            Scope::Streaming => "streaming",
            Scope::PlaylistReadPrivate => "playlist-read-private",
            Scope::PlaylistReadCollaborative => "playlist-read-collaborative",
            Scope::PlaylistModifyPrivate => "playlist-modify-private",
            Scope::PlaylistModifyPublic => "playlist-modify-public",
            Scope::UserFollowModify => "user-follow-modify",
            Scope::UserFollowRead => "user-follow-read",
            Scope::UserReadPlaybackPosition => "user-read-playback-position",
            Scope::UserTopRead => "user-top-read",
            Scope::UserReadRecentlyPlayed => "user-read-recently-played",
            Scope::UserLibraryModify => "user-library-modify",
            Scope::UserLibraryRead => "user-library-read",
            Scope::UserReadEmail => "user-read-email",
            Scope::UserReadPrivate => "user-read-private",
            Scope::UserSoaLink => "user-soa-link",
            Scope::UserSoaUnlink => "user-soa-unlink",
            Scope::UserManageEntitlements => "user-manage-entitlements",
            Scope::UserManagePartner => "user-manage-partner",
            Scope::UserCreatePartner => "user-create-partner",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scope: {0}")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| UnknownScope(s.to_string()))
    }
}

/// Parse a space-separated scope list, as stored in settings.
pub fn parse_scope_list(s: &str) -> Result<Vec<Scope>, UnknownScope> {
    s.split_whitespace().map(Scope::from_str).collect()
}
