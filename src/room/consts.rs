pub const ROOM_URL: &str = "ROOM_URL";
pub const ROOM_TOKEN: &str = "ROOM_TOKEN";
pub const ROOM_IDENTITY: &str = "ROOM_IDENTITY";

pub const DEFAULT_URL: &str = "ws://localhost:7880";
pub const DEFAULT_IDENTITY: &str = "assistant";

pub const AUTHORIZATION_HEADER: &str = "Authorization";
