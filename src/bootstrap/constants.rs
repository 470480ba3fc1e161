/// Realtime Database path that mirrors the client's connection state.
pub const CONNECTED_PATH: &str = ".info/connected";
