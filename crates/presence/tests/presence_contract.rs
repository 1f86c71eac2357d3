// Contract checks for the presence server. The server crate is a
// binary, so these assertions introspect the source the same way
// operators read it.

const WS_SOURCE: &str = include_str!("../src/ws/mod.rs");
const ERROR_SOURCE: &str = include_str!("../src/error.rs");
const AUTH_SOURCE: &str = include_str!("../src/auth/mod.rs");

#[test]
fn heartbeat_and_frame_limits_are_fixed() {
    let heartbeat_interval_ms = parse_u64_const(WS_SOURCE, "HEARTBEAT_INTERVAL_MS");
    let heartbeat_timeout_ms = parse_u64_const(WS_SOURCE, "HEARTBEAT_TIMEOUT_MS");
    let max_frame_bytes = parse_u64_const(WS_SOURCE, "MAX_FRAME_BYTES");

    assert_eq!(heartbeat_interval_ms, 15_000);
    assert_eq!(heartbeat_timeout_ms, 10_000);
    assert_eq!(max_frame_bytes, 65_536);
    assert!(
        heartbeat_timeout_ms < heartbeat_interval_ms,
        "pong timeout must be shorter than heartbeat interval",
    );
}

#[test]
fn handshake_error_codes_are_declared() {
    for code in ["AUTH_MISSING", "AUTH_INVALID", "SERVER_CONFIG_ERROR", "SERVER_INTERNAL_ERROR"] {
        assert!(
            ERROR_SOURCE.contains(&format!("\"{code}\"")),
            "error taxonomy must declare `{code}`",
        );
    }
}

#[test]
fn verification_endpoint_path_matches_identity_service() {
    assert!(AUTH_SOURCE.contains("/collaboration/verify"));
    assert!(AUTH_SOURCE.contains("roomId"), "room id must ride in the verify body");
}

#[test]
fn presence_route_is_room_scoped() {
    assert!(WS_SOURCE.contains("/v1/rooms/{room_id}/presence"));
}

fn parse_u64_const(source: &str, name: &str) -> u64 {
    let needle = format!("const {name}:");
    let index = source.find(&needle).expect("constant must be declared");
    let line = source[index..].lines().next().expect("constant declaration line must exist");
    let raw_value = line
        .split('=')
        .nth(1)
        .expect("constant must have assignment")
        .trim()
        .trim_end_matches(';')
        .replace('_', "");
    raw_value
        .parse::<u64>()
        .unwrap_or_else(|error| panic!("failed to parse `{name}` from `{line}`: {error}"))
}
