use crate::domain::BoardSize;
use std::{env, net::IpAddr, str::FromStr, time::Duration};

// Runtime/server settings, overridable through the environment (.env is loaded at startup).

pub const EVENT_BROADCAST_CAPACITY: usize = 128;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_BOARD_WIDTH: u32 = 30;
const DEFAULT_BOARD_HEIGHT: u32 = 30;
const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
const DEFAULT_MATCH_DURATION_SECS: u64 = 180;

pub fn http_port() -> u16 {
    env::var("SNAKE_SERVER_PORT")
        .or_else(|_| env::var("PORT"))
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

pub fn bind_host() -> IpAddr {
    env::var("SNAKE_SERVER_HOST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([0, 0, 0, 0]))
}

pub fn board_size() -> BoardSize {
    BoardSize::new(
        positive_or(env::var("BOARD_WIDTH").ok(), DEFAULT_BOARD_WIDTH),
        positive_or(env::var("BOARD_HEIGHT").ok(), DEFAULT_BOARD_HEIGHT),
    )
}

pub fn tick_interval() -> Duration {
    Duration::from_millis(positive_or(
        env::var("TICK_INTERVAL_MS").ok(),
        DEFAULT_TICK_INTERVAL_MS,
    ))
}

pub fn match_duration() -> Duration {
    Duration::from_secs(positive_or(
        env::var("MATCH_DURATION_SECS").ok(),
        DEFAULT_MATCH_DURATION_SECS,
    ))
}

// Parses a strictly positive number, falling back to `default` on anything else.
fn positive_or<T>(raw: Option<String>, default: T) -> T
where
    T: FromStr + PartialOrd + Default,
{
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
        .unwrap_or(default)
}
