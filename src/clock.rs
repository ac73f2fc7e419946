//! Per-player game clocks. The rules engine never reads these; the caller
//! drives them around move commits and decides when a flag falls.

use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::types::StoneColor;

/// Time-control configuration, wire-compatible with the web client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TimeControl {
    None,
    Absolute {
        #[serde(rename = "mainTimeMS")]
        main_time_ms: i64,
    },
    /// Every move gets a fresh `main_time_ms`.
    Simple {
        #[serde(rename = "mainTimeMS")]
        main_time_ms: i64,
    },
    Fischer {
        #[serde(rename = "mainTimeMS")]
        main_time_ms: i64,
        #[serde(rename = "incrementMS")]
        increment_ms: i64,
        #[serde(rename = "maxTimeMS", default)]
        max_time_ms: Option<i64>,
    },
    ByoYomi {
        #[serde(rename = "mainTimeMS")]
        main_time_ms: i64,
        #[serde(rename = "numPeriods")]
        num_periods: u32,
        #[serde(rename = "periodTimeMS")]
        period_time_ms: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClockState {
    Basic {
        #[serde(rename = "remainingTimeMS")]
        remaining_ms: i64,
    },
    ByoYomi {
        #[serde(rename = "mainTimeRemainingMS")]
        main_remaining_ms: i64,
        #[serde(rename = "periodsRemaining")]
        periods_remaining: u32,
        #[serde(rename = "periodTimeRemainingMS")]
        period_remaining_ms: i64,
    },
}

impl TimeControl {
    pub fn is_timed(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn initial_state(&self) -> ClockState {
        match *self {
            Self::None => ClockState::Basic { remaining_ms: 0 },
            Self::Absolute { main_time_ms }
            | Self::Simple { main_time_ms }
            | Self::Fischer { main_time_ms, .. } => ClockState::Basic {
                remaining_ms: main_time_ms,
            },
            Self::ByoYomi {
                main_time_ms,
                num_periods,
                period_time_ms,
            } => ClockState::ByoYomi {
                main_remaining_ms: main_time_ms,
                periods_remaining: num_periods,
                period_remaining_ms: period_time_ms,
            },
        }
    }

    /// State after `elapsed_ms` of thinking.
    pub fn elapse(&self, state: ClockState, elapsed_ms: i64) -> ClockState {
        match (*self, state) {
            (Self::None, _) => state,
            (Self::ByoYomi { period_time_ms, .. }, ClockState::ByoYomi {
                main_remaining_ms,
                periods_remaining,
                period_remaining_ms,
            }) => {
                let mut elapsed = elapsed_ms;
                let mut main = main_remaining_ms;
                if main > 0 {
                    if main >= elapsed {
                        return ClockState::ByoYomi {
                            main_remaining_ms: main - elapsed,
                            periods_remaining,
                            period_remaining_ms,
                        };
                    }
                    elapsed -= main;
                    main = 0;
                }
                if period_remaining_ms > elapsed {
                    return ClockState::ByoYomi {
                        main_remaining_ms: main,
                        periods_remaining,
                        period_remaining_ms: period_remaining_ms - elapsed,
                    };
                }
                elapsed -= period_remaining_ms;
                let (used, remainder) = if period_time_ms > 0 {
                    (elapsed / period_time_ms + 1, elapsed % period_time_ms)
                } else {
                    (i64::from(periods_remaining), 0)
                };
                let left = (i64::from(periods_remaining) - used).max(0) as u32;
                ClockState::ByoYomi {
                    main_remaining_ms: main,
                    periods_remaining: left,
                    period_remaining_ms: if left == 0 { 0 } else { period_time_ms - remainder },
                }
            }
            (_, ClockState::Basic { remaining_ms }) => ClockState::Basic {
                remaining_ms: remaining_ms - elapsed_ms,
            },
            (_, other) => other,
        }
    }

    /// State once a move has been completed.
    pub fn renew(&self, state: ClockState) -> ClockState {
        match (*self, state) {
            (Self::Simple { main_time_ms }, _) => ClockState::Basic {
                remaining_ms: main_time_ms,
            },
            (
                Self::Fischer {
                    increment_ms,
                    max_time_ms,
                    ..
                },
                ClockState::Basic { remaining_ms },
            ) => {
                let uncapped = remaining_ms + increment_ms;
                ClockState::Basic {
                    remaining_ms: max_time_ms.map_or(uncapped, |max| uncapped.min(max)),
                }
            }
            (
                Self::ByoYomi { period_time_ms, .. },
                ClockState::ByoYomi {
                    main_remaining_ms,
                    periods_remaining,
                    ..
                },
            ) => ClockState::ByoYomi {
                main_remaining_ms,
                periods_remaining,
                period_remaining_ms: period_time_ms,
            },
            _ => state,
        }
    }

    pub fn ms_until_timeout(&self, state: ClockState) -> i64 {
        match (*self, state) {
            (Self::None, _) => 0,
            (
                Self::ByoYomi { period_time_ms, .. },
                ClockState::ByoYomi {
                    main_remaining_ms,
                    periods_remaining,
                    period_remaining_ms,
                },
            ) => {
                let full_periods = i64::from(periods_remaining) - 1;
                main_remaining_ms + period_remaining_ms + full_periods * period_time_ms
            }
            (_, ClockState::Basic { remaining_ms }) => remaining_ms,
            (_, ClockState::ByoYomi { .. }) => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlayerClock {
    state: ClockState,
    on_the_play_since: Option<u64>,
}

/// Both players' clocks for one session. Timestamps are milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    config: TimeControl,
    black: PlayerClock,
    white: PlayerClock,
    last_move_at: Option<u64>,
}

impl Clock {
    pub fn new(config: Option<TimeControl>) -> Self {
        let config = config.unwrap_or(TimeControl::None);
        let player = PlayerClock {
            state: config.initial_state(),
            on_the_play_since: None,
        };
        Self {
            config,
            black: player,
            white: player,
            last_move_at: None,
        }
    }

    pub fn config(&self) -> TimeControl {
        self.config
    }

    pub fn state(&self, side: StoneColor) -> ClockState {
        self.player(side).state
    }

    pub fn last_move_at(&self) -> Option<u64> {
        self.last_move_at
    }

    pub fn start_turn(&mut self, side: StoneColor, now_ms: u64) {
        if !self.config.is_timed() {
            return;
        }
        self.player_mut(side).on_the_play_since = Some(now_ms);
    }

    pub fn finish_move(&mut self, side: StoneColor, now_ms: u64) {
        if !self.config.is_timed() {
            return;
        }
        let config = self.config;
        let player = self.player_mut(side);
        if let Some(since) = player.on_the_play_since.take() {
            let elapsed = now_ms.saturating_sub(since) as i64;
            player.state = config.renew(config.elapse(player.state, elapsed));
        }
        self.last_move_at = Some(now_ms);
    }

    /// Remaining time for a side that is on the play; `None` when untimed or idle.
    pub fn ms_until_timeout(&self, side: StoneColor, now_ms: u64) -> Option<i64> {
        if !self.config.is_timed() {
            return None;
        }
        let player = self.player(side);
        let since = player.on_the_play_since?;
        let elapsed = now_ms.saturating_sub(since) as i64;
        Some(
            self.config
                .ms_until_timeout(self.config.elapse(player.state, elapsed)),
        )
    }

    fn player(&self, side: StoneColor) -> &PlayerClock {
        match side {
            StoneColor::Black => &self.black,
            StoneColor::White => &self.white,
        }
    }

    fn player_mut(&mut self, side: StoneColor) -> &mut PlayerClock {
        match side {
            StoneColor::Black => &mut self.black,
            StoneColor::White => &mut self.white,
        }
    }
}

/// Wall-clock milliseconds since the Unix epoch; works in the browser too.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}
