//! Emergency help button.
//!
//! A run of rapid presses arms a countdown; when it reaches zero the flow
//! dispatches exactly once. Timers live in the shell, so every transition
//! returns the [`ActivationCommand`]s the app must execute, and every timer
//! callback is checked against the id of the timer currently expected.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ActivationConfig;
use crate::model::{Route, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ActivationPhase {
    #[default]
    Idle,
    Counting { presses: u8 },
    Armed { remaining: u8 },
    Dispatched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationCommand {
    ScheduleReset { id: TimerId, millis: u64 },
    ScheduleTick { id: TimerId, millis: u64 },
    CancelTimer(TimerId),
    Vibrate { millis: u64 },
    Dispatch(Route),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyActivationFlow {
    config: ActivationConfig,
    phase: ActivationPhase,
    reset_timer: Option<TimerId>,
    tick_timer: Option<TimerId>,
}

impl Default for EmergencyActivationFlow {
    fn default() -> Self {
        Self::new(ActivationConfig::default())
    }
}

impl EmergencyActivationFlow {
    #[must_use]
    pub const fn new(config: ActivationConfig) -> Self {
        Self {
            config,
            phase: ActivationPhase::Idle,
            reset_timer: None,
            tick_timer: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> ActivationPhase {
        self.phase
    }

    #[must_use]
    pub const fn config(&self) -> &ActivationConfig {
        &self.config
    }

    #[must_use]
    pub const fn press_count(&self) -> u8 {
        match self.phase {
            ActivationPhase::Counting { presses } => presses,
            _ => 0,
        }
    }

    #[must_use]
    pub const fn countdown(&self) -> Option<u8> {
        match self.phase {
            ActivationPhase::Armed { remaining } => Some(remaining),
            ActivationPhase::Dispatched => Some(0),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(
            self.phase,
            ActivationPhase::Armed { .. } | ActivationPhase::Dispatched
        )
    }

    /// One press of the emergency button.
    ///
    /// The reset window rolls: each press below the threshold replaces the
    /// pending reset timer with a fresh one.
    pub fn activate(&mut self) -> Vec<ActivationCommand> {
        let presses = match self.phase {
            ActivationPhase::Idle => 1,
            ActivationPhase::Counting { presses } => presses.saturating_add(1),
            ActivationPhase::Armed { .. } | ActivationPhase::Dispatched => {
                debug!(phase = ?self.phase, "activation ignored");
                return Vec::new();
            }
        };

        let mut commands = Vec::new();
        if let Some(stale) = self.reset_timer.take() {
            commands.push(ActivationCommand::CancelTimer(stale));
        }

        if presses >= self.config.required_presses {
            self.arm(&mut commands);
        } else {
            let id = TimerId::generate();
            commands.push(ActivationCommand::ScheduleReset {
                id: id.clone(),
                millis: self.config.press_window_ms,
            });
            self.reset_timer = Some(id);
            self.phase = ActivationPhase::Counting { presses };
            debug!(presses, "emergency press counted");
        }

        commands
    }

    /// The press window closed. Ignored unless `id` is the live reset timer.
    pub fn on_reset_elapsed(&mut self, id: &TimerId) -> bool {
        if self.reset_timer.as_ref() != Some(id) {
            return false;
        }
        self.reset_timer = None;

        if matches!(self.phase, ActivationPhase::Counting { .. }) {
            debug!("press window elapsed, count reset");
            self.phase = ActivationPhase::Idle;
            true
        } else {
            false
        }
    }

    /// One countdown second. Ignored unless `id` is the live tick timer.
    pub fn on_tick(&mut self, id: &TimerId) -> Vec<ActivationCommand> {
        if self.tick_timer.as_ref() != Some(id) {
            return Vec::new();
        }
        self.tick_timer = None;

        let ActivationPhase::Armed { remaining } = self.phase else {
            return Vec::new();
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            return self.dispatch();
        }

        self.phase = ActivationPhase::Armed { remaining };
        vec![self.schedule_tick()]
    }

    /// Aborts an armed countdown, or a press run in progress.
    pub fn cancel(&mut self) -> Vec<ActivationCommand> {
        match self.phase {
            ActivationPhase::Armed { remaining } => {
                debug!(remaining, "emergency countdown cancelled");
                self.phase = ActivationPhase::Idle;
                self.cancel_timers()
            }
            ActivationPhase::Counting { .. } => {
                self.phase = ActivationPhase::Idle;
                self.cancel_timers()
            }
            ActivationPhase::Idle | ActivationPhase::Dispatched => Vec::new(),
        }
    }

    /// The page is going away: drop every live timer.
    pub fn teardown(&mut self) -> Vec<ActivationCommand> {
        self.cancel_timers()
    }

    fn arm(&mut self, commands: &mut Vec<ActivationCommand>) {
        debug!(countdown = self.config.countdown_secs, "emergency armed");
        commands.push(ActivationCommand::Vibrate {
            millis: self.config.vibrate_ms,
        });

        if self.config.countdown_secs == 0 {
            commands.extend(self.dispatch());
            return;
        }

        self.phase = ActivationPhase::Armed {
            remaining: self.config.countdown_secs,
        };
        commands.push(self.schedule_tick());
    }

    fn dispatch(&mut self) -> Vec<ActivationCommand> {
        debug!("emergency countdown finished");
        self.phase = ActivationPhase::Dispatched;
        let mut commands = self.cancel_timers();
        commands.push(ActivationCommand::Dispatch(Route::EmergencyContacts));
        commands
    }

    fn schedule_tick(&mut self) -> ActivationCommand {
        let id = TimerId::generate();
        self.tick_timer = Some(id.clone());
        ActivationCommand::ScheduleTick {
            id,
            millis: self.config.tick_ms,
        }
    }

    fn cancel_timers(&mut self) -> Vec<ActivationCommand> {
        [self.reset_timer.take(), self.tick_timer.take()]
            .into_iter()
            .flatten()
            .map(ActivationCommand::CancelTimer)
            .collect()
    }
}
