//! Local game loop
//!
//! Wraps the local [`Player`] with the start countdown. Call
//! [`Tetris::frame`] once per rendered frame with the elapsed time.

use crate::player::Player;
use crate::types::START_COUNTDOWN_MS;

#[derive(Debug)]
pub struct Tetris {
    player: Player,
    countdown_ms: Option<u32>,
    started: bool,
}

impl Tetris {
    pub fn new(seed: u32) -> Self {
        Self::with_player(Player::new(seed))
    }

    pub fn with_player(player: Player) -> Self {
        Self {
            player,
            countdown_ms: None,
            started: false,
        }
    }

    /// Begin the standard start countdown
    pub fn start(&mut self) {
        self.start_with_countdown(START_COUNTDOWN_MS);
    }

    /// Begin a countdown of `countdown_ms`; zero starts immediately
    pub fn start_with_countdown(&mut self, countdown_ms: u32) {
        if self.started || self.countdown_ms.is_some() {
            return;
        }
        if countdown_ms == 0 {
            self.started = true;
        } else {
            self.countdown_ms = Some(countdown_ms);
        }
    }

    /// Advance by `delta_ms`: the countdown first, then the player.
    ///
    /// Time left over when the countdown ends is not simulated.
    pub fn frame(&mut self, delta_ms: u32) {
        if let Some(remaining) = self.countdown_ms {
            if delta_ms >= remaining {
                self.countdown_ms = None;
                self.started = true;
                tracing::info!("game started");
            } else {
                self.countdown_ms = Some(remaining - delta_ms);
            }
            return;
        }

        if self.started && !self.player.is_game_over() {
            self.player.update(delta_ms);
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Milliseconds left before the game starts, if counting down
    pub fn countdown_ms(&self) -> Option<u32> {
        self.countdown_ms
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }
}

impl Default for Tetris {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_before_start_do_not_simulate() {
        let mut tetris = Tetris::new(4);
        let pos = tetris.player().pos();
        tetris.frame(5000);
        assert_eq!(tetris.player().pos(), pos);
        assert_eq!(tetris.player().clock_ms(), 0);
    }

    #[test]
    fn test_countdown_then_gravity() {
        let mut tetris = Tetris::new(4);
        tetris.start();
        assert!(!tetris.is_started());

        tetris.frame(START_COUNTDOWN_MS - 1);
        assert_eq!(tetris.countdown_ms(), Some(1));
        tetris.frame(1);
        assert!(tetris.is_started());

        let y = tetris.player().pos().y;
        tetris.frame(701);
        assert_eq!(tetris.player().pos().y, y + 1);
    }

    #[test]
    fn test_start_twice_keeps_countdown() {
        let mut tetris = Tetris::new(4);
        tetris.start();
        tetris.frame(3000);
        tetris.start();
        assert_eq!(tetris.countdown_ms(), Some(START_COUNTDOWN_MS - 3000));
    }
}
