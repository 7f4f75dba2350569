use focuser_proto::{effective_step_count, CoarseMultiplier, Direction, MoveCommand};
use focuser_store::MotorConfig;

/// Mutable shell state: the in-memory config, step-mode toggles and the
/// dial position counter. Display state only, never persisted.
#[derive(Clone, Debug)]
pub struct Session {
    config: MotorConfig,
    fine: bool,
    multiplier: CoarseMultiplier,
    /// Microsteps from the zero mark, within one revolution.
    position: u32,
}

impl Session {
    pub fn new(config: MotorConfig) -> Self {
        Self {
            config,
            fine: false,
            multiplier: CoarseMultiplier::default(),
            position: 0,
        }
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    pub fn fine(&self) -> bool {
        self.fine
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn set_fine(&mut self, fine: bool) {
        self.fine = fine;
    }

    pub fn set_multiplier(&mut self, multiplier: CoarseMultiplier) {
        self.multiplier = multiplier;
    }

    /// Cycling the multiplier always drops fine mode, matching the panel
    /// control.
    pub fn cycle_multiplier(&mut self) -> CoarseMultiplier {
        self.fine = false;
        self.multiplier = self.multiplier.next();
        self.multiplier
    }

    /// Apply freshly persisted motor constants to the running session.
    pub fn apply_config(&mut self, config: MotorConfig) {
        self.config = config;
    }

    /// Microsteps one operator tick covers right now.
    pub fn step_count(&self) -> u16 {
        effective_step_count(self.fine, self.multiplier, self.config.microstep_divisor)
    }

    /// One operator tick: advance the dial and produce the move to send.
    pub fn tick(&mut self, direction: Direction) -> MoveCommand {
        let count = self.step_count();
        self.advance(direction, count);
        MoveCommand {
            direction,
            microstep_count: count,
            divisor: self.config.microstep_divisor,
        }
    }

    /// Dial angle of the current position.
    pub fn angle_degrees(&self) -> f64 {
        self.config.degrees_per_microstep() * f64::from(self.position)
    }

    fn advance(&mut self, direction: Direction, count: u16) {
        let rev = self.config.microsteps_per_revolution();
        let step = u32::from(count);
        match direction {
            Direction::Out => {
                self.position += step;
                if self.position >= rev {
                    self.position = 0;
                }
            }
            Direction::In => {
                self.position = match self.position.checked_sub(step) {
                    Some(p) => p,
                    None => rev - 1,
                };
            }
        }
        // The dial sits on whole ticks.
        if step > 0 {
            self.position -= self.position % step;
        }
    }
}
