use super::physics::{euclidean_dist, FittsModel};
use crate::config::SimulationParams;
use crate::consts::FINGER_COUNT;
use crate::error::KfResult;
use crate::geometry::KeyboardGeometry;
use crate::keymap::CharacterMapping;
use serde::{Deserialize, Serialize};

/// Raw typing cost of one text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub distance: f64,
    pub time: f64,
}

/// Replays text through per-finger state, grouping presses that can move in parallel.
#[derive(Debug, Clone)]
pub struct TypingSimulator {
    fitts: FittsModel,
    reset_interval: usize,
    overhead: [f64; FINGER_COUNT],
}

/// Per-call scratch state. Lives on the stack.
struct Hands {
    home: [(f64, f64); FINGER_COUNT],
    pos: [(f64, f64); FINGER_COUNT],
    moved: [f64; FINGER_COUNT],
    active: u16,
}

impl TypingSimulator {
    pub fn new(params: &SimulationParams) -> KfResult<Self> {
        params.validate()?;
        Ok(Self {
            fitts: FittsModel {
                a: params.fitts_a,
                b: params.fitts_b,
                width: params.target_width,
            },
            reset_interval: params.reset_interval,
            overhead: params.finger_overhead()?,
        })
    }

    pub fn fitts(&self) -> &FittsModel {
        &self.fitts
    }

    pub fn simulate(
        &self,
        text: &str,
        mapping: &CharacterMapping,
        geometry: &KeyboardGeometry,
    ) -> Measurement {
        let home = geometry.homing_points();
        let mut hands = Hands {
            home,
            pos: home,
            moved: [0.0; FINGER_COUNT],
            active: 0,
        };
        let mut total = Measurement::default();
        let mut typed_since_reset = 0usize;
        let mut reset_pending = false;

        for c in text.chars() {
            let Some(steps) = mapping.get(c) else {
                continue;
            };
            for step in steps {
                let f = step.finger as usize;
                let bit = 1u16 << f;
                if hands.active & bit != 0 {
                    self.close_group(&mut hands, &mut total);
                    if reset_pending {
                        hands.pos = hands.home;
                        reset_pending = false;
                    }
                }
                let (px, py) = hands.pos[f];
                hands.moved[f] = euclidean_dist(px, py, step.x, step.y);
                hands.pos[f] = (step.x, step.y);
                hands.active |= bit;
            }

            typed_since_reset += 1;
            if typed_since_reset >= self.reset_interval {
                typed_since_reset = 0;
                reset_pending = true;
            }
        }

        self.close_group(&mut hands, &mut total);
        total
    }

    #[inline(always)]
    fn close_group(&self, hands: &mut Hands, total: &mut Measurement) {
        if hands.active == 0 {
            return;
        }
        let mut slowest = 0.0f64;
        let mut overhead = 0.0;
        for f in 0..FINGER_COUNT {
            if hands.active & (1 << f) != 0 {
                let d = hands.moved[f];
                total.distance += d;
                slowest = slowest.max(self.fitts.time(d));
                overhead += self.overhead[f];
                hands.moved[f] = 0.0;
            }
        }
        total.time += slowest + overhead;
        hands.active = 0;
    }
}
