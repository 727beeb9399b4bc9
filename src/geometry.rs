use crate::consts::FINGER_COUNT;
use crate::error::{KeyForgeError, KfResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// A physical key: position in key units plus the finger that presses it.
///
/// Finger ids run 0..=9 from the left pinky to the right pinky
/// (left thumb = 4, right thumb = 5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyPosition {
    pub x: f64,
    pub y: f64,
    pub finger: u8,
    #[serde(default)]
    pub homing: bool,
}

impl KeyPosition {
    pub fn new(x: f64, y: f64, finger: u8, homing: bool) -> Self {
        Self {
            x,
            y,
            finger,
            homing,
        }
    }
}

/// Pre-parsed keyboard description consumed by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardGeometry {
    pub keys: BTreeMap<String, KeyPosition>,
    /// Assignable keys in the order a layer permutation is laid onto them.
    pub slots: Vec<String>,
    /// `layer_modifiers[i]` is held to reach layer `i + 1`.
    #[serde(default)]
    pub layer_modifiers: Vec<String>,
    #[serde(default)]
    pub shift: Option<String>,
    /// Characters pinned outside the search (space, newline, ...).
    #[serde(default)]
    pub fixed: BTreeMap<char, String>,
}

impl KeyboardGeometry {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KfResult<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            KeyForgeError::Geometry(format!(
                "Failed to read geometry file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let geometry: KeyboardGeometry = serde_json::from_str(&content)?;
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn key(&self, id: &str) -> Option<&KeyPosition> {
        self.keys.get(id)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Highest layer count the modifiers can address.
    pub fn addressable_layers(&self) -> usize {
        self.layer_modifiers.len() + 1
    }

    /// Resting position of every finger. Fingers without keys rest at the origin.
    pub fn homing_points(&self) -> [(f64, f64); FINGER_COUNT] {
        let mut points = [(0.0, 0.0); FINGER_COUNT];
        for key in self.keys.values() {
            if key.homing && (key.finger as usize) < FINGER_COUNT {
                points[key.finger as usize] = (key.x, key.y);
            }
        }
        points
    }

    pub fn validate(&self) -> KfResult<()> {
        if self.slots.is_empty() {
            return Err(KeyForgeError::Geometry("no assignable slots".into()));
        }

        let mut homing_seen = [false; FINGER_COUNT];
        let mut fingers_used = [false; FINGER_COUNT];
        for (id, key) in &self.keys {
            if key.finger as usize >= FINGER_COUNT {
                return Err(KeyForgeError::Geometry(format!(
                    "key '{}' uses finger {} (max {})",
                    id,
                    key.finger,
                    FINGER_COUNT - 1
                )));
            }
            if !key.x.is_finite() || !key.y.is_finite() {
                return Err(KeyForgeError::Geometry(format!(
                    "key '{}' has non-finite coordinates",
                    id
                )));
            }
            let f = key.finger as usize;
            fingers_used[f] = true;
            if key.homing {
                if homing_seen[f] {
                    return Err(KeyForgeError::Geometry(format!(
                        "finger {} has more than one homing key",
                        f
                    )));
                }
                homing_seen[f] = true;
            }
        }

        for f in 0..FINGER_COUNT {
            if fingers_used[f] && !homing_seen[f] {
                return Err(KeyForgeError::Geometry(format!(
                    "finger {} has keys but no homing key",
                    f
                )));
            }
        }

        let mut claimed: HashSet<&str> = HashSet::new();
        let special = self
            .layer_modifiers
            .iter()
            .chain(self.shift.iter())
            .chain(self.fixed.values());
        for id in self.slots.iter().chain(special) {
            if !self.keys.contains_key(id) {
                return Err(KeyForgeError::Geometry(format!("unknown key id '{}'", id)));
            }
        }
        for id in self.slots.iter().chain(self.layer_modifiers.iter()) {
            if !claimed.insert(id.as_str()) {
                return Err(KeyForgeError::Geometry(format!(
                    "key '{}' is used twice as slot or modifier",
                    id
                )));
            }
        }
        if let Some(shift) = &self.shift {
            if claimed.contains(shift.as_str()) {
                return Err(KeyForgeError::Geometry(format!(
                    "shift key '{}' is also a slot or modifier",
                    shift
                )));
            }
        }
        for (c, id) in &self.fixed {
            if self.slots.contains(id) {
                return Err(KeyForgeError::Geometry(format!(
                    "fixed character {:?} is pinned to assignable slot '{}'",
                    c, id
                )));
            }
        }
        Ok(())
    }

    /// Standard 30-key row-staggered board with two thumb clusters.
    ///
    /// Layer 1 is reached with the right inner thumb, layer 2 with the left
    /// inner thumb. Space is pinned to the left thumb's resting key.
    pub fn standard() -> Self {
        const ROWS: [&str; 3] = ["QWERTYUIOP", "ASDFGHJKL;", "ZXCVBNM,./"];
        const ROW_STAGGER: [f64; 3] = [0.0, 0.25, 0.75];
        // Finger per column, left pinky through right pinky.
        const COLUMN_FINGER: [u8; 10] = [0, 1, 2, 3, 3, 6, 6, 7, 8, 9];
        const HOME_COLUMNS: [usize; 8] = [0, 1, 2, 3, 6, 7, 8, 9];

        let mut keys = BTreeMap::new();
        let mut slots = Vec::with_capacity(30);
        for (row, labels) in ROWS.iter().enumerate() {
            for (col, label) in labels.chars().enumerate() {
                let id = label.to_string();
                let homing = row == 1 && HOME_COLUMNS.contains(&col);
                keys.insert(
                    id.clone(),
                    KeyPosition::new(
                        col as f64 + ROW_STAGGER[row],
                        row as f64,
                        COLUMN_FINGER[col],
                        homing,
                    ),
                );
                slots.push(id);
            }
        }

        keys.insert("SPC".into(), KeyPosition::new(3.75, 3.0, 4, true));
        keys.insert("LT1".into(), KeyPosition::new(2.75, 3.0, 4, false));
        keys.insert("RT1".into(), KeyPosition::new(5.75, 3.0, 5, true));
        keys.insert("RT2".into(), KeyPosition::new(6.75, 3.0, 5, false));
        keys.insert("LSFT".into(), KeyPosition::new(-1.25, 2.0, 0, false));

        let mut fixed = BTreeMap::new();
        fixed.insert(' ', "SPC".to_string());

        KeyboardGeometry {
            keys,
            slots,
            layer_modifiers: vec!["RT1".into(), "LT1".into()],
            shift: Some("LSFT".into()),
            fixed,
        }
    }
}
