use crate::chromosome::Chromosome;
use crate::error::{KeyForgeError, KfResult};
use crate::geometry::{KeyPosition, KeyboardGeometry};
use fnv::FnvHashMap;

/// One key press: target coordinates and the finger that travels there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressStep {
    pub x: f64,
    pub y: f64,
    pub finger: u8,
}

impl From<&KeyPosition> for PressStep {
    fn from(k: &KeyPosition) -> Self {
        Self {
            x: k.x,
            y: k.y,
            finger: k.finger,
        }
    }
}

/// Character → ordered press steps.
#[derive(Debug, Clone, Default)]
pub struct CharacterMapping {
    steps: FnvHashMap<char, Vec<PressStep>>,
}

impl CharacterMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, c: char, steps: Vec<PressStep>) {
        self.steps.insert(c, steps);
    }

    #[inline(always)]
    pub fn get(&self, c: char) -> Option<&[PressStep]> {
        self.steps.get(&c).map(|s| s.as_slice())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Lays a chromosome onto the geometry.
    ///
    /// Layer 0 fills the slots in permutation order. Every upper layer places the
    /// characters still unplaced, in its own permutation order, behind its modifier.
    pub fn build(chromosome: &Chromosome, geometry: &KeyboardGeometry) -> KfResult<Self> {
        if chromosome.layer_count() > geometry.addressable_layers() {
            return Err(KeyForgeError::InvalidChromosome(format!(
                "{} layers but the geometry only addresses {}",
                chromosome.layer_count(),
                geometry.addressable_layers()
            )));
        }

        let slot_steps: Vec<PressStep> = geometry
            .slots
            .iter()
            .map(|id| lookup(geometry, id))
            .collect::<KfResult<_>>()?;

        let mut mapping = CharacterMapping::new();
        for (c, id) in &geometry.fixed {
            mapping.insert(*c, vec![lookup(geometry, id)?]);
        }

        for (layer_idx, layer) in chromosome.layers().iter().enumerate() {
            let modifier = if layer_idx == 0 {
                None
            } else {
                Some(lookup(geometry, &geometry.layer_modifiers[layer_idx - 1])?)
            };

            let unplaced = layer
                .genes()
                .iter()
                .filter(|&&c| !mapping.steps.contains_key(&c))
                .copied()
                .collect::<Vec<_>>();

            for (slot, c) in slot_steps.iter().zip(unplaced) {
                let steps = match modifier {
                    Some(m) => vec![m, *slot],
                    None => vec![*slot],
                };
                mapping.insert(c, steps);
            }
        }

        if let Some(shift_id) = &geometry.shift {
            let shift = lookup(geometry, shift_id)?;
            let shifted: Vec<(char, Vec<PressStep>)> = mapping
                .steps
                .iter()
                .filter(|(c, _)| c.is_lowercase())
                .filter_map(|(c, steps)| {
                    let mut upper = c.to_uppercase();
                    match (upper.next(), upper.next()) {
                        (Some(u), None) if u != *c && !mapping.steps.contains_key(&u) => {
                            let mut seq = Vec::with_capacity(steps.len() + 1);
                            seq.push(shift);
                            seq.extend_from_slice(steps);
                            Some((u, seq))
                        }
                        _ => None,
                    }
                })
                .collect();
            for (c, steps) in shifted {
                mapping.insert(c, steps);
            }
        }

        Ok(mapping)
    }
}

fn lookup(geometry: &KeyboardGeometry, id: &str) -> KfResult<PressStep> {
    geometry
        .key(id)
        .map(PressStep::from)
        .ok_or_else(|| KeyForgeError::Geometry(format!("unknown key id '{}'", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::{CharacterSet, Layer};

    #[test]
    fn upper_layer_places_overflow_behind_modifier() {
        let mut geom = KeyboardGeometry::standard();
        geom.slots.truncate(2); // Q, W
        let cs = CharacterSet::parse("abc").unwrap();
        let base = Layer::new("abc".chars().collect(), &cs).unwrap();
        let upper = Layer::new("cba".chars().collect(), &cs).unwrap();
        let chromosome = Chromosome::from_layers_unchecked(vec![base, upper]);

        let map = CharacterMapping::build(&chromosome, &geom).unwrap();
        assert_eq!(map.get('a').unwrap().len(), 1);
        let c_steps = map.get('c').unwrap();
        assert_eq!(c_steps.len(), 2);
        // RT1 modifier then the first slot.
        assert_eq!(c_steps[0].finger, 5);
        assert_eq!(c_steps[1], PressStep::from(geom.key("Q").unwrap()));
    }

    #[test]
    fn shift_maps_uppercase() {
        let geom = KeyboardGeometry::standard();
        let cs = CharacterSet::parse("abcdefghijklmnopqrstuvwxyz,.;/").unwrap();
        let chromosome = Chromosome::single(Layer::identity(&cs));
        let map = CharacterMapping::build(&chromosome, &geom).unwrap();
        let upper = map.get('A').unwrap();
        assert_eq!(upper.len(), 2);
        assert_eq!(upper[0].finger, 0);
        assert!(map.get(' ').is_some());
        assert!(map.get('~').is_none());
    }

    #[test]
    fn too_many_layers_for_geometry() {
        let mut geom = KeyboardGeometry::standard();
        geom.layer_modifiers.clear();
        let cs = CharacterSet::parse("ab").unwrap();
        let chromosome =
            Chromosome::from_layers_unchecked(vec![Layer::identity(&cs), Layer::identity(&cs)]);
        assert!(CharacterMapping::build(&chromosome, &geom).is_err());
    }
}
