#[inline(always)]
pub fn euclidean_dist(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x1 - x2;
    let dy = y1 - y2;
    (dx * dx + dy * dy).sqrt()
}

/// Shannon formulation of Fitts's Law: `a + b * log2(d / w + 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittsModel {
    pub a: f64,
    pub b: f64,
    pub width: f64,
}

impl FittsModel {
    #[inline(always)]
    pub fn time(&self, distance: f64) -> f64 {
        self.a + self.b * (distance / self.width + 1.0).log2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_costs_intercept() {
        let m = FittsModel {
            a: 0.2,
            b: 0.1,
            width: 1.0,
        };
        assert_eq!(m.time(0.0), 0.2);
        // d = w gives exactly one bit.
        assert!((m.time(1.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn pythagoras() {
        assert_eq!(euclidean_dist(0.0, 0.0, 3.0, 4.0), 5.0);
    }
}
