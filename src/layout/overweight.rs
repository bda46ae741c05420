use super::Site;

/// How a pair of sites violating `d² >= |w_i - w_j|` gets repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverweightStrategy {
    /// Raise the lighter weight just enough to restore the precondition.
    #[default]
    RaiseLightest,
    /// Lower the heavier weight to `d² + w_light / 2`, floored at epsilon
    /// unless that floor would keep the pair in violation.
    LowerHeaviest,
}

impl OverweightStrategy {
    /// Repair weights until no pair violates the precondition. Returns the
    /// number of fixes applied.
    pub fn resolve(self, sites: &mut [Site], epsilon: f64) -> usize {
        let fixes = match self {
            Self::RaiseLightest => resolve_with(sites, |heavy, light, sq_dist| {
                let overweight = heavy.weight - light.weight - sq_dist;
                light.weight += overweight + epsilon.min(sq_dist);
            }),
            Self::LowerHeaviest => resolve_with(sites, |heavy, light, sq_dist| {
                // the epsilon floor never lifts the pair back out of range
                let floor = epsilon.min(light.weight + sq_dist);
                let lowered = (sq_dist + light.weight / 2.0)
                    .max(floor)
                    .max(light.weight - sq_dist);
                heavy.weight = if (lowered - light.weight).abs() <= sq_dist {
                    lowered
                } else {
                    light.weight
                };
            }),
        };
        if fixes > 0 {
            tracing::trace!("Overweight fixes applied: {}", fixes);
        }
        fixes
    }
}

/// First-violation-found scan, restarted after every fix.
fn resolve_with<F>(sites: &mut [Site], mut fix: F) -> usize
where
    F: FnMut(&mut Site, &mut Site, f64),
{
    let mut fix_count = 0;
    'scan: loop {
        for i in 0..sites.len() {
            for j in (i + 1)..sites.len() {
                let sq_dist = sites[i].position.squared_distance(sites[j].position);
                let (left, right) = sites.split_at_mut(j);
                let (a, b) = (&mut left[i], &mut right[0]);
                let (heavy, light) = if a.weight > b.weight { (a, b) } else { (b, a) };
                if sq_dist < heavy.weight - light.weight {
                    fix(heavy, light, sq_dist);
                    fix_count += 1;
                    continue 'scan;
                }
            }
        }
        return fix_count;
    }
}

/// True when every pair satisfies `d² >= |w_i - w_j|`.
pub fn is_resolved(sites: &[Site]) -> bool {
    sites.iter().enumerate().all(|(i, a)| {
        sites[i + 1..]
            .iter()
            .all(|b| a.position.squared_distance(b.position) >= (a.weight - b.weight).abs())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn site(index: usize, x: f64, y: f64, weight: f64) -> Site {
        Site {
            index,
            position: Point::new(x, y),
            weight,
            target_area: 0.0,
        }
    }

    #[test]
    fn resolved_sites_are_untouched() {
        let mut sites = vec![site(0, 0.0, 0.0, 10.0), site(1, 10.0, 0.0, 20.0)];
        assert_eq!(OverweightStrategy::RaiseLightest.resolve(&mut sites, 1.0), 0);
        assert_eq!(sites[0].weight, 10.0);
        assert_eq!(sites[1].weight, 20.0);
    }

    #[test]
    fn raise_lightest_lifts_the_light_site_only() {
        let mut sites = vec![site(0, 0.0, 0.0, 200.0), site(1, 10.0, 0.0, 50.0)];
        let fixes = OverweightStrategy::RaiseLightest.resolve(&mut sites, 1.0);
        assert_eq!(fixes, 1);
        assert_eq!(sites[0].weight, 200.0);
        // 50 + (200 - 50 - 100) + 1
        assert_eq!(sites[1].weight, 101.0);
        assert!(is_resolved(&sites));
    }

    #[test]
    fn close_sites_do_not_ping_pong() {
        let mut sites = vec![site(0, 0.0, 0.0, 5.0), site(1, 0.1, 0.0, 0.0)];
        OverweightStrategy::RaiseLightest.resolve(&mut sites, 1.0);
        assert!(is_resolved(&sites));
        assert!((sites[1].weight - sites[0].weight).abs() < 1e-9);
    }

    #[test]
    fn lower_heaviest_lowers_the_heavy_site() {
        let mut sites = vec![site(0, 0.0, 0.0, 200.0), site(1, 10.0, 0.0, 50.0)];
        OverweightStrategy::LowerHeaviest.resolve(&mut sites, 1.0);
        assert_eq!(sites[0].weight, 125.0);
        assert_eq!(sites[1].weight, 50.0);
        assert!(is_resolved(&sites));
    }

    #[test]
    fn lower_heaviest_settles_below_epsilon() {
        let mut sites = vec![site(0, 0.0, 0.0, 5.0), site(1, 0.1, 0.0, 0.0)];
        let fixes = OverweightStrategy::LowerHeaviest.resolve(&mut sites, 1.0);
        assert_eq!(fixes, 1);
        assert!(is_resolved(&sites));
        assert!((sites[0].weight - 0.01).abs() < 1e-12);
        assert_eq!(sites[1].weight, 0.0);
    }

    #[test]
    fn chains_of_violations_settle() {
        let mut sites = vec![
            site(0, 0.0, 0.0, 1000.0),
            site(1, 3.0, 0.0, 1.0),
            site(2, 6.0, 0.0, 400.0),
            site(3, 3.0, 4.0, 2.0),
        ];
        OverweightStrategy::RaiseLightest.resolve(&mut sites, 1.0);
        assert!(is_resolved(&sites));
    }
}
