use physlab_geom::Aabb;

/// Deterministic sweep-and-prune. The sweep runs along whichever world axis
/// spreads the collider centres the widest, and each interval is scanned
/// forward through the sorted order only as far as it can still reach.
/// Colliders with non-finite bounds are dropped before the sweep.
pub fn sweep_pairs(aabbs: &[Aabb]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..aabbs.len())
        .filter(|&i| aabbs[i].min.is_finite() && aabbs[i].max.is_finite())
        .collect();
    if order.len() < 2 {
        return Vec::new();
    }

    let axis = sweep_axis(aabbs, &order);
    order.sort_by(|&a, &b| {
        aabbs[a].min[axis]
            .total_cmp(&aabbs[b].min[axis])
            .then(a.cmp(&b))
    });

    let mut out: Vec<(usize, usize)> = Vec::new();
    for (k, &i) in order.iter().enumerate() {
        let reach = aabbs[i].max[axis];
        for &j in &order[k + 1..] {
            if aabbs[j].min[axis] > reach {
                break;
            }
            if aabbs[i].overlaps(&aabbs[j]) {
                out.push(if i < j { (i, j) } else { (j, i) });
            }
        }
    }

    out.sort_unstable();
    out
}

/// Axis with the widest spread of box centres; ties resolve toward X.
fn sweep_axis(aabbs: &[Aabb], order: &[usize]) -> usize {
    let mut lo = [f32::INFINITY; 3];
    let mut hi = [f32::NEG_INFINITY; 3];
    for &i in order {
        let c = (aabbs[i].min + aabbs[i].max) * 0.5;
        for k in 0..3 {
            lo[k] = lo[k].min(c[k]);
            hi[k] = hi[k].max(c[k]);
        }
    }

    let mut axis = 0;
    let mut spread = hi[0] - lo[0];
    for k in 1..3 {
        let s = hi[k] - lo[k];
        if s > spread {
            axis = k;
            spread = s;
        }
    }
    axis
}

#[cfg(test)]
mod tests {
    use super::*;
    use physlab_core::{vec3, types::Vec3};

    fn unit_box_at(x: f32, y: f32) -> Aabb {
        Aabb::from_center_half_extents(vec3(x, y, 0.0), Vec3::splat(0.5))
    }

    #[test]
    fn finds_overlapping_pairs_sorted() {
        let boxes = vec![unit_box_at(0.0, 0.0), unit_box_at(0.6, 0.0), unit_box_at(5.0, 0.0)];
        let pairs = sweep_pairs(&boxes);
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn sweeps_along_the_widest_axis() {
        // centres spread only on Y, so the sweep must separate these without
        // ever testing the pair
        let boxes = vec![unit_box_at(0.0, 0.0), unit_box_at(0.0, 3.0)];
        assert!(sweep_pairs(&boxes).is_empty());
    }

    #[test]
    fn order_of_input_does_not_change_pair_set() {
        let a = vec![unit_box_at(0.0, 0.0), unit_box_at(0.4, 0.0), unit_box_at(0.8, 0.0)];
        let pairs = sweep_pairs(&a);
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn non_finite_boxes_are_dropped() {
        let mut bad = unit_box_at(0.0, 0.0);
        bad.min.x = f32::NAN;
        let boxes = vec![bad, unit_box_at(0.2, 0.0), unit_box_at(0.4, 0.0)];
        assert_eq!(sweep_pairs(&boxes), vec![(1, 2)]);
    }
}
