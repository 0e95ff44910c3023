use physlab_core::types::{Isometry, Vec3};
use glam::Mat3A;
use physlab_geom::Shape;

/// Contacts are generated while shapes are still this far apart, so the
/// velocity solver can catch an approach before it turns into overlap.
pub const CONTACT_PREDICTION: f32 = 5.0e-3;

/// One generated contact: `normal` points from A toward B. `depth` is the
/// overlap along it; negative depth is a speculative contact whose surfaces
/// are still `-depth` apart.
#[derive(Copy, Clone, Debug)]
pub struct Contact {
    pub normal: Vec3,
    pub depth: f32,
}

/// Dispatch on the shape pair. Cylinders collide via their bounding capsule.
/// Returns the contact with the normal oriented A -> B, or None when further
/// apart than the prediction margin.
pub fn generate(sa: &Shape, pa: &Isometry, sb: &Shape, pb: &Isometry) -> Option<Contact> {
    let sa = as_collidable(sa);
    let sb = as_collidable(sb);
    match (sa, sb) {
        (Collidable::Box(ha), Collidable::Box(hb)) => box_box(pa, ha, pb, hb),
        (Collidable::Sphere(ra), Collidable::Sphere(rb)) => sphere_sphere(pa.pos, ra, pb.pos, rb),
        (Collidable::Sphere(r), Collidable::Box(hb)) => sphere_box(pa.pos, r, pb, hb),
        (Collidable::Box(ha), Collidable::Sphere(r)) => sphere_box(pb.pos, r, pa, ha).map(Contact::flipped),
        (Collidable::Capsule { r, hh }, Collidable::Box(hb)) => capsule_box(pa, r, hh, pb, hb),
        (Collidable::Box(ha), Collidable::Capsule { r, hh }) => capsule_box(pb, r, hh, pa, ha).map(Contact::flipped),
        (Collidable::Sphere(ra), Collidable::Capsule { r, hh }) => sphere_capsule(pa.pos, ra, pb, r, hh),
        (Collidable::Capsule { r, hh }, Collidable::Sphere(rb)) => sphere_capsule(pb.pos, rb, pa, r, hh).map(Contact::flipped),
        (Collidable::Capsule { r: r1, hh: h1 }, Collidable::Capsule { r: r2, hh: h2 }) => {
            capsule_capsule(pa, r1, h1, pb, r2, h2)
        }
    }
}

impl Contact {
    fn flipped(self) -> Self {
        Contact { normal: -self.normal, depth: self.depth }
    }
}

enum Collidable {
    Sphere(f32),
    Box(Vec3),
    Capsule { r: f32, hh: f32 },
}

fn as_collidable(s: &Shape) -> Collidable {
    match *s {
        Shape::Sphere { r } => Collidable::Sphere(r),
        Shape::Box { hx, hy, hz } => Collidable::Box(Vec3::new(hx, hy, hz)),
        Shape::Capsule { r, hh } | Shape::Cylinder { r, hh } => Collidable::Capsule { r, hh },
    }
}

/* ---------------- box vs box (SAT over 15 axes) ---------------- */

fn box_box(pa: &Isometry, ha: Vec3, pb: &Isometry, hb: Vec3) -> Option<Contact> {
    let ra = Mat3A::from_quat(pa.rot);
    let rb = Mat3A::from_quat(pb.rot);
    let a_axes = [ra.x_axis, ra.y_axis, ra.z_axis];
    let b_axes = [rb.x_axis, rb.y_axis, rb.z_axis];
    let t = pb.pos - pa.pos;

    let mut best_depth = f32::INFINITY;
    let mut best_normal = Vec3::Y;

    let mut test_axis = |axis: Vec3| -> bool {
        let len2 = axis.length_squared();
        if len2 < 1.0e-8 { return true; } // degenerate cross product, skip
        let l = axis / len2.sqrt();
        let proj_a = a_axes[0].dot(l).abs() * ha.x
            + a_axes[1].dot(l).abs() * ha.y
            + a_axes[2].dot(l).abs() * ha.z;
        let proj_b = b_axes[0].dot(l).abs() * hb.x
            + b_axes[1].dot(l).abs() * hb.y
            + b_axes[2].dot(l).abs() * hb.z;
        let dist = t.dot(l);
        let overlap = proj_a + proj_b - dist.abs();
        if overlap <= -CONTACT_PREDICTION { return false; }
        if overlap < best_depth {
            best_depth = overlap;
            best_normal = if dist >= 0.0 { l } else { -l };
        }
        true
    };

    for ax in a_axes {
        if !test_axis(ax) { return None; }
    }
    for ax in b_axes {
        if !test_axis(ax) { return None; }
    }
    for aa in a_axes {
        for bb in b_axes {
            if !test_axis(aa.cross(bb)) { return None; }
        }
    }

    Some(Contact { normal: best_normal, depth: best_depth })
}

/* ---------------- sphere pairs ---------------- */

fn sphere_sphere(pa: Vec3, ra: f32, pb: Vec3, rb: f32) -> Option<Contact> {
    let d = pb - pa;
    let dist2 = d.length_squared();
    let rsum = ra + rb;
    let reach = rsum + CONTACT_PREDICTION;
    if dist2 >= reach * reach { return None; }
    let dist = dist2.sqrt();
    let normal = if dist > 1.0e-6 { d / dist } else { Vec3::X };
    Some(Contact { normal, depth: rsum - dist })
}

/// Sphere at `ps` vs an oriented box: clamp in box local space.
/// Normal points from the sphere toward the box.
fn sphere_box(ps: Vec3, r: f32, pb: &Isometry, hb: Vec3) -> Option<Contact> {
    let inv = pb.rot.conjugate();
    let local = inv * (ps - pb.pos);
    let clamped = local.clamp(-hb, hb);
    let delta = local - clamped;
    let dist = delta.length();
    if dist >= r + CONTACT_PREDICTION { return None; }
    let local_n = if dist > 1.0e-6 { delta / dist } else { Vec3::Y };
    // box -> sphere direction, so sphere -> box is the negation
    let n_world = pb.rot * local_n;
    Some(Contact { normal: -n_world, depth: r - dist })
}

/* ---------------- capsule pairs ---------------- */

fn capsule_segment(p: &Isometry, hh: f32) -> (Vec3, Vec3) {
    let tip = Vec3::Y * hh;
    (p.transform_point(tip), p.transform_point(-tip))
}

/// Capsule vs oriented box via closest segment point in box local space.
/// Normal points from the capsule toward the box.
fn capsule_box(pc: &Isometry, r: f32, hh: f32, pb: &Isometry, hb: Vec3) -> Option<Contact> {
    let (wa, wb) = capsule_segment(pc, hh);
    let inv = pb.rot.conjugate();
    let la = inv * (wa - pb.pos);
    let lb = inv * (wb - pb.pos);
    let (p_seg, p_box) = closest_points_segment_aabb(la, lb, -hb, hb);
    let mut n = p_seg - p_box; // box -> capsule axis, local
    let dist = n.length();
    if dist >= r + CONTACT_PREDICTION { return None; }
    if dist > 1.0e-6 { n /= dist; } else { n = Vec3::Y; }
    Some(Contact { normal: -(pb.rot * n), depth: r - dist })
}

fn sphere_capsule(ps: Vec3, rs: f32, pc: &Isometry, rc: f32, hh: f32) -> Option<Contact> {
    let (a, b) = capsule_segment(pc, hh);
    let (q, _t) = closest_point_on_segment(a, b, ps);
    sphere_sphere(ps, rs, q, rc)
}

fn capsule_capsule(pa: &Isometry, ra: f32, ha: f32, pb: &Isometry, rb: f32, hb: f32) -> Option<Contact> {
    let (a0, a1) = capsule_segment(pa, ha);
    let (b0, b1) = capsule_segment(pb, hb);
    let (p, q) = closest_points_segments(a0, a1, b0, b1);
    sphere_sphere(p, ra, q, rb)
}

/* ---------------- closest-point helpers ---------------- */

#[inline]
fn closest_point_on_segment(a: Vec3, b: Vec3, p: Vec3) -> (Vec3, f32) {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= 1.0e-12 { return (a, 0.0); }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (a + ab * t, t)
}

fn closest_points_segment_aabb(a: Vec3, b: Vec3, mn: Vec3, mx: Vec3) -> (Vec3, Vec3) {
    let mut ps = (a + b) * 0.5;
    let mut qs = ps.clamp(mn, mx);
    for _ in 0..3 {
        let (p2, _t) = closest_point_on_segment(a, b, qs);
        ps = p2;
        qs = ps.clamp(mn, mx);
    }
    (ps, qs)
}

fn closest_points_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    let (s, t);
    if a <= 1.0e-12 && e <= 1.0e-12 {
        return (p1, p2);
    } else if a <= 1.0e-12 {
        s = 0.0;
        t = (f / e).clamp(0.0, 1.0);
    } else {
        let c = d1.dot(r);
        if e <= 1.0e-12 {
            t = 0.0;
            s = (-c / a).clamp(0.0, 1.0);
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let s0 = if denom > 1.0e-12 { ((b * f - c * e) / denom).clamp(0.0, 1.0) } else { 0.0 };
            let t0 = ((b * s0 + f) / e).clamp(0.0, 1.0);
            s = ((b * t0 - c) / a).clamp(0.0, 1.0);
            t = t0;
        }
    }
    (p1 + d1 * s, p2 + d2 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use physlab_core::{vec3, iso, quat_identity};
    use glam::Quat;
    use approx::assert_relative_eq;

    #[test]
    fn stacked_boxes_touch_along_y() {
        let ground = Shape::Box { hx: 50.0, hy: 0.5, hz: 50.0 };
        let cube = Shape::Box { hx: 0.5, hy: 0.5, hz: 0.5 };
        let c = generate(
            &ground, &iso(vec3(0.0, -0.5, 0.0), quat_identity()),
            &cube, &iso(vec3(0.0, 0.45, 0.0), quat_identity()),
        ).expect("overlapping stack must produce a contact");
        assert_relative_eq!(c.normal.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(c.depth, 0.05, epsilon = 1e-5);
    }

    #[test]
    fn rotated_box_sat_rejects_near_miss() {
        let a = Shape::Box { hx: 1.0, hy: 0.1, hz: 1.0 };
        let b = Shape::Box { hx: 0.5, hy: 0.5, hz: 0.5 };
        // Cube hangs above the slab centre; the tilted slab's AABB still
        // reaches the cube but SAT must separate them.
        let slab_pose = iso(vec3(0.0, 0.0, 0.0), Quat::from_rotation_z(0.6));
        let cube_pose = iso(vec3(0.0, 1.1, 0.0), quat_identity());
        assert!(generate(&a, &slab_pose, &b, &cube_pose).is_none());
    }

    #[test]
    fn sphere_on_rotated_box_normal_follows_surface() {
        let slab = Shape::Box { hx: 5.0, hy: 0.5, hz: 2.0 };
        let ball = Shape::Sphere { r: 0.5 };
        let angle = 0.3f32;
        let rot = Quat::from_rotation_z(angle);
        // place sphere slightly embedded along the slab's local +Y
        let surface_n = rot * Vec3::Y;
        let center = surface_n * (0.5 + 0.45);
        let c = generate(
            &ball, &iso(center, quat_identity()),
            &slab, &iso(Vec3::ZERO, rot),
        ).expect("embedded sphere must contact");
        // normal points sphere -> slab, i.e. against the surface normal
        assert_relative_eq!(c.normal.dot(surface_n), -1.0, epsilon = 1e-4);
        assert_relative_eq!(c.depth, 0.05, epsilon = 1e-4);
    }

    #[test]
    fn sphere_sphere_depth_is_overlap() {
        let s = Shape::Sphere { r: 0.5 };
        let c = generate(
            &s, &iso(vec3(0.0, 0.0, 0.0), quat_identity()),
            &s, &iso(vec3(0.9, 0.0, 0.0), quat_identity()),
        ).unwrap();
        assert_relative_eq!(c.depth, 0.1, epsilon = 1e-6);
        assert_relative_eq!(c.normal.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn capsule_rests_on_box_top() {
        let ground = Shape::Box { hx: 10.0, hy: 0.5, hz: 10.0 };
        let cap = Shape::Capsule { r: 0.25, hh: 0.5 };
        // lying horizontally, slightly embedded
        let pose = iso(vec3(0.0, 0.7, 0.0), Quat::from_rotation_z(core::f32::consts::FRAC_PI_2));
        let c = generate(
            &cap, &pose,
            &ground, &iso(vec3(0.0, 0.0, 0.0), quat_identity()),
        ).expect("capsule must contact");
        assert!(c.normal.y < -0.99, "normal should point down into the box");
        assert_relative_eq!(c.depth, 0.05, epsilon = 1e-4);
    }

    #[test]
    fn cylinder_collides_via_bounding_capsule() {
        let cyl = Shape::Cylinder { r: 0.5, hh: 0.5 };
        let ground = Shape::Box { hx: 10.0, hy: 0.5, hz: 10.0 };
        let c = generate(
            &cyl, &iso(vec3(0.0, 0.95, 0.0), quat_identity()),
            &ground, &iso(vec3(0.0, 0.0, 0.0), quat_identity()),
        );
        assert!(c.is_some());
    }
}
