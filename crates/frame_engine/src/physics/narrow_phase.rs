//! Shape-specific overlap tests
//!
//! Every test returns contact data with the normal pointing from the first
//! shape to the second and negative separation for overlap. Touching
//! surfaces (separation exactly zero) count as contact.

use crate::foundation::math::{constants, utils, Vec3};

use super::collision::{Bounds, Sphere, WorldShape};
use super::contact::{Contact, ContactPoint};

/// Outcome of one narrow-phase test
#[derive(Debug, Clone, PartialEq)]
pub enum ContactTest {
    /// Shapes do not touch
    Separated,
    /// Shapes touch or overlap
    Touching(Contact),
    /// Shapes overlap but no contact normal can be derived
    Degenerate,
}

/// Run the test matching the two shape kinds, keeping at most `max_points`
pub fn collide(a: &WorldShape, b: &WorldShape, max_points: usize) -> ContactTest {
    match (a, b) {
        (WorldShape::Sphere(a), WorldShape::Sphere(b)) => sphere_sphere(a, b),
        (WorldShape::Sphere(sphere), WorldShape::Box(bounds)) => sphere_box(sphere, bounds),
        (WorldShape::Box(bounds), WorldShape::Sphere(sphere)) => flip(sphere_box(sphere, bounds)),
        (WorldShape::Box(a), WorldShape::Box(b)) => box_box(a, b, max_points),
    }
}

fn flip(test: ContactTest) -> ContactTest {
    match test {
        ContactTest::Touching(mut contact) => {
            contact.normal = -contact.normal;
            ContactTest::Touching(contact)
        }
        other => other,
    }
}

/// Sphere against sphere
pub fn sphere_sphere(a: &Sphere, b: &Sphere) -> ContactTest {
    let delta = b.center - a.center;
    let distance = delta.magnitude();
    let separation = distance - (a.radius + b.radius);
    if separation > 0.0 {
        return ContactTest::Separated;
    }

    // concentric spheres have no meaningful push direction
    let Some(normal) = utils::try_normalize(&delta) else {
        return ContactTest::Degenerate;
    };
    let position = a.center + normal * (a.radius + 0.5 * separation);
    ContactTest::Touching(Contact {
        normal,
        points: vec![ContactPoint::new(position, separation)],
    })
}

/// Sphere against box; the normal points from the sphere into the box
pub fn sphere_box(sphere: &Sphere, bounds: &Bounds) -> ContactTest {
    let closest = bounds.closest_point(&sphere.center);
    let delta = closest - sphere.center;
    let distance_squared = delta.magnitude_squared();
    if distance_squared > sphere.radius * sphere.radius {
        return ContactTest::Separated;
    }

    if distance_squared > constants::NORMAL_EPSILON * constants::NORMAL_EPSILON {
        let distance = distance_squared.sqrt();
        return ContactTest::Touching(Contact {
            normal: delta / distance,
            points: vec![ContactPoint::new(closest, distance - sphere.radius)],
        });
    }

    // center inside the box: leave through the nearest face
    let min = bounds.min();
    let max = bounds.max();
    let mut best_depth = f32::INFINITY;
    let mut face_normal = Vec3::zeros();
    for axis in 0..3 {
        let to_min = sphere.center[axis] - min[axis];
        let to_max = max[axis] - sphere.center[axis];
        if to_min < best_depth {
            best_depth = to_min;
            face_normal = Vec3::zeros();
            face_normal[axis] = -1.0;
        }
        if to_max < best_depth {
            best_depth = to_max;
            face_normal = Vec3::zeros();
            face_normal[axis] = 1.0;
        }
    }
    if !best_depth.is_finite() {
        return ContactTest::Degenerate;
    }

    ContactTest::Touching(Contact {
        normal: -face_normal,
        points: vec![ContactPoint::new(
            sphere.center + face_normal * best_depth,
            -(best_depth + sphere.radius),
        )],
    })
}

/// Box against box, using the axis of least overlap
///
/// Produces up to four points at the corners of the overlap region's face,
/// or its center when `max_points` is 1.
pub fn box_box(a: &Bounds, b: &Bounds, max_points: usize) -> ContactTest {
    let overlap_min = a.min().sup(&b.min());
    let overlap_max = a.max().inf(&b.max());
    let overlap = overlap_max - overlap_min;
    if overlap.iter().any(|o| *o < 0.0) {
        return ContactTest::Separated;
    }

    let mut axis = 0;
    for i in 1..3 {
        if overlap[i] < overlap[axis] {
            axis = i;
        }
    }
    let mut normal = Vec3::zeros();
    normal[axis] = if b.center[axis] >= a.center[axis] { 1.0 } else { -1.0 };
    let separation = -overlap[axis];

    let region = Bounds::from_min_max(overlap_min, overlap_max);
    let mut points: Vec<ContactPoint> = Vec::with_capacity(4);
    if max_points <= 1 {
        points.push(ContactPoint::new(region.center, separation));
    } else {
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        // diagonal corners first, so a two-point budget spans the face
        for (su, sv) in [(-1.0, -1.0), (1.0, 1.0), (1.0, -1.0), (-1.0, 1.0)] {
            let mut corner = region.center;
            corner[u] += su * region.extents[u];
            corner[v] += sv * region.extents[v];
            let duplicate = points
                .iter()
                .any(|p| (p.position - corner).magnitude_squared() < constants::FACE_EPSILON * constants::FACE_EPSILON);
            if !duplicate {
                points.push(ContactPoint::new(corner, separation));
            }
        }
        points.truncate(max_points);
    }

    ContactTest::Touching(Contact { normal, points })
}
