use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

const MIN_DISTANCE_SQ: f32 = 36.0;

fn fallback_direction(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) theta: f32,
    pub(super) alpha: f32,
}

/// Velocity change pushing `index` away from everything in `node`.
/// Magnitude falls off with `1 / distance`, the far field is approximated
/// by cell aggregates.
pub(super) fn accumulate_charge_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    charges: &[f32],
    params: ChargeParams,
    delta_v: &mut Vec2,
) {
    if node.charge <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            let delta = point - positions[other];
            let distance_sq = delta.length_sq();
            let direction = if distance_sq > 0.0001 {
                delta
            } else {
                fallback_direction(index, other)
            };
            *delta_v += direction
                * (params.strength * charges[other] * params.alpha
                    / distance_sq.max(MIN_DISTANCE_SQ));
        }
        return;
    }

    let delta = point - node.center_of_charge;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    let can_approximate = !node.bounds.contains(point)
        && (node.bounds.side_length() * node.bounds.side_length()
            / (params.theta * params.theta))
            < distance_sq;

    if can_approximate {
        *delta_v += delta * (params.strength * node.charge * params.alpha / distance_sq);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge_for_node(child, index, positions, charges, params, delta_v);
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) max_distance_sq: f32,
}

fn resolve_overlap(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    deltas: &mut [Vec2],
) {
    let min_distance = radii[from] + radii[to];
    let delta = positions[from] - positions[to];
    let distance_sq = delta.length_sq();
    if distance_sq >= min_distance * min_distance {
        return;
    }

    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        fallback_direction(from, to)
    };

    let overlap = (min_distance - distance) * strength;
    let from_area = radii[from] * radii[from];
    let to_area = radii[to] * radii[to];
    let to_share = from_area / (from_area + to_area).max(f32::EPSILON);

    deltas[from] += direction * overlap * (1.0 - to_share);
    deltas[to] -= direction * overlap * to_share;
}

/// Dual-tree traversal separating overlapping circles; larger circles
/// yield less.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    resolve_overlap(from, to, positions, radii, params.strength, deltas);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_overlap(from, to, positions, radii, params.strength, deltas);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, deltas);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, deltas,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, deltas);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, deltas);
        }
    }
}

#[derive(Clone, Copy)]
pub(super) struct LinkParams {
    pub(super) strength: f32,
    pub(super) alpha: f32,
}

/// Spring between linked nodes, resting at `rest_lengths[i]` for link `i`.
/// The correction is split by degree so hubs move less than leaves.
pub(super) fn apply_link_springs(
    links: &[(usize, usize)],
    rest_lengths: &[f32],
    degrees: &[usize],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    params: LinkParams,
) {
    if params.strength <= 0.0 {
        return;
    }

    for (link_index, &(source, target)) in links.iter().enumerate() {
        if source == target || source >= positions.len() || target >= positions.len() {
            continue;
        }

        let mut delta =
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        if delta.length_sq() <= 0.0001 {
            delta = fallback_direction(source, target) * 0.01;
        }
        let distance = delta.length();
        let stretch =
            (distance - rest_lengths[link_index]) / distance * params.alpha * params.strength;
        let correction = delta * stretch;

        let source_degree = degrees[source].max(1) as f32;
        let target_degree = degrees[target].max(1) as f32;
        let bias = source_degree / (source_degree + target_degree);

        velocities[target] -= correction * bias;
        velocities[source] += correction * (1.0 - bias);
    }
}

/// Independent per-axis pull towards `target`, as `forceX`/`forceY` do.
pub(super) fn pull_towards(position: Vec2, target: Vec2, strength: Vec2, alpha: f32) -> Vec2 {
    let offset = target - position;
    vec2(offset.x * strength.x, offset.y * strength.y) * alpha
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_pushes_nodes_apart() {
        let positions = [vec2(-5.0, 0.0), vec2(5.0, 0.0)];
        let charges = [1.0, 1.0];
        let tree = QuadNode::build(&positions, &charges).unwrap();
        let params = ChargeParams {
            strength: 300.0,
            theta: 0.8,
            alpha: 1.0,
        };

        let mut left = Vec2::ZERO;
        accumulate_charge_for_node(&tree, 0, &positions, &charges, params, &mut left);
        let mut right = Vec2::ZERO;
        accumulate_charge_for_node(&tree, 1, &positions, &charges, params, &mut right);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left.x + right.x).abs() < 1e-4);
    }

    #[test]
    fn overlapping_circles_separate_and_distant_ones_do_not() {
        let positions = [vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(500.0, 0.0)];
        let radii = [20.0, 20.0, 20.0];
        let tree = QuadNode::build(&positions, &[1.0; 3]).unwrap();
        let mut deltas = vec![Vec2::ZERO; 3];

        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            &positions,
            &radii,
            CollisionParams {
                strength: 0.8,
                max_distance_sq: 80.0 * 80.0,
            },
            &mut deltas,
        );

        assert!(deltas[0].x < 0.0);
        assert!(deltas[1].x > 0.0);
        assert_eq!(deltas[2], Vec2::ZERO);
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let positions = [vec2(0.0, 0.0), vec2(300.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 2];
        apply_link_springs(
            &[(0, 1)],
            &[100.0],
            &[1, 1],
            &positions,
            &mut velocities,
            LinkParams {
                strength: 1.0,
                alpha: 1.0,
            },
        );
        assert!(velocities[0].x > 0.0);
        assert!(velocities[1].x < 0.0);
    }

    #[test]
    fn pull_is_per_axis() {
        let pull = pull_towards(vec2(10.0, 10.0), Vec2::ZERO, vec2(0.1, 0.2), 0.5);
        assert!((pull.x + 0.5).abs() < 1e-6);
        assert!((pull.y + 1.0).abs() < 1e-6);
    }
}
