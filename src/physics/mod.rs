mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use log::debug;

use crate::graph::{Body, LayoutMode, NodeMeta, NodeRegistry, Reconciliation, SimNode};
use crate::util::stable_pair;
use forces::{
    ChargeParams, CollisionParams, LinkParams, accumulate_charge_for_node,
    accumulate_collision_pairs, apply_link_springs, pull_towards,
};
use quadtree::{QuadNode, collect_quadtree_cells};
pub use quadtree::QuadtreeCell;

pub const EXIT_SECONDS: f32 = 0.35;
const SEED_JITTER: f32 = 24.0;
const SEED_SPEED: f32 = 3.0;
const FIRST_INSTALL_ALPHA: f32 = 1.0;
const INSTALL_ALPHA: f32 = 0.7;
const MODE_SWITCH_ALPHA: f32 = 0.8;
const DRAG_ALPHA_TARGET: f32 = 0.3;

pub fn node_radius(weight: f32) -> f32 {
    8.0 + weight * 3.5
}

fn node_charge(weight: f32) -> f32 {
    0.7 + weight * 0.06
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    /// Many-body strength; negative repels.
    pub charge_strength: f32,
    pub theta: f32,
    pub center_strength: Vec2,
    pub collision_padding: f32,
    pub collision_strength: f32,
    pub link_base_distance: f32,
    pub link_weight_distance: f32,
    pub link_strength: f32,
    pub target_strength: f32,
    pub max_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            alpha_decay: 0.06,
            velocity_decay: 0.55,
            alpha_min: 0.001,
            charge_strength: -320.0,
            theta: 0.8,
            center_strength: vec2(0.04, 0.07),
            collision_padding: 10.0,
            collision_strength: 0.8,
            link_base_distance: 70.0,
            link_weight_distance: 6.0,
            link_strength: 1.0,
            target_strength: 0.3,
            max_speed: 60.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub alpha: f32,
    pub kinetic_energy: f32,
    pub running: bool,
}

/// A node removed from the graph, kept only for its shrink-out animation.
#[derive(Clone, Debug)]
pub struct ExitingNode {
    pub meta: NodeMeta,
    pub pos: Vec2,
    pub remaining: f32,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    charges: Vec<f32>,
    radii: Vec<f32>,
    deltas: Vec<Vec2>,
    rest_lengths: Vec<f32>,
    degrees: Vec<usize>,
}

pub struct ForceLayout {
    mode: LayoutMode,
    config: PhysicsConfig,
    registry: NodeRegistry,
    targets: Vec<Option<Vec2>>,
    exiting: Vec<ExitingNode>,
    alpha: f32,
    alpha_target: f32,
    dragging: Option<usize>,
    installed_once: bool,
    scratch: Scratch,
}

impl ForceLayout {
    pub fn new(mode: LayoutMode, config: PhysicsConfig) -> Self {
        Self {
            mode,
            config,
            registry: NodeRegistry::default(),
            targets: Vec::new(),
            exiting: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            dragging: None,
            installed_once: false,
            scratch: Scratch::default(),
        }
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn config(&self) -> PhysicsConfig {
        self.config
    }

    pub fn set_config(&mut self, config: PhysicsConfig) {
        if self.config != config {
            self.config = config;
            self.reheat(INSTALL_ALPHA);
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn exiting(&self) -> &[ExitingNode] {
        &self.exiting
    }

    pub fn is_running(&self) -> bool {
        self.alpha >= self.config.alpha_min || self.alpha_target >= self.config.alpha_min
    }

    /// Switches forces without touching bodies. `targets` are only read in
    /// organized mode.
    pub fn set_mode(&mut self, mode: LayoutMode, targets: Option<HashMap<String, Vec2>>) {
        self.mode = mode;
        self.targets = self.resolve_targets(targets.as_ref());
        self.reheat(MODE_SWITCH_ALPHA);
    }

    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    /// Swaps in a reconciled working set. New nodes are seeded around their
    /// parent, removed ones move to the exit list.
    pub fn install(&mut self, reconciliation: Reconciliation) {
        let links = reconciliation.link_indices();
        let Reconciliation {
            nodes: pending,
            tree_targets,
            removed,
            entered,
            ..
        } = reconciliation;

        for id in &removed {
            if let Some(node) = self.registry.get(id) {
                self.exiting.push(ExitingNode {
                    meta: node.meta.clone(),
                    pos: node.body.pos,
                    remaining: EXIT_SECONDS,
                });
            }
        }

        let dragged_id = self
            .dragging
            .and_then(|index| self.registry.nodes().get(index))
            .map(|node| node.meta.id.clone());

        let mut nodes: Vec<SimNode> = Vec::with_capacity(pending.len());
        for node in pending {
            let body = match node.body {
                Some(body) => body,
                None => seed_body(&node.meta.id, node.parent.map(|parent| nodes[parent].body.pos)),
            };
            nodes.push(SimNode {
                meta: node.meta,
                body,
                parent: node.parent,
                age: node.age,
            });
        }

        self.registry = NodeRegistry::new(nodes, links);
        self.dragging = dragged_id.and_then(|id| self.registry.index_of(&id));
        if self.dragging.is_none() {
            self.alpha_target = 0.0;
        }
        self.targets = self.resolve_targets(tree_targets.as_ref());

        let alpha = if self.installed_once {
            INSTALL_ALPHA
        } else {
            FIRST_INSTALL_ALPHA
        };
        self.installed_once = true;
        self.reheat(alpha);

        debug!(
            "installed {} nodes ({} new, {} removed), alpha {:.2}",
            self.registry.len(),
            entered.len(),
            removed.len(),
            self.alpha
        );
    }

    fn resolve_targets(&self, targets: Option<&HashMap<String, Vec2>>) -> Vec<Option<Vec2>> {
        match (self.mode, targets) {
            (LayoutMode::Organized, Some(targets)) => self
                .registry
                .nodes()
                .iter()
                .map(|node| targets.get(&node.meta.id).copied())
                .collect(),
            _ => vec![None; self.registry.len()],
        }
    }

    pub fn begin_drag(&mut self, id: &str) -> bool {
        let Some(index) = self.registry.index_of(id) else {
            return false;
        };
        let body = &mut self.registry.nodes_mut()[index].body;
        body.pin = Some(body.pos);
        self.dragging = Some(index);
        self.alpha_target = DRAG_ALPHA_TARGET;
        true
    }

    pub fn drag_to(&mut self, id: &str, pos: Vec2) {
        if let Some(index) = self.registry.index_of(id) {
            self.registry.nodes_mut()[index].body.pin = Some(pos);
        }
    }

    pub fn end_drag(&mut self, id: &str) {
        if let Some(index) = self.registry.index_of(id) {
            self.registry.nodes_mut()[index].body.pin = None;
        }
        self.dragging = None;
        self.alpha_target = 0.0;
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging
            .and_then(|index| self.registry.nodes().get(index))
            .map(|node| node.meta.id.as_str())
    }

    /// Advances animations by `dt` seconds and the simulation by one step
    /// if it is still warm.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        for node in self.registry.nodes_mut() {
            node.age += dt;
        }
        for node in &mut self.exiting {
            node.remaining -= dt;
        }
        self.exiting.retain(|node| node.remaining > 0.0);

        if !self.is_running() {
            self.alpha = 0.0;
            return TickReport {
                alpha: 0.0,
                kinetic_energy: 0.0,
                running: false,
            };
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.step();

        let kinetic_energy = self
            .registry
            .nodes()
            .iter()
            .map(|node| 0.5 * node.body.vel.length_sq())
            .sum();

        TickReport {
            alpha: self.alpha,
            kinetic_energy,
            running: self.is_running(),
        }
    }

    fn step(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        let node_count = self.registry.len();

        let config = self.config;
        let alpha = self.alpha;
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.charges.clear();
        scratch.radii.clear();
        let mut max_radius = 0.0_f32;
        for node in self.registry.nodes() {
            let radius = node_radius(node.meta.weight) + config.collision_padding;
            scratch.positions.push(node.body.pos);
            scratch.charges.push(node_charge(node.meta.weight));
            scratch.radii.push(radius);
            max_radius = max_radius.max(radius);
        }

        let mut velocities = self
            .registry
            .nodes()
            .iter()
            .map(|node| node.body.vel)
            .collect::<Vec<_>>();

        if self.mode == LayoutMode::Organic {
            let links = self.registry.links();
            scratch.degrees.clear();
            scratch.degrees.resize(node_count, 0);
            scratch.rest_lengths.clear();
            for &(source, target) in links {
                scratch.degrees[source] += 1;
                scratch.degrees[target] += 1;
                let weights = self.registry.nodes()[source].meta.weight
                    + self.registry.nodes()[target].meta.weight;
                scratch
                    .rest_lengths
                    .push(config.link_base_distance + weights * config.link_weight_distance);
            }
            apply_link_springs(
                links,
                &scratch.rest_lengths,
                &scratch.degrees,
                &scratch.positions,
                &mut velocities,
                LinkParams {
                    strength: config.link_strength,
                    alpha,
                },
            );

            if let Some(tree) = QuadNode::build(&scratch.positions, &scratch.charges) {
                let params = ChargeParams {
                    strength: -config.charge_strength,
                    theta: config.theta,
                    alpha,
                };
                for (index, velocity) in velocities.iter_mut().enumerate() {
                    accumulate_charge_for_node(
                        &tree,
                        index,
                        &scratch.positions,
                        &scratch.charges,
                        params,
                        velocity,
                    );
                }

                scratch.deltas.clear();
                scratch.deltas.resize(node_count, Vec2::ZERO);
                let reach = max_radius * 2.0;
                accumulate_collision_pairs(
                    &tree,
                    &tree,
                    true,
                    &scratch.positions,
                    &scratch.radii,
                    CollisionParams {
                        strength: config.collision_strength,
                        max_distance_sq: reach * reach,
                    },
                    &mut scratch.deltas,
                );
                for (velocity, delta) in velocities.iter_mut().zip(&scratch.deltas) {
                    *velocity += *delta;
                }
            }

            for (velocity, position) in velocities.iter_mut().zip(&scratch.positions) {
                *velocity += pull_towards(*position, Vec2::ZERO, config.center_strength, alpha);
            }
        } else {
            let strength = Vec2::splat(config.target_strength);
            for (index, velocity) in velocities.iter_mut().enumerate() {
                let target = self.targets.get(index).copied().flatten().unwrap_or_default();
                *velocity += pull_towards(scratch.positions[index], target, strength, alpha);
            }
        }

        let retain = 1.0 - config.velocity_decay;
        let max_speed_sq = config.max_speed * config.max_speed;
        for (node, velocity) in self.registry.nodes_mut().iter_mut().zip(velocities) {
            let body = &mut node.body;
            if let Some(pin) = body.pin {
                body.pos = pin;
                body.vel = Vec2::ZERO;
                continue;
            }

            let mut velocity = velocity * retain;
            let speed_sq = velocity.length_sq();
            if speed_sq > max_speed_sq {
                velocity *= config.max_speed / speed_sq.sqrt();
            }
            if !velocity.x.is_finite() || !velocity.y.is_finite() {
                velocity = Vec2::ZERO;
            }
            body.vel = velocity;
            body.pos += velocity;
        }
    }

    pub fn quadtree_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        cells.clear();
        let positions = self
            .registry
            .nodes()
            .iter()
            .map(|node| node.body.pos)
            .collect::<Vec<_>>();
        let charges = self
            .registry
            .nodes()
            .iter()
            .map(|node| node_charge(node.meta.weight))
            .collect::<Vec<_>>();
        if let Some(tree) = QuadNode::build(&positions, &charges) {
            collect_quadtree_cells(&tree, 0, cells);
        }
    }
}

fn seed_body(id: &str, parent_pos: Option<Vec2>) -> Body {
    let (jx, jy) = stable_pair(id);
    let jitter = vec2(jx, jy);
    Body {
        pos: parent_pos.unwrap_or_default() + jitter * SEED_JITTER,
        vel: jitter * SEED_SPEED,
        pin: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::reconcile;
    use crate::mindmap::{MindMapNode, NodeKind};

    fn tree(children: &[&str]) -> MindMapNode {
        let mut root = MindMapNode::new("root", "Root", NodeKind::Root, 10.0);
        root.children = children
            .iter()
            .map(|id| MindMapNode::new(*id, *id, NodeKind::Option, 4.0))
            .collect();
        root
    }

    fn installed(mode: LayoutMode, children: &[&str]) -> ForceLayout {
        let mut layout = ForceLayout::new(mode, PhysicsConfig::default());
        let reconciliation = reconcile(layout.registry(), &tree(children), mode);
        layout.install(reconciliation);
        layout
    }

    fn position(layout: &ForceLayout, id: &str) -> Vec2 {
        layout.registry().get(id).unwrap().body.pos
    }

    #[test]
    fn simulation_cools_down() {
        let mut layout = installed(LayoutMode::Organic, &["a", "b", "c", "d"]);
        assert_eq!(layout.alpha(), 1.0);

        let mut ticks = 0;
        while layout.tick(1.0 / 60.0).running {
            ticks += 1;
            assert!(ticks <= 120, "still running after {ticks} ticks");
        }
        assert!(ticks >= 100);
        assert!(!layout.tick(1.0 / 60.0).running);
        assert!(
            layout
                .registry()
                .nodes()
                .iter()
                .all(|node| node.body.pos.x.is_finite() && node.body.pos.y.is_finite())
        );
    }

    #[test]
    fn organic_layout_spreads_siblings() {
        let mut layout = installed(LayoutMode::Organic, &["a", "b", "c"]);
        for _ in 0..150 {
            layout.tick(1.0 / 60.0);
        }
        let a = position(&layout, "a");
        let b = position(&layout, "b");
        assert!((a - b).length() > node_radius(4.0));
    }

    #[test]
    fn reinstall_keeps_positions_and_seeds_new_children_near_parent() {
        let mut layout = installed(LayoutMode::Organic, &["a", "b"]);
        for _ in 0..40 {
            layout.tick(1.0 / 60.0);
        }
        let a_before = position(&layout, "a");
        let root_before = position(&layout, "root");

        let reconciliation = reconcile(layout.registry(), &tree(&["a", "c"]), LayoutMode::Organic);
        layout.install(reconciliation);

        assert_eq!(position(&layout, "a"), a_before);
        assert!((position(&layout, "c") - root_before).length() <= SEED_JITTER * 1.5);
        assert!(layout.registry().get("b").is_none());
        assert_eq!(layout.exiting().len(), 1);
        assert_eq!(layout.exiting()[0].meta.id, "b");
        assert!(layout.alpha() >= INSTALL_ALPHA);
    }

    #[test]
    fn exiting_nodes_expire() {
        let mut layout = installed(LayoutMode::Organic, &["a", "b"]);
        let reconciliation = reconcile(layout.registry(), &tree(&["a"]), LayoutMode::Organic);
        layout.install(reconciliation);
        assert_eq!(layout.exiting().len(), 1);

        layout.tick(0.2);
        assert_eq!(layout.exiting().len(), 1);
        layout.tick(0.2);
        assert!(layout.exiting().is_empty());
    }

    #[test]
    fn dragged_node_stays_pinned_and_keeps_simulation_warm() {
        let mut layout = installed(LayoutMode::Organic, &["a", "b"]);
        for _ in 0..200 {
            layout.tick(1.0 / 60.0);
        }
        assert!(!layout.is_running());

        assert!(layout.begin_drag("a"));
        let pin = vec2(400.0, -250.0);
        layout.drag_to("a", pin);
        for _ in 0..200 {
            assert!(layout.tick(1.0 / 60.0).running);
        }
        assert_eq!(position(&layout, "a"), pin);
        assert_eq!(layout.dragging(), Some("a"));

        layout.end_drag("a");
        assert!(layout.registry().get("a").unwrap().body.pin.is_none());
        assert_eq!(layout.dragging(), None);
        let mut ticks = 0;
        while layout.tick(1.0 / 60.0).running {
            ticks += 1;
            assert!(ticks < 200);
        }
    }

    #[test]
    fn mode_switch_reheats_and_pulls_towards_tree_targets() {
        let mut layout = installed(LayoutMode::Organic, &["a", "b", "c"]);
        for _ in 0..200 {
            layout.tick(1.0 / 60.0);
        }
        let before = layout.registry().len();

        let targets = crate::graph::tree_targets(&tree(&["a", "b", "c"]));
        let distances_before = ["root", "a", "b", "c"]
            .map(|id| (position(&layout, id) - targets[id]).length());
        layout.set_mode(LayoutMode::Organized, Some(targets.clone()));
        assert_eq!(layout.mode(), LayoutMode::Organized);
        assert!(layout.alpha() >= MODE_SWITCH_ALPHA);
        assert_eq!(layout.registry().len(), before);

        for _ in 0..200 {
            layout.tick(1.0 / 60.0);
        }
        for (id, before) in ["root", "a", "b", "c"].into_iter().zip(distances_before) {
            let after = (position(&layout, id) - targets[id]).length();
            assert!(
                after <= before * 0.25 + 1.0,
                "{id} moved from {before} to {after} away from its target"
            );
        }
        assert!(position(&layout, "a").x > position(&layout, "root").x);
    }

    #[test]
    fn removing_the_dragged_node_releases_the_drag() {
        let mut layout = installed(LayoutMode::Organic, &["a", "b"]);
        assert!(layout.begin_drag("b"));
        let reconciliation = reconcile(layout.registry(), &tree(&["a"]), LayoutMode::Organic);
        layout.install(reconciliation);
        assert_eq!(layout.dragging(), None);

        let mut ticks = 0;
        while layout.tick(1.0 / 60.0).running {
            ticks += 1;
            assert!(ticks < 200);
        }
    }

    #[test]
    fn unknown_drag_is_ignored() {
        let mut layout = installed(LayoutMode::Organic, &["a"]);
        assert!(!layout.begin_drag("missing"));
        assert_eq!(layout.dragging(), None);
    }
}
