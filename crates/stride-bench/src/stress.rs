//! Allocation throughput with and without self-referential links.
//!
//! [`Reclaimer`] is a small reference-counted registry with a
//! trial-deletion cycle collector. Nodes are slots in a `Vec`; links
//! between them are [`NodeHandle`] indices, never owning pointers, so
//! a cycle is a bookkeeping fact the collector can find rather than a
//! leak in the Rust sense.
//!
//! [`CycleStressHarness::stress`] allocates nodes in a tight loop and
//! drops each external handle at once:
//!
//! - a [`NodeKind::Linear`] node's count reaches zero and its slot is
//!   freed on release;
//! - a [`NodeKind::Cyclic`] node still references itself, so release only
//!   marks it pending, and it survives until a collection pass runs.
//!
//! Whether passes run during the loop is decided by the
//! [`ReclamationPolicy`] argument.

use std::time::Duration;

use indexmap::IndexSet;
use stride_core::MonotonicClock;

use crate::probe::SystemClock;

/// Shape of the nodes a stress loop allocates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// No links. Freed by reference counting alone.
    Linear,
    /// Links to itself. Freed only by a collection pass.
    Cyclic,
}

/// Generational index of a node in a [`Reclaimer`].
///
/// Holding a handle does not keep a node alive; a stale handle resolves
/// to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    index: usize,
    generation: u32,
}

/// Payload of one registry slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StressNode {
    /// Arbitrary payload.
    pub value: u64,
    /// Outgoing reference, counted against the target.
    pub link: Option<NodeHandle>,
}

/// When automatic collection passes run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReclamationPolicy {
    /// Whether passes run automatically. Default: `true`.
    pub enabled: bool,
    /// Pending-node count that triggers a pass. Default: 700.
    pub threshold: usize,
}

impl ReclamationPolicy {
    /// Default pass threshold.
    pub const DEFAULT_THRESHOLD: usize = 700;

    /// Automatic passes at the default threshold.
    pub fn enabled() -> Self {
        Self::default()
    }

    /// No automatic passes; only explicit [`Reclaimer::collect`] calls.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for ReclamationPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug)]
struct Slot {
    node: Option<StressNode>,
    strong: usize,
    generation: u32,
}

/// Reference-counted node registry with a cycle collector.
#[derive(Debug)]
pub struct Reclaimer {
    slots: Vec<Slot>,
    free: Vec<usize>,
    pending: IndexSet<usize>,
    policy: ReclamationPolicy,
    live: usize,
    reclaimed: u64,
    collections: u64,
}

impl Reclaimer {
    /// Empty registry under `policy`.
    pub fn new(policy: ReclamationPolicy) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            pending: IndexSet::new(),
            policy,
            live: 0,
            reclaimed: 0,
            collections: 0,
        }
    }

    /// Store `value` with no link and one external reference.
    pub fn allocate(&mut self, value: u64) -> NodeHandle {
        let node = StressNode { value, link: None };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            slot.strong = 1;
            NodeHandle {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                node: Some(node),
                strong: 1,
                generation: 0,
            });
            NodeHandle {
                index: self.slots.len() - 1,
                generation: 0,
            }
        }
    }

    /// The node behind `handle`, if it is still live.
    pub fn get(&self, handle: NodeHandle) -> Option<&StressNode> {
        self.slot(handle).and_then(|s| s.node.as_ref())
    }

    fn slot(&self, handle: NodeHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index)
            .filter(|s| s.generation == handle.generation && s.node.is_some())
    }

    /// Point `from` at `to`, replacing any previous link. Returns `false`
    /// if either handle is stale.
    pub fn link(&mut self, from: NodeHandle, to: NodeHandle) -> bool {
        if self.slot(from).is_none() || self.slot(to).is_none() {
            return false;
        }
        self.slots[to.index].strong += 1;
        let previous = self.slots[from.index]
            .node
            .as_mut()
            .and_then(|n| n.link.replace(to));
        if let Some(old) = previous {
            self.release_index(old.index);
        }
        true
    }

    /// Drop one external reference to `handle`. Returns `false` if the
    /// handle is stale.
    ///
    /// A node whose count stays above zero becomes pending; with
    /// reclamation enabled, reaching the threshold runs a pass.
    pub fn release(&mut self, handle: NodeHandle) -> bool {
        if self.slot(handle).is_none() {
            return false;
        }
        if self.release_index(handle.index) {
            self.pending.insert(handle.index);
            if self.policy.enabled && self.pending.len() >= self.policy.threshold {
                self.collect();
            }
        }
        true
    }

    /// Decrement a count, freeing the node (and cascading through its
    /// link) at zero. Returns whether the node survived.
    fn release_index(&mut self, index: usize) -> bool {
        let mut stack = vec![index];
        let mut survived = true;
        while let Some(i) = stack.pop() {
            let slot = &mut self.slots[i];
            slot.strong -= 1;
            if slot.strong > 0 {
                continue;
            }
            if i == index {
                survived = false;
            }
            if let Some(target) = self.free_slot(i) {
                stack.push(target);
            }
        }
        survived
    }

    /// Empty slot `i`, returning its link target.
    fn free_slot(&mut self, i: usize) -> Option<usize> {
        let slot = &mut self.slots[i];
        let node = slot.node.take();
        slot.strong = 0;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(i);
        self.pending.swap_remove(&i);
        self.live -= 1;
        node.and_then(|n| n.link).map(|h| h.index)
    }

    /// Run one trial-deletion pass over the pending nodes and return how
    /// many were freed.
    ///
    /// Each pending node's count is reduced by the references it receives
    /// from other pending nodes. Nodes left above zero are referenced from
    /// outside and stay, along with everything they reach; the rest form
    /// unreachable garbage and are freed together.
    pub fn collect(&mut self) -> usize {
        self.collections += 1;
        let candidates: Vec<usize> = self.pending.iter().copied().collect();

        // Slot index -> position in `candidates`.
        let mut position = vec![None; self.slots.len()];
        for (p, &i) in candidates.iter().enumerate() {
            position[i] = Some(p);
        }
        let targets: Vec<Option<usize>> = candidates
            .iter()
            .map(|&i| self.link_target(i).and_then(|t| position[t]))
            .collect();

        let mut external: Vec<usize> = candidates.iter().map(|&i| self.slots[i].strong).collect();
        for &p in targets.iter().flatten() {
            external[p] -= 1;
        }

        let mut reachable = vec![false; candidates.len()];
        let mut stack: Vec<usize> = (0..candidates.len()).filter(|&p| external[p] > 0).collect();
        while let Some(p) = stack.pop() {
            if reachable[p] {
                continue;
            }
            reachable[p] = true;
            if let Some(next) = targets[p] {
                stack.push(next);
            }
        }

        let garbage: Vec<usize> = (0..candidates.len())
            .filter(|&p| !reachable[p])
            .map(|p| candidates[p])
            .collect();
        let mut is_garbage = vec![false; self.slots.len()];
        for &i in &garbage {
            is_garbage[i] = true;
        }
        let mut outside = Vec::new();
        for &i in &garbage {
            if let Some(target) = self.free_slot(i) {
                if !is_garbage[target] {
                    outside.push(target);
                }
            }
        }
        for target in outside {
            if self.slots[target].node.is_some() {
                self.release_index(target);
            }
        }

        let freed = garbage.len();
        self.reclaimed += freed as u64;
        tracing::debug!(
            candidates = candidates.len(),
            freed,
            pass = self.collections,
            "collection pass"
        );
        freed
    }

    fn link_target(&self, index: usize) -> Option<usize> {
        self.slots[index].node.and_then(|n| n.link).map(|h| h.index)
    }

    /// Nodes currently allocated.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Nodes released externally but kept alive by links.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Nodes freed by collection passes so far.
    pub fn reclaimed(&self) -> u64 {
        self.reclaimed
    }

    /// Collection passes run so far.
    pub fn collections(&self) -> u64 {
        self.collections
    }

    /// The policy in force.
    pub fn policy(&self) -> ReclamationPolicy {
        self.policy
    }
}

/// Result of one [`CycleStressHarness::stress`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StressOutcome {
    /// Duration of the allocation loop in seconds.
    pub elapsed_seconds: f64,
    /// Pending nodes when the loop ended, before the forced pass.
    pub pending_count: usize,
    /// Nodes freed by collection passes, the forced one included.
    pub reclaimed: u64,
    /// Automatic passes run during the loop.
    pub collections: u64,
    /// Nodes still allocated after the forced pass.
    pub live_after: usize,
}

/// A labelled stress configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StressScenario {
    /// Human-readable name.
    pub label: &'static str,
    /// Node shape.
    pub kind: NodeKind,
    /// Reclamation policy.
    pub policy: ReclamationPolicy,
}

/// Node count of the reference scenarios.
pub const REFERENCE_NODE_COUNT: usize = 5_000_000;

/// Linear with reclamation, cyclic with reclamation, cyclic without.
pub fn reference_scenarios() -> [StressScenario; 3] {
    [
        StressScenario {
            label: "linear / reference counting",
            kind: NodeKind::Linear,
            policy: ReclamationPolicy::enabled(),
        },
        StressScenario {
            label: "cyclic / collection enabled",
            kind: NodeKind::Cyclic,
            policy: ReclamationPolicy::enabled(),
        },
        StressScenario {
            label: "cyclic / collection disabled",
            kind: NodeKind::Cyclic,
            policy: ReclamationPolicy::disabled(),
        },
    ]
}

/// Times allocate-and-release loops on an injected clock.
#[derive(Clone, Debug, Default)]
pub struct CycleStressHarness<C: MonotonicClock = SystemClock> {
    clock: C,
}

impl<C: MonotonicClock> CycleStressHarness<C> {
    /// Harness timing with `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Allocate and immediately release `count` nodes of `kind`, then run
    /// a forced pass.
    ///
    /// Only the loop is timed. `pending_count` is read before the forced
    /// pass, so a disabled policy reports every cyclic node.
    pub fn stress(&self, kind: NodeKind, count: usize, policy: ReclamationPolicy) -> StressOutcome {
        let mut reclaimer = Reclaimer::new(policy);

        let start = self.clock.now();
        for i in 0..count {
            let node = reclaimer.allocate(i as u64);
            if kind == NodeKind::Cyclic {
                reclaimer.link(node, node);
            }
            reclaimer.release(node);
        }
        let elapsed: Duration = self.clock.since(start);

        let pending_count = reclaimer.pending();
        let collections = reclaimer.collections();
        reclaimer.collect();

        let outcome = StressOutcome {
            elapsed_seconds: elapsed.as_secs_f64(),
            pending_count,
            reclaimed: reclaimer.reclaimed(),
            collections,
            live_after: reclaimer.live(),
        };
        tracing::debug!(?kind, count, ?policy, ?outcome, "stress finished");
        outcome
    }
}

/// [`CycleStressHarness::stress`] on the system clock.
pub fn stress(kind: NodeKind, count: usize, policy: ReclamationPolicy) -> StressOutcome {
    CycleStressHarness::with_clock(SystemClock::new()).stress(kind, count, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Reclaimer ────────────────────────────────────────────────

    #[test]
    fn unlinked_node_frees_on_release() {
        let mut r = Reclaimer::new(ReclamationPolicy::disabled());
        let h = r.allocate(1);
        assert_eq!(r.get(h).map(|n| n.value), Some(1));
        assert!(r.release(h));
        assert_eq!(r.live(), 0);
        assert_eq!(r.pending(), 0);
        assert!(r.get(h).is_none());
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut r = Reclaimer::new(ReclamationPolicy::disabled());
        let h = r.allocate(1);
        r.release(h);
        let reused = r.allocate(2);
        assert!(!r.release(h));
        assert_eq!(r.get(reused).map(|n| n.value), Some(2));
    }

    #[test]
    fn self_link_keeps_node_pending() {
        let mut r = Reclaimer::new(ReclamationPolicy::disabled());
        let h = r.allocate(1);
        assert!(r.link(h, h));
        r.release(h);
        assert_eq!(r.live(), 1);
        assert_eq!(r.pending(), 1);
        assert_eq!(r.collect(), 1);
        assert_eq!(r.live(), 0);
    }

    #[test]
    fn two_node_cycle_is_collected() {
        let mut r = Reclaimer::new(ReclamationPolicy::disabled());
        let a = r.allocate(1);
        let b = r.allocate(2);
        r.link(a, b);
        r.link(b, a);
        r.release(a);
        r.release(b);
        assert_eq!(r.pending(), 2);
        assert_eq!(r.collect(), 2);
        assert_eq!(r.live(), 0);
    }

    #[test]
    fn externally_held_cycle_survives_collection() {
        let mut r = Reclaimer::new(ReclamationPolicy::disabled());
        let a = r.allocate(1);
        let b = r.allocate(2);
        r.link(a, b);
        r.link(b, a);
        r.release(a);
        // `b` still has its external handle, so `a` is reachable.
        assert_eq!(r.collect(), 0);
        assert_eq!(r.live(), 2);
        r.release(b);
        assert_eq!(r.collect(), 2);
    }

    #[test]
    fn freeing_garbage_drops_links_into_live_nodes() {
        let mut r = Reclaimer::new(ReclamationPolicy::disabled());
        let target = r.allocate(9);
        let cyc = r.allocate(1);
        r.link(cyc, cyc);
        let pointer = r.allocate(2);
        r.link(pointer, target);
        r.release(target);
        // `target` is now kept only by `pointer`.
        assert_eq!(r.live(), 3);
        r.release(pointer);
        assert_eq!(r.live(), 1);
        r.release(cyc);
        r.collect();
        assert_eq!(r.live(), 0);
    }

    #[test]
    fn threshold_triggers_pass() {
        let policy = ReclamationPolicy {
            enabled: true,
            threshold: 3,
        };
        let mut r = Reclaimer::new(policy);
        for i in 0..3 {
            let h = r.allocate(i);
            r.link(h, h);
            r.release(h);
        }
        assert_eq!(r.collections(), 1);
        assert_eq!(r.pending(), 0);
        assert_eq!(r.reclaimed(), 3);
    }

    // ── stress ───────────────────────────────────────────────────

    #[test]
    fn linear_nodes_leave_nothing_pending() {
        let out = stress(NodeKind::Linear, 10_000, ReclamationPolicy::enabled());
        assert_eq!(out.pending_count, 0);
        assert_eq!(out.collections, 0);
        assert_eq!(out.reclaimed, 0);
        assert_eq!(out.live_after, 0);
    }

    #[test]
    fn cyclic_nodes_are_collected_at_threshold() {
        let out = stress(NodeKind::Cyclic, 10_000, ReclamationPolicy::enabled());
        assert_eq!(out.collections, 14);
        assert_eq!(out.pending_count, 10_000 - 14 * 700);
        assert_eq!(out.reclaimed, 10_000);
        assert_eq!(out.live_after, 0);
    }

    #[test]
    fn disabled_policy_leaves_every_cyclic_node_pending() {
        let out = stress(NodeKind::Cyclic, 10_000, ReclamationPolicy::disabled());
        assert_eq!(out.pending_count, 10_000);
        assert_eq!(out.collections, 0);
        assert_eq!(out.reclaimed, 10_000);
        assert_eq!(out.live_after, 0);
    }

    #[test]
    fn reference_scenarios_cover_three_cases() {
        let kinds: Vec<_> = reference_scenarios()
            .iter()
            .map(|s| (s.kind, s.policy.enabled))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (NodeKind::Linear, true),
                (NodeKind::Cyclic, true),
                (NodeKind::Cyclic, false)
            ]
        );
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn forced_pass_always_empties_registry(
                count in 0usize..2_000,
                cyclic in any::<bool>(),
                enabled in any::<bool>(),
                threshold in 1usize..1_000,
            ) {
                let kind = if cyclic { NodeKind::Cyclic } else { NodeKind::Linear };
                let policy = ReclamationPolicy { enabled, threshold };
                let out = stress(kind, count, policy);
                prop_assert_eq!(out.live_after, 0);
                let bound = if enabled { threshold } else { count + 1 };
                prop_assert!(out.pending_count < bound);
                if cyclic {
                    prop_assert_eq!(out.reclaimed, count as u64);
                } else {
                    prop_assert_eq!(out.pending_count, 0);
                }
            }
        }
    }
}
