//! Reorder planning shared by catalog and record moves.
//!
//! Both the tag catalogs (dense `ord`) and the record engine (dense
//! `position`) move rows the same way: adjacent swaps for step moves,
//! detach-and-reinsert for absolute moves. The planners here work on
//! row indices only; callers apply the plan to their own cache and
//! backing store.

/// A step-move plan: the adjacent swaps to perform, in order, and the
/// selection's new indices (ascending).
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ShiftPlan {
    /// Each entry swaps the rows at the two indices; the lower index is
    /// always first.
    pub swaps: Vec<(usize, usize)>,
    pub new_indices: Vec<usize>,
}

/// Plan moving each selected row one step up (`delta < 0`) or down.
///
/// Rows are taken nearest-the-boundary first so one swap cannot
/// invalidate the next, and rows already packed against the boundary
/// stay put.
pub(crate) fn plan_shift(len: usize, selected: &[usize], delta: i32) -> ShiftPlan {
    let mut indices: Vec<usize> = selected.iter().copied().filter(|&i| i < len).collect();
    indices.sort_unstable();
    indices.dedup();

    let mut swaps = Vec::new();
    let mut new_indices = Vec::with_capacity(indices.len());

    if delta < 0 {
        let mut floor = 0usize;
        for &idx in &indices {
            if idx == floor {
                floor = idx + 1;
                new_indices.push(idx);
            } else {
                swaps.push((idx - 1, idx));
                new_indices.push(idx - 1);
            }
        }
    } else if len > 0 {
        let mut ceil = len - 1;
        for &idx in indices.iter().rev() {
            if idx == ceil {
                ceil = idx.saturating_sub(1);
                new_indices.push(idx);
            } else {
                swaps.push((idx, idx + 1));
                new_indices.push(idx + 1);
            }
        }
        new_indices.reverse();
    }

    ShiftPlan { swaps, new_indices }
}

/// An absolute-move plan.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RelocatePlan {
    /// The new sequence, expressed as old indices.
    pub order: Vec<usize>,
    /// Where the selected rows landed (a contiguous ascending run).
    pub new_indices: Vec<usize>,
    /// First index whose occupant changed; renumbering starts here.
    pub first_changed: usize,
}

/// Plan detaching the selected rows and reinserting them contiguously
/// at `target` (clamped). Selection order within the moved block is
/// their original relative order.
pub(crate) fn plan_relocate(len: usize, selected: &[usize], target: usize) -> RelocatePlan {
    let mut moved: Vec<usize> = selected.iter().copied().filter(|&i| i < len).collect();
    moved.sort_unstable();
    moved.dedup();

    let remaining: Vec<usize> = (0..len).filter(|i| !moved.contains(i)).collect();
    let target = target.min(remaining.len());

    let mut order = Vec::with_capacity(len);
    order.extend_from_slice(&remaining[..target]);
    order.extend_from_slice(&moved);
    order.extend_from_slice(&remaining[target..]);

    let first_changed = order
        .iter()
        .enumerate()
        .find(|&(ref slot, &old)| *slot != old)
        .map(|(slot, _)| slot)
        .unwrap_or(len);

    RelocatePlan {
        new_indices: (target..target + moved.len()).collect(),
        order,
        first_changed,
    }
}
