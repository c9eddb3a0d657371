//! Pass 4: variant simplification -- exact deduplication, then repeated
//! subsumption until no pair of variants can be merged.
//!
//! Variant `other` is subsumed by `master` when flipping some of master's
//! mandatory positions to optional and then dropping some optional
//! positions reproduces `other` exactly. Master is then replaced by the
//! generalized form and `other` is removed.

use crate::syntax::{SyntaxElement, SyntaxVariant};

/// Drop variants structurally equal to an earlier one, keeping order.
pub fn dedup(variants: &[SyntaxVariant]) -> Vec<SyntaxVariant> {
    let mut out: Vec<SyntaxVariant> = Vec::with_capacity(variants.len());
    for variant in variants {
        if !out.iter().any(|kept| kept.same_syntax(variant)) {
            out.push(variant.clone());
        }
    }
    out
}

/// Deduplicate and reduce a command's variants to a fixed point.
pub fn simplify(variants: &[SyntaxVariant]) -> Vec<SyntaxVariant> {
    // Slots are never reordered; a merged-away variant leaves `None`.
    let mut arena: Vec<Option<SyntaxVariant>> = dedup(variants).into_iter().map(Some).collect();

    while let Some((master, other, generalized)) = find_reduction(&arena) {
        arena[master] = Some(generalized);
        arena[other] = None;
    }

    arena.into_iter().flatten().collect()
}

/// First `(master, other)` pair in scan order where master subsumes other.
fn find_reduction(arena: &[Option<SyntaxVariant>]) -> Option<(usize, usize, SyntaxVariant)> {
    let live: Vec<(usize, &SyntaxVariant)> = arena
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| slot.as_ref().map(|v| (i, v)))
        .collect();
    for &(m, master) in &live {
        for &(o, other) in &live {
            if m == o {
                continue;
            }
            if let Some(generalized) = generalize_to_cover(master, other) {
                return Some((m, o, generalized));
            }
        }
    }
    None
}

/// The least-generalized form of `master` that can reproduce `other` by
/// dropping optional positions, if any.
///
/// Flip sets are ordered as bitmasks over master's mandatory positions, low
/// position = low bit; the smallest feasible mask wins. It is found greedily
/// from the last mandatory position down, keeping each one mandatory when a
/// cover still exists, so the search is polynomial in the variant length.
pub fn generalize_to_cover(master: &SyntaxVariant, other: &SyntaxVariant) -> Option<SyntaxVariant> {
    if other.elements.len() > master.elements.len() {
        return None;
    }
    // `None`: undecided; `Some(true)`: flipped to optional.
    let mut flips: Vec<Option<bool>> = master
        .elements
        .iter()
        .map(|e| if e.optional { Some(false) } else { None })
        .collect();
    if !covers(&master.elements, &flips, &other.elements) {
        return None;
    }
    for i in (0..flips.len()).rev() {
        if flips[i].is_none() {
            flips[i] = Some(false);
            if !covers(&master.elements, &flips, &other.elements) {
                flips[i] = Some(true);
            }
        }
    }

    let generalized = master
        .elements
        .iter()
        .zip(&flips)
        .map(|(element, flip)| match flip {
            Some(true) => element.with_optional(true),
            _ => element.clone(),
        })
        .collect();
    Some(SyntaxVariant::new(generalized, master.file.clone()))
}

/// Whether some choice of the undecided flips, followed by dropping optional
/// positions, turns `master` into exactly `other`.
fn covers(master: &[SyntaxElement], flips: &[Option<bool>], other: &[SyntaxElement]) -> bool {
    // reach[j]: other[j..] is reproducible from the master suffix seen so far.
    let mut reach = vec![false; other.len() + 1];
    reach[other.len()] = true;
    for (element, flip) in master.iter().zip(flips).rev() {
        let candidates = match flip {
            Some(true) => vec![element.with_optional(true)],
            Some(false) => vec![element.clone()],
            None => vec![element.clone(), element.with_optional(true)],
        };
        reach = (0..=other.len())
            .map(|j| {
                candidates.iter().any(|c| {
                    (c.optional && reach[j])
                        || (j < other.len() && *c == other[j] && reach[j + 1])
                })
            })
            .collect();
    }
    reach[0]
}
