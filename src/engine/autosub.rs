//! Auto-substitution: repair a lineup whose starters recorded no minutes.
//!
//! Greedy and order-sensitive. Starters are scanned left to right; for each one
//! that did not play, bench slots are scanned in stored order and the first
//! bench athlete who played and keeps both the formation and the bench valid is
//! swapped in. No backtracking, no search for a better assignment.

use crate::domain::{AthleteId, Lineup, Position};
use crate::engine::formation::{is_valid_bench, is_valid_formation, FormationRule};
use serde::Serialize;
use std::collections::HashMap;

/// One bench-to-starter swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub off: AthleteId,
    pub on: AthleteId,
}

/// Repaired lineup together with the swaps that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub lineup: Lineup,
    pub substitutions: Vec<Substitution>,
}

fn played(minutes: &HashMap<AthleteId, u32>, id: AthleteId) -> bool {
    minutes.get(&id).copied().unwrap_or(0) > 0
}

/// New starter/bench arrays with `starters[i]` and `bench[j]` exchanged.
fn swapped(
    starters: &[AthleteId],
    bench: &[AthleteId],
    i: usize,
    j: usize,
) -> (Vec<AthleteId>, Vec<AthleteId>) {
    let mut next_starters = starters.to_vec();
    let mut next_bench = bench.to_vec();
    next_starters[i] = bench[j];
    next_bench[j] = starters[i];
    (next_starters, next_bench)
}

/// Apply auto-substitutions and re-resolve the armband.
///
/// Athletes missing from `minutes` are treated as not having played.
pub fn resolve(
    lineup: &Lineup,
    positions: &HashMap<AthleteId, Position>,
    minutes: &HashMap<AthleteId, u32>,
    rule: &FormationRule,
) -> Resolution {
    let mut starters = lineup.starters.clone();
    let mut bench = lineup.bench.clone();
    let mut substitutions = Vec::new();

    for i in 0..starters.len() {
        let off = starters[i];
        if played(minutes, off) {
            continue;
        }

        let repair = (0..bench.len())
            .filter(|&j| played(minutes, bench[j]))
            .map(|j| (j, swapped(&starters, &bench, i, j)))
            .find(|(_, (s, b))| is_valid_formation(s, positions, rule) && is_valid_bench(b, positions));

        if let Some((j, (next_starters, next_bench))) = repair {
            substitutions.push(Substitution { off, on: bench[j] });
            starters = next_starters;
            bench = next_bench;
        }
    }

    let (captain, vice_captain) =
        resolve_armband(&starters, minutes, lineup.captain, lineup.vice_captain);

    Resolution {
        lineup: Lineup {
            starters,
            bench,
            captain,
            vice_captain,
        },
        substitutions,
    }
}

/// Captain and vice after substitutions. Both end up as playing starters, or unset.
pub fn resolve_armband(
    starters: &[AthleteId],
    minutes: &HashMap<AthleteId, u32>,
    captain: Option<AthleteId>,
    vice_captain: Option<AthleteId>,
) -> (Option<AthleteId>, Option<AthleteId>) {
    let playing_starter = |id: &AthleteId| starters.contains(id) && played(minutes, *id);
    let first_playing_except = |exclude: Option<AthleteId>| {
        starters
            .iter()
            .copied()
            .find(|id| played(minutes, *id) && Some(*id) != exclude)
    };

    if let Some(c) = captain.filter(playing_starter) {
        let vice = vice_captain
            .filter(|v| *v != c && playing_starter(v))
            .or_else(|| first_playing_except(Some(c)));
        return (Some(c), vice);
    }

    if let Some(v) = vice_captain.filter(playing_starter) {
        return (Some(v), first_playing_except(Some(v)));
    }

    let fallback = first_playing_except(None);
    (fallback, fallback.and_then(|c| first_playing_except(Some(c))))
}
