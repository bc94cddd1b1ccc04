//! Duration estimation and duration-targeted clip selection.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::Clip;

/// Estimated output length (ms) for clips played in sequence.
///
/// `sum(durations) - (n - 1) * overlap + delay`; an empty list yields `delay`.
pub fn estimate_duration<C: AsRef<Clip>>(clips: &[C], overlap_ms: f64, delay_ms: f64) -> f64 {
    let total: f64 = clips.iter().map(|c| c.as_ref().duration_ms()).sum();
    estimate_from_total(total, clips.len(), overlap_ms, delay_ms)
}

fn estimate_from_total(total_ms: f64, count: usize, overlap_ms: f64, delay_ms: f64) -> f64 {
    if count == 0 {
        return delay_ms;
    }
    total_ms - (count - 1) as f64 * overlap_ms + delay_ms
}

/// Pick a subset of clips whose estimated duration lands near `target_ms`.
///
/// This is a greedy fill followed by local search, not an exact solver:
///
/// 1. shuffle the candidates and append them until the estimate reaches the target;
/// 2. while the estimate is more than `tolerance_ms` away, add the unselected
///    clip (when short) or drop the selected clip (when long) that lands
///    closest to the target.
///
/// Refinement runs at most `n * n` rounds and stops early once within
/// tolerance or when the best move would not get closer. The selection never
/// shrinks below one clip, so any non-empty input yields a non-empty result.
pub fn select_clips_for_duration<'a, R: Rng + ?Sized>(
    clips: &'a [Clip],
    target_ms: f64,
    overlap_ms: f64,
    delay_ms: f64,
    tolerance_ms: f64,
    rng: &mut R,
) -> Vec<&'a Clip> {
    if clips.is_empty() {
        return Vec::new();
    }

    let search = Search {
        durations: clips.iter().map(|c| c.duration_ms()).collect(),
        overlap_ms,
        delay_ms,
        target_ms,
        tolerance_ms,
    };

    let mut order: Vec<usize> = (0..clips.len()).collect();
    order.shuffle(rng);

    // Greedy fill
    let mut selected: Vec<usize> = Vec::new();
    for &i in &order {
        selected.push(i);
        if search.estimate(&selected) >= target_ms {
            break;
        }
    }
    let mut unselected: Vec<usize> = order[selected.len()..].to_vec();

    let rounds = search.refine(&mut selected, &mut unselected, clips.len() * clips.len());

    log::debug!(
        "Selected {} of {} clips after {} refinement rounds, estimate {:.1}s for target {:.1}s",
        selected.len(),
        clips.len(),
        rounds,
        search.estimate(&selected) / 1000.0,
        target_ms / 1000.0
    );

    selected.into_iter().map(|i| &clips[i]).collect()
}

/// Local search state for [`select_clips_for_duration`], over clip indices.
struct Search {
    durations: Vec<f64>,
    overlap_ms: f64,
    delay_ms: f64,
    target_ms: f64,
    tolerance_ms: f64,
}

impl Search {
    fn estimate(&self, selected: &[usize]) -> f64 {
        let total: f64 = selected.iter().map(|&i| self.durations[i]).sum();
        estimate_from_total(total, selected.len(), self.overlap_ms, self.delay_ms)
    }

    fn distance(&self, selected: &[usize]) -> f64 {
        (self.estimate(selected) - self.target_ms).abs()
    }

    /// Candidate position in `pool` whose move lands closest to the target.
    fn best_move(&self, pool: &[usize], distance_after: impl Fn(usize) -> f64) -> Option<(usize, f64)> {
        pool.iter()
            .enumerate()
            .map(|(pos, &i)| (pos, distance_after(i)))
            .fold(None, |best: Option<(usize, f64)>, cand| match best {
                Some(b) if b.1 <= cand.1 => Some(b),
                _ => Some(cand),
            })
    }

    /// Add (when short) or drop (when long) one clip per round until within
    /// tolerance, no move gets closer, or `max_rounds` is spent. Never
    /// shrinks the selection below one clip. Returns the rounds taken.
    fn refine(&self, selected: &mut Vec<usize>, unselected: &mut Vec<usize>, max_rounds: usize) -> usize {
        for round in 0..max_rounds {
            let diff = self.estimate(selected) - self.target_ms;
            if diff.abs() <= self.tolerance_ms {
                return round;
            }

            if diff < 0.0 && !unselected.is_empty() {
                let best = self.best_move(&unselected[..], |i| {
                    let mut candidate = selected.clone();
                    candidate.push(i);
                    self.distance(&candidate)
                });
                match best {
                    Some((pos, d)) if d < diff.abs() => {
                        selected.push(unselected.remove(pos));
                    }
                    _ => return round,
                }
            } else if diff > 0.0 && selected.len() > 1 {
                let best = self.best_move(&selected[..], |i| {
                    let candidate: Vec<usize> = selected.iter().copied().filter(|&j| j != i).collect();
                    self.distance(&candidate)
                });
                match best {
                    Some((pos, d)) if d < diff.abs() => {
                        unselected.push(selected.remove(pos));
                    }
                    _ => return round,
                }
            } else {
                return round;
            }
        }
        max_rounds
    }
}
