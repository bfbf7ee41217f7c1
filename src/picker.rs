use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use teloxide::types::User;

use crate::stats;
use crate::store::PickRecord;

/// Minimum interval between successful picks per chat, in seconds.
pub const COOLDOWN_SECS: f64 = 24.0 * 3600.0;

#[derive(Debug)]
pub enum PickOutcome {
    Picked { first: String, second: String },
    OnCooldown(Cooldown),
    NotEnoughCandidates,
}

/// Refused pick: the pair already chosen today (if the history has it) and
/// the remaining cooldown in whole hours.
#[derive(Debug, PartialEq)]
pub struct Cooldown {
    pub today: Option<(String, String)>,
    pub hours_left: u64,
}

/// Humans with a public handle; bots and admins without a username cannot
/// be mentioned and are not eligible.
pub fn eligible_candidates(admins: impl IntoIterator<Item = User>) -> Vec<String> {
    admins
        .into_iter()
        .filter(|user| !user.is_bot)
        .filter_map(|user| user.username)
        .collect()
}

/// Whether `now` is still within the cooldown started by the last pick.
pub fn cooldown_status(
    history: &[PickRecord],
    last_pick: Option<f64>,
    now: DateTime<Utc>,
) -> Option<Cooldown> {
    let last = last_pick?;
    let elapsed = stats::epoch(now) - last;
    if elapsed >= COOLDOWN_SECS {
        return None;
    }

    let today_start = stats::today_start(now);
    let today = history
        .iter()
        .rev()
        .find(|record| record.timestamp >= today_start)
        .map(|record| (record.first.clone(), record.second.clone()));

    // a negative elapsed (clock jumped backwards) casts to 0, reporting 24
    let hours_left = 24 - (elapsed / 3600.0).floor() as u64;

    Some(Cooldown { today, hours_left })
}

/// Samples two distinct candidates uniformly without replacement.
pub fn sample_pair<R: Rng + ?Sized>(candidates: &[String], rng: &mut R) -> Option<(String, String)> {
    if candidates.len() < 2 {
        return None;
    }

    let mut chosen = candidates.choose_multiple(rng, 2);
    let first = chosen.next()?.clone();
    let second = chosen.next()?.clone();
    Some((first, second))
}
