//! Per-user memory of recently contacted gossip partners.

use std::collections::VecDeque;

use diffuse_core::{Neighbours, UserId};
use smallvec::SmallVec;

/// Most recent partners of each user, newest first.
///
/// A user's window never holds duplicates and never grows beyond the
/// capacity passed to [`record`](RevisitWindow::record). Windows live in
/// memory only; a resumed run starts with empty windows.
#[derive(Clone, Debug, Default)]
pub struct RevisitWindow {
    windows: Vec<VecDeque<UserId>>,
}

impl RevisitWindow {
    /// Empty windows for `user_count` users.
    pub fn new(user_count: usize) -> Self {
        Self {
            windows: vec![VecDeque::new(); user_count],
        }
    }

    /// Drop every remembered partner.
    pub fn clear(&mut self) {
        self.windows.iter_mut().for_each(VecDeque::clear);
    }

    /// Grow to `user_count` users, keeping existing windows.
    pub fn ensure_users(&mut self, user_count: usize) {
        if self.windows.len() < user_count {
            self.windows.resize(user_count, VecDeque::new());
        }
    }

    /// Partners of `user`, newest first.
    pub fn recent(&self, user: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.windows
            .get(user.index())
            .into_iter()
            .flat_map(|w| w.iter().copied())
    }

    /// Whether `partner` is in `user`'s window.
    pub fn contains(&self, user: UserId, partner: UserId) -> bool {
        self.windows
            .get(user.index())
            .is_some_and(|w| w.contains(&partner))
    }

    /// `pool` minus `user`'s window, order preserved.
    pub fn filter(&self, user: UserId, pool: &[UserId]) -> Neighbours {
        pool.iter()
            .copied()
            .filter(|&v| !self.contains(user, v))
            .collect()
    }

    /// Members of `pool` eligible for `user`'s next draw.
    ///
    /// `pool` minus the window. When the window covers the whole pool it is
    /// relaxed from its oldest end, which leaves the least recent partner.
    pub fn candidates(&self, user: UserId, pool: &[UserId]) -> Neighbours {
        let fresh = self.filter(user, pool);
        if !fresh.is_empty() {
            return fresh;
        }
        let oldest = self
            .windows
            .get(user.index())
            .and_then(|w| w.iter().rev().find(|v| pool.contains(v)).copied());
        match oldest {
            Some(v) => std::iter::once(v).collect(),
            None => pool.iter().copied().collect(),
        }
    }

    /// Remember `partner` as `user`'s newest contact, keeping at most
    /// `capacity` entries.
    pub fn record(&mut self, user: UserId, partner: UserId, capacity: usize) {
        self.ensure_users(user.index() + 1);
        let w = &mut self.windows[user.index()];
        w.retain(|&v| v != partner);
        w.push_front(partner);
        w.truncate(capacity);
    }
}

/// Partners registered for each user during one iteration.
#[derive(Clone, Debug, Default)]
pub(crate) struct PartnerTable {
    partners: Vec<SmallVec<[UserId; 4]>>,
}

impl PartnerTable {
    pub(crate) fn reset(&mut self, user_count: usize) {
        self.partners.clear();
        self.partners.resize(user_count, SmallVec::new());
    }

    /// `to` receives from `from` this iteration.
    pub(crate) fn link(&mut self, from: UserId, to: UserId) {
        if from == to {
            return;
        }
        if let Some(list) = self.partners.get_mut(from.index()) {
            if !list.contains(&to) {
                list.push(to);
            }
        }
    }

    pub(crate) fn link_both(&mut self, a: UserId, b: UserId) {
        self.link(a, b);
        self.link(b, a);
    }

    pub(crate) fn of(&self, user: UserId) -> Vec<UserId> {
        self.partners
            .get(user.index())
            .map(|l| l.to_vec())
            .unwrap_or_default()
    }
}
