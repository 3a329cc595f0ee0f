//! Debuff module - expiring status effects on the player clock
//!
//! Each active debuff is a record `{kind, expires_at_ms}`. Applying a kind
//! that is already active restarts its timer; effects never stack.
//! Expired records are reaped by the owner's tick, so reversion is always
//! observed by the player that carries the effect.

use arrayvec::ArrayVec;

use crate::types::DebuffKind;

const MAX_ACTIVE: usize = DebuffKind::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveDebuff {
    pub kind: DebuffKind,
    pub expires_at_ms: u64,
}

/// Set of currently active debuffs, at most one record per kind
#[derive(Debug, Clone, Default)]
pub struct DebuffSet {
    active: ArrayVec<ActiveDebuff, MAX_ACTIVE>,
}

impl DebuffSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `kind` until `now_ms + duration_ms`.
    ///
    /// Returns true when the kind was not active before (a new start),
    /// false when an existing record was refreshed.
    pub fn apply(&mut self, kind: DebuffKind, now_ms: u64, duration_ms: u32) -> bool {
        let expires_at_ms = now_ms + u64::from(duration_ms);
        if let Some(existing) = self.active.iter_mut().find(|d| d.kind == kind) {
            existing.expires_at_ms = expires_at_ms;
            return false;
        }
        self.active.push(ActiveDebuff {
            kind,
            expires_at_ms,
        });
        true
    }

    pub fn is_active(&self, kind: DebuffKind) -> bool {
        self.active.iter().any(|d| d.kind == kind)
    }

    /// Remove every record whose expiry is at or before `now_ms`
    pub fn reap(&mut self, now_ms: u64) -> ArrayVec<DebuffKind, MAX_ACTIVE> {
        let mut ended = ArrayVec::new();
        self.active.retain(|d| {
            if d.expires_at_ms <= now_ms {
                ended.push(d.kind);
                false
            } else {
                true
            }
        });
        ended
    }

    /// Time left on `kind`, None when inactive
    pub fn remaining_ms(&self, kind: DebuffKind, now_ms: u64) -> Option<u64> {
        self.active
            .iter()
            .find(|d| d.kind == kind)
            .map(|d| d.expires_at_ms.saturating_sub(now_ms))
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_then_reap_at_expiry() {
        let mut set = DebuffSet::new();
        assert!(set.apply(DebuffKind::Haste, 100, 5000));
        assert!(set.is_active(DebuffKind::Haste));

        assert!(set.reap(5099).is_empty());
        let ended = set.reap(5100);
        assert_eq!(ended.as_slice(), &[DebuffKind::Haste]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_reapply_refreshes_instead_of_stacking() {
        let mut set = DebuffSet::new();
        assert!(set.apply(DebuffKind::KeysInverted, 0, 5000));
        assert!(!set.apply(DebuffKind::KeysInverted, 3000, 5000));

        assert_eq!(set.len(), 1);
        assert_eq!(set.remaining_ms(DebuffKind::KeysInverted, 3000), Some(5000));
    }

    #[test]
    fn test_shorter_reapply_resets_timer() {
        let mut set = DebuffSet::new();
        set.apply(DebuffKind::Haste, 0, 20000);
        assert!(!set.apply(DebuffKind::Haste, 1000, 5000));
        assert_eq!(set.remaining_ms(DebuffKind::Haste, 1000), Some(5000));

        assert!(set.reap(5999).is_empty());
        assert_eq!(set.reap(6000).as_slice(), &[DebuffKind::Haste]);
    }

    #[test]
    fn test_kinds_expire_independently() {
        let mut set = DebuffSet::new();
        set.apply(DebuffKind::Haste, 0, 5000);
        set.apply(DebuffKind::RandomPieces, 0, 10000);

        assert_eq!(set.reap(6000).as_slice(), &[DebuffKind::Haste]);
        assert!(set.is_active(DebuffKind::RandomPieces));
        assert_eq!(set.remaining_ms(DebuffKind::Haste, 6000), None);
    }
}
