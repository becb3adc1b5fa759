use bitflags::bitflags;

use super::sig_num::SigId;
use crate::error::SimResult;

bitflags! {
    /// Signal set
    /// to record which signals are blocked or pending.
    /// bits carry no names of their own, the id space is configured at runtime
    #[derive(PartialEq, Eq, Debug, Copy, Clone)]
    pub struct SigSet: u64 {
        const _ = !0;
    }
}

pub type SigMask = SigSet;

impl SigSet {
    /// every id in the namespace
    pub fn full() -> Self {
        Self::all()
    }

    /// build a set from a list of ids
    pub fn from_sigs(sigs: &[SigId]) -> SimResult<Self> {
        let mut set = Self::empty();
        for sig in sigs {
            set.enable(*sig)?;
        }
        Ok(set)
    }

    pub fn enable(&mut self, sig: SigId) -> SimResult<()> {
        *self |= SigSet::from_bits_truncate(1 << sig.bit()?);
        Ok(())
    }

    pub fn disable(&mut self, sig: SigId) -> SimResult<()> {
        *self -= SigSet::from_bits_truncate(1 << sig.bit()?);
        Ok(())
    }

    pub fn contains_sig(&self, sig: SigId) -> bool {
        match sig.bit() {
            Ok(bit) => self.bits() & (1 << bit) != 0,
            Err(_) => false,
        }
    }

    pub fn is_disjoint(&self, other: SigSet) -> bool {
        (*self & other).is_empty()
    }

    /// lowest set bit, which is the next id in delivery-priority order
    pub fn try_fetch(&self) -> Option<SigId> {
        match self.is_empty() {
            true => None,
            false => Some(SigId::from_bit(self.bits().trailing_zeros())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn enable_disable_contains() {
        let mut set = SigSet::empty();
        set.enable(SigId::Standard(2)).unwrap();
        set.enable(SigId::RealTime(5)).unwrap();
        assert!(set.contains_sig(SigId::Standard(2)));
        assert!(set.contains_sig(SigId::RealTime(5)));
        assert!(!set.contains_sig(SigId::Standard(3)));

        set.disable(SigId::Standard(2)).unwrap();
        assert!(!set.contains_sig(SigId::Standard(2)));
        assert!(set.contains_sig(SigId::RealTime(5)));
    }

    #[test]
    fn unknown_id_is_rejected() {
        let mut set = SigSet::empty();
        assert_eq!(set.enable(SigId::Standard(0)), Err(SimError::UnknownSignalId));
        assert_eq!(set.enable(SigId::RealTime(64)), Err(SimError::UnknownSignalId));
        assert!(!set.contains_sig(SigId::Standard(0)));
    }

    #[test]
    fn fetch_prefers_lowest_bit() {
        let mut set = SigSet::empty();
        set.enable(SigId::RealTime(3)).unwrap();
        set.enable(SigId::RealTime(1)).unwrap();
        assert_eq!(set.try_fetch(), Some(SigId::RealTime(1)));

        set.enable(SigId::Standard(9)).unwrap();
        assert_eq!(set.try_fetch(), Some(SigId::Standard(9)));

        assert_eq!(SigSet::empty().try_fetch(), None);
    }

    #[test]
    fn full_and_disjoint() {
        let full = SigSet::full();
        assert!(full.contains_sig(SigId::Standard(1)));
        assert!(full.contains_sig(SigId::RealTime(31)));

        let a = SigSet::from_sigs(&[SigId::Standard(1)]).unwrap();
        let b = SigSet::from_sigs(&[SigId::Standard(2)]).unwrap();
        assert!(a.is_disjoint(b));
        assert!(!a.is_disjoint(a | b));
    }
}
