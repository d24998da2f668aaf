use model::AutonegCaps;
use privsep::EthtoolCmd;

// ethtool SUPPORTED_*/ADVERTISED_* bit positions this table consumes
// (linux/ethtool.h).
const SUPPORTED_10BASE_T_HALF: u32 = 1 << 0;
const SUPPORTED_10BASE_T_FULL: u32 = 1 << 1;
const SUPPORTED_100BASE_T_HALF: u32 = 1 << 2;
const SUPPORTED_100BASE_T_FULL: u32 = 1 << 3;
const SUPPORTED_1000BASE_T_HALF: u32 = 1 << 4;
const SUPPORTED_1000BASE_T_FULL: u32 = 1 << 5;

/// Maps an ethtool supported/advertising bitset into the IEEE 802.3 link
/// auto-negotiation encoding this workspace uses (section 4.3's "fixed
/// translation table").
pub fn translate_caps(ethtool_bits: u32) -> AutonegCaps {
    let mut caps = AutonegCaps::empty();
    if ethtool_bits & SUPPORTED_10BASE_T_HALF != 0 {
        caps |= AutonegCaps::MAU_10BASE_T;
    }
    if ethtool_bits & SUPPORTED_10BASE_T_FULL != 0 {
        caps |= AutonegCaps::MAU_10BASE_T_FD;
    }
    if ethtool_bits & SUPPORTED_100BASE_T_HALF != 0 {
        caps |= AutonegCaps::MAU_100BASE_TX;
    }
    if ethtool_bits & SUPPORTED_100BASE_T_FULL != 0 {
        caps |= AutonegCaps::MAU_100BASE_TX_FD;
    }
    if ethtool_bits & SUPPORTED_1000BASE_T_HALF != 0 {
        caps |= AutonegCaps::MAU_1000BASE_T;
    }
    if ethtool_bits & SUPPORTED_1000BASE_T_FULL != 0 {
        caps |= AutonegCaps::MAU_1000BASE_T_FD;
    }
    caps
}

/// Derives MAU supported/advertised bitsets and autonegotiation flags from
/// one `ethtool` result.
pub fn from_ethtool(cmd: &EthtoolCmd) -> (AutonegCaps, AutonegCaps, bool) {
    let supported = translate_caps(cmd.supported);
    let advertised = translate_caps(cmd.advertising);
    let autoneg_enabled = cmd.autoneg != 0;
    (supported, advertised, autoneg_enabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_a_gigabit_full_duplex_bit() {
        let caps = translate_caps(SUPPORTED_1000BASE_T_FULL);
        assert!(caps.contains(AutonegCaps::MAU_1000BASE_T_FD));
        assert!(!caps.contains(AutonegCaps::MAU_1000BASE_T));
    }

    #[test]
    fn translates_multiple_bits_independently() {
        let caps = translate_caps(SUPPORTED_10BASE_T_HALF | SUPPORTED_100BASE_T_FULL);
        assert!(caps.contains(AutonegCaps::MAU_10BASE_T));
        assert!(caps.contains(AutonegCaps::MAU_100BASE_TX_FD));
        assert!(!caps.contains(AutonegCaps::MAU_1000BASE_T));
    }

    #[test]
    fn unknown_bits_translate_to_empty() {
        assert_eq!(translate_caps(1 << 20), AutonegCaps::empty());
    }
}
