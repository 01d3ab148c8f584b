//! 21-point hand topology.
//!
//! Index 0 is the wrist; each finger then contributes four consecutive
//! points from its base towards the tip.

use handmetrics_types::Finger;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Fingertips, thumb first.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// `(base, joint, tip)` used to measure a finger's bend.
///
/// The thumb uses its CMC and MCP joints rather than the IP joint.
pub fn joint_triple(finger: Finger) -> (usize, usize, usize) {
    match finger {
        Finger::Thumb => (THUMB_CMC, THUMB_MCP, THUMB_TIP),
        Finger::Index => (INDEX_MCP, INDEX_PIP, INDEX_TIP),
        Finger::Middle => (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP),
        Finger::Ring => (RING_MCP, RING_PIP, RING_TIP),
        Finger::Pinky => (PINKY_MCP, PINKY_PIP, PINKY_TIP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handmetrics_types::FingertipPair;

    #[test]
    fn joint_triples_match_topology() {
        assert_eq!(joint_triple(Finger::Thumb), (1, 2, 4));
        assert_eq!(joint_triple(Finger::Index), (5, 6, 8));
        assert_eq!(joint_triple(Finger::Middle), (9, 10, 12));
        assert_eq!(joint_triple(Finger::Ring), (13, 14, 16));
        assert_eq!(joint_triple(Finger::Pinky), (17, 18, 20));
    }

    #[test]
    fn fingertip_pairs_are_consecutive_tips() {
        for (i, pair) in FingertipPair::ALL.iter().enumerate() {
            assert_eq!(pair.tips(), (FINGERTIPS[i], FINGERTIPS[i + 1]));
        }
    }
}
