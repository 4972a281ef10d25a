//! Puzzle block taxonomy.
//!
//! Blocks fall into four families:
//! - raw materials mined in phase 1 (calcium and water barrels)
//! - component parts assembled in phase 2 (radar and turret parts)
//! - flotsam that only gets in the way (empty barrels, moon rocks)
//! - derived types produced by pairing, which live on in the arcade
//!   game as moon base structures
//!
//! Each type keeps a stable numeric tag so boards can be dumped and
//! compared as plain integers, with `0` meaning an empty cell.

use serde::{Deserialize, Serialize};

use crate::arcade::StructureKind;
use crate::state::GameState;

/// A puzzle block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockType {
    /// Phase 1 raw material.
    CalciumBarrel,
    /// Phase 1 raw material.
    WaterBarrel,
    /// Phase 1 flotsam.
    EmptyBarrel,
    /// Phase 2 flotsam.
    MoonRocks,
    /// Phase 2 radar component.
    RadarBits,
    /// Phase 2 radar component.
    RadarDish,
    /// Derived: radar station.
    Radar,
    /// Phase 2 turret component.
    TurretBase,
    /// Phase 2 turret component.
    TurretAmmo,
    /// Derived: defence turret.
    Turret,
    /// Derived: slab of mooncrete.
    MooncreteSlab,
    /// Derived: moon base building.
    Building,
}

impl BlockType {
    /// Every block type, in tag order.
    pub const ALL: [BlockType; 12] = [
        BlockType::CalciumBarrel,
        BlockType::WaterBarrel,
        BlockType::EmptyBarrel,
        BlockType::MoonRocks,
        BlockType::RadarBits,
        BlockType::RadarDish,
        BlockType::Radar,
        BlockType::TurretBase,
        BlockType::TurretAmmo,
        BlockType::Turret,
        BlockType::MooncreteSlab,
        BlockType::Building,
    ];

    /// Blocks that fall in phase 1.
    pub const PHASE1: [BlockType; 2] = [BlockType::CalciumBarrel, BlockType::WaterBarrel];

    /// Blocks that fall in phase 2.
    pub const PHASE2: [BlockType; 4] = [
        BlockType::RadarBits,
        BlockType::RadarDish,
        BlockType::TurretBase,
        BlockType::TurretAmmo,
    ];

    /// Obstruction blocks with no pairing role.
    pub const FLOTSAM: [BlockType; 2] = [BlockType::EmptyBarrel, BlockType::MoonRocks];

    /// Stable numeric tag. Never zero; zero means an empty cell.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            BlockType::CalciumBarrel => 1,
            BlockType::WaterBarrel => 2,
            BlockType::EmptyBarrel => 3,
            BlockType::MoonRocks => 4,
            BlockType::RadarBits => 10,
            BlockType::RadarDish => 11,
            BlockType::Radar => 12,
            BlockType::TurretBase => 20,
            BlockType::TurretAmmo => 21,
            BlockType::Turret => 22,
            BlockType::MooncreteSlab => 30,
            BlockType::Building => 40,
        }
    }

    /// Look a block type up by its tag.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|block| block.tag() == tag)
    }

    /// Whether this block is flotsam.
    #[must_use]
    pub const fn is_flotsam(self) -> bool {
        matches!(self, BlockType::EmptyBarrel | BlockType::MoonRocks)
    }

    /// The arcade structure a derived block becomes, if any.
    #[must_use]
    pub const fn structure_kind(self) -> Option<StructureKind> {
        match self {
            BlockType::MooncreteSlab => Some(StructureKind::Mooncrete),
            BlockType::Radar => Some(StructureKind::Radar),
            BlockType::Turret => Some(StructureKind::Turret),
            BlockType::Building => Some(StructureKind::Building),
            _ => None,
        }
    }

    /// One-character glyph for ASCII dumps.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            BlockType::CalciumBarrel => 'c',
            BlockType::WaterBarrel => 'w',
            BlockType::EmptyBarrel => 'e',
            BlockType::MoonRocks => 'r',
            BlockType::RadarBits => 'b',
            BlockType::RadarDish => 'd',
            BlockType::Radar => 'R',
            BlockType::TurretBase => 't',
            BlockType::TurretAmmo => 'a',
            BlockType::Turret => 'T',
            BlockType::MooncreteSlab => 'M',
            BlockType::Building => 'B',
        }
    }

    /// Inverse of [`BlockType::glyph`].
    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        Self::ALL.into_iter().find(|block| block.glyph() == glyph)
    }

    /// Block types that fall during a phase, optionally with that phase's flotsam.
    ///
    /// Non-puzzle states have no palette.
    #[must_use]
    pub fn palette(state: GameState, include_flotsam: bool) -> Vec<BlockType> {
        let (parts, flotsam): (&[BlockType], BlockType) = match state {
            GameState::Phase1 => (&Self::PHASE1, BlockType::EmptyBarrel),
            GameState::Phase2 => (&Self::PHASE2, BlockType::MoonRocks),
            _ => return Vec::new(),
        };
        let mut palette = parts.to_vec();
        if include_flotsam {
            palette.push(flotsam);
        }
        palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_unique_and_nonzero() {
        let mut tags: Vec<u8> = BlockType::ALL.iter().map(|b| b.tag()).collect();
        assert!(tags.iter().all(|&t| t != 0));
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), BlockType::ALL.len());
    }

    #[test]
    fn test_tag_round_trip() {
        for block in BlockType::ALL {
            assert_eq!(BlockType::from_tag(block.tag()), Some(block));
            assert_eq!(BlockType::from_glyph(block.glyph()), Some(block));
        }
        assert_eq!(BlockType::from_tag(0), None);
    }

    #[test]
    fn test_palettes() {
        assert_eq!(
            BlockType::palette(GameState::Phase1, false),
            vec![BlockType::CalciumBarrel, BlockType::WaterBarrel]
        );
        assert!(BlockType::palette(GameState::Phase2, true).contains(&BlockType::MoonRocks));
        assert!(BlockType::palette(GameState::Phase3, true).is_empty());
    }

    #[test]
    fn test_structure_mapping() {
        assert_eq!(
            BlockType::MooncreteSlab.structure_kind(),
            Some(StructureKind::Mooncrete)
        );
        assert_eq!(BlockType::CalciumBarrel.structure_kind(), None);
        assert!(BlockType::FLOTSAM.iter().all(|b| b.is_flotsam()));
    }
}
