//! Item value type and tile-layer classification
//!
//! Items carry their own classification and flags so the core never needs
//! the external type catalog: the entity factory bakes catalog data into the
//! item at construction time.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, WorldError};
use crate::core::types::ItemTypeId;

/// Which tile layer an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// At most one per tile, always lowest
    Ground,
    /// Drawn directly above ground (borders, ladders)
    StayOnTop,
    /// Drawn below creatures (carpets, open doors)
    StayOnBottom,
    /// Regular movable items, topmost layer
    Down,
}

/// Derived tile properties contributed by an item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFlags {
    pub blocks_walk: bool,
    pub blocks_sight: bool,
}

/// A single item (or cumulative stack entry) on a tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub type_id: ItemTypeId,
    pub kind: ItemKind,
    pub flags: ItemFlags,
    /// Units in this entry; 1 for non-cumulative items
    pub amount: u16,
    /// Per-type stack maximum; None for non-cumulative items
    pub max_amount: Option<u16>,
}

impl Item {
    pub fn new(type_id: ItemTypeId, kind: ItemKind, flags: ItemFlags) -> Self {
        Self {
            type_id,
            kind,
            flags,
            amount: 1,
            max_amount: None,
        }
    }

    /// A cumulative item carrying `amount` units, merging up to `max_amount`
    ///
    /// Both counts must be positive; a stack maximum of zero could never
    /// hold its own contents.
    pub fn cumulative(type_id: ItemTypeId, amount: u16, max_amount: u16) -> Result<Self> {
        if amount == 0 {
            return Err(WorldError::ZeroAmount);
        }
        if max_amount == 0 {
            return Err(WorldError::WrongKind(
                "cumulative item with zero stack maximum".into(),
            ));
        }
        Ok(Self {
            type_id,
            kind: ItemKind::Down,
            flags: ItemFlags::default(),
            amount,
            max_amount: Some(max_amount),
        })
    }

    pub fn is_cumulative(&self) -> bool {
        self.max_amount.is_some()
    }

    /// Units this entry can still absorb before hitting its maximum
    pub fn space_left(&self) -> u16 {
        self.max_amount.map_or(0, |max| max.saturating_sub(self.amount))
    }

    /// Same cumulative type, eligible for merging
    pub fn can_merge_with(&self, other: &Item) -> bool {
        self.is_cumulative() && other.is_cumulative() && self.type_id == other.type_id
    }

    /// Absorb units from `incoming`, returning the overflow (0 if all fit)
    pub fn absorb(&mut self, incoming: u16) -> u16 {
        let taken = incoming.min(self.space_left());
        self.amount += taken;
        incoming - taken
    }

    /// Split `amount` units out of this entry
    ///
    /// Returns the taken portion; `self` keeps the rest. Taking the full
    /// amount or more is a caller error (remove the whole entry instead).
    pub fn split(&mut self, amount: u16) -> Result<Item> {
        if amount == 0 {
            return Err(WorldError::ZeroAmount);
        }
        if !self.is_cumulative() {
            return Err(WorldError::WrongKind("split on non-cumulative item".into()));
        }
        if amount >= self.amount {
            return Err(WorldError::WrongKind(
                "split amount must be below the entry amount".into(),
            ));
        }
        self.amount -= amount;
        let mut taken = self.clone();
        taken.amount = amount;
        Ok(taken)
    }

    // Test/demo presets, in lieu of an external catalog.

    pub fn grass() -> Self {
        Item::new(ItemTypeId(101), ItemKind::Ground, ItemFlags::default())
    }

    pub fn stone_wall() -> Self {
        Item::new(
            ItemTypeId(102),
            ItemKind::StayOnTop,
            ItemFlags {
                blocks_walk: true,
                blocks_sight: true,
            },
        )
    }

    pub fn carpet() -> Self {
        Item::new(ItemTypeId(103), ItemKind::StayOnBottom, ItemFlags::default())
    }

    pub fn parcel() -> Self {
        Item::new(ItemTypeId(104), ItemKind::Down, ItemFlags::default())
    }

    pub fn gold(amount: u16) -> Self {
        Item::cumulative(ItemTypeId(105), amount, 100).expect("non-zero amount")
    }
}
