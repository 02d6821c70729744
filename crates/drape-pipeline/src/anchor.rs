//! Named garment anchors and the sets that hold them.
//!
//! Both the garment-side control points and the body-side targets use
//! the same fixed vocabulary of [`AnchorName`]s. An [`AnchorSet`] maps
//! each name to at most one point; the canonical order of
//! [`AnchorName::ALL`] is the order every downstream consumer iterates
//! in, so correspondence arrays built from two sets always line up.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Number of anchors in the canonical layout.
pub const ANCHOR_COUNT: usize = 16;

/// A named reference point on an upper-body garment.
///
/// "Left" and "right" follow the landmark service's convention; the
/// garment and body layouts use the same convention, so no mirroring
/// happens inside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorName {
    LeftShoulder,
    NeckLeft,
    NeckCenter,
    NeckRight,
    RightShoulder,
    LeftUnderarm,
    LeftChest,
    CenterChest,
    RightChest,
    RightUnderarm,
    LeftWaist,
    CenterWaist,
    RightWaist,
    LeftHem,
    CenterHem,
    RightHem,
}

impl AnchorName {
    /// Every anchor, in canonical order (top row first, left to right).
    pub const ALL: [Self; ANCHOR_COUNT] = [
        Self::LeftShoulder,
        Self::NeckLeft,
        Self::NeckCenter,
        Self::NeckRight,
        Self::RightShoulder,
        Self::LeftUnderarm,
        Self::LeftChest,
        Self::CenterChest,
        Self::RightChest,
        Self::RightUnderarm,
        Self::LeftWaist,
        Self::CenterWaist,
        Self::RightWaist,
        Self::LeftHem,
        Self::CenterHem,
        Self::RightHem,
    ];

    /// Position of this name in [`AnchorName::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The `snake_case` name used in files and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeftShoulder => "left_shoulder",
            Self::NeckLeft => "neck_left",
            Self::NeckCenter => "neck_center",
            Self::NeckRight => "neck_right",
            Self::RightShoulder => "right_shoulder",
            Self::LeftUnderarm => "left_underarm",
            Self::LeftChest => "left_chest",
            Self::CenterChest => "center_chest",
            Self::RightChest => "right_chest",
            Self::RightUnderarm => "right_underarm",
            Self::LeftWaist => "left_waist",
            Self::CenterWaist => "center_waist",
            Self::RightWaist => "right_waist",
            Self::LeftHem => "left_hem",
            Self::CenterHem => "center_hem",
            Self::RightHem => "right_hem",
        }
    }
}

impl fmt::Display for AnchorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial map from [`AnchorName`] to [`Point`].
///
/// Iteration always follows canonical order regardless of insertion
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnchorSet {
    slots: [Option<Point>; ANCHOR_COUNT],
}

impl AnchorSet {
    /// An empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [None; ANCHOR_COUNT],
        }
    }

    /// Set the point for `name`, returning the previous one.
    pub fn insert(&mut self, name: AnchorName, point: Point) -> Option<Point> {
        self.slots[name.index()].replace(point)
    }

    /// Drop `name` from the set, returning its point.
    pub fn remove(&mut self, name: AnchorName) -> Option<Point> {
        self.slots[name.index()].take()
    }

    /// The point for `name`, if present.
    #[must_use]
    pub const fn get(&self, name: AnchorName) -> Option<Point> {
        self.slots[name.index()]
    }

    /// Number of names present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether no names are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Present entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (AnchorName, Point)> + '_ {
        AnchorName::ALL
            .iter()
            .zip(&self.slots)
            .filter_map(|(&name, slot)| slot.map(|p| (name, p)))
    }
}

impl FromIterator<(AnchorName, Point)> for AnchorSet {
    fn from_iter<I: IntoIterator<Item = (AnchorName, Point)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, point) in iter {
            set.insert(name, point);
        }
        set
    }
}

/// One anchor present on both the garment and the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPair {
    /// Which anchor this is.
    pub name: AnchorName,
    /// Position on the garment raster.
    pub source: Point,
    /// Position on the body canvas.
    pub target: Point,
}

/// Matched garment/body anchors as a single ordered array.
///
/// Keeping source and target in one element means an index into this
/// array (e.g. a triangulation simplex) always addresses a consistent
/// pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Correspondences(Vec<AnchorPair>);

impl Correspondences {
    /// Intersect two sets by name, in canonical order.
    ///
    /// Names present in only one of the sets are dropped silently.
    #[must_use]
    pub fn between(source: &AnchorSet, target: &AnchorSet) -> Self {
        let pairs = AnchorName::ALL
            .iter()
            .filter_map(|&name| {
                Some(AnchorPair {
                    name,
                    source: source.get(name)?,
                    target: target.get(name)?,
                })
            })
            .collect();
        Self(pairs)
    }

    /// Build directly from pairs (mainly for tests and callers that
    /// supply their own anchors).
    #[must_use]
    pub const fn from_pairs(pairs: Vec<AnchorPair>) -> Self {
        Self(pairs)
    }

    /// The matched pairs.
    #[must_use]
    pub fn pairs(&self) -> &[AnchorPair] {
        &self.0
    }

    /// Number of matched pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing matched.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Source points, in pair order.
    pub fn sources(&self) -> impl Iterator<Item = Point> + '_ {
        self.0.iter().map(|p| p.source)
    }

    /// Target points, in pair order.
    pub fn targets(&self) -> impl Iterator<Item = Point> + '_ {
        self.0.iter().map(|p| p.target)
    }
}
