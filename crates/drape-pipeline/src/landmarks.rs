//! Body landmarks and the target anchors derived from them.
//!
//! A landmark service reports a handful of anatomical points on the
//! body photograph. [`map_targets`] turns those into one target point
//! per [`AnchorName`], using body proportions (shoulder width, hip
//! width, torso height) where the garment side uses bounding-box
//! fractions.

use serde::{Deserialize, Serialize};

use crate::anchor::{ANCHOR_COUNT, AnchorName, AnchorSet};
use crate::types::Point;

/// Anatomical points detected on a body photograph, in pixel
/// coordinates of that photograph.
///
/// The four torso points are required. Elbows and wrists are carried
/// when the service reports them but do not influence the fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyLandmarks {
    pub left_shoulder: Point,
    pub right_shoulder: Point,
    pub left_hip: Point,
    pub right_hip: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_elbow: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_elbow: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_wrist: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_wrist: Option<Point>,
}

impl BodyLandmarks {
    /// Landmarks with only the four required torso points.
    #[must_use]
    pub const fn torso(
        left_shoulder: Point,
        right_shoulder: Point,
        left_hip: Point,
        right_hip: Point,
    ) -> Self {
        Self {
            left_shoulder,
            right_shoulder,
            left_hip,
            right_hip,
            left_elbow: None,
            right_elbow: None,
            left_wrist: None,
            right_wrist: None,
        }
    }

    /// Horizontal distance between the shoulders.
    #[must_use]
    pub fn shoulder_width(&self) -> f64 {
        (self.right_shoulder.x - self.left_shoulder.x).abs()
    }

    /// Horizontal distance between the hips.
    #[must_use]
    pub fn hip_width(&self) -> f64 {
        (self.right_hip.x - self.left_hip.x).abs()
    }

    /// Vertical distance from the left shoulder to the left hip.
    #[must_use]
    pub fn torso_height(&self) -> f64 {
        (self.left_hip.y - self.left_shoulder.y).abs()
    }

    /// Midpoint of the shoulders.
    #[must_use]
    pub fn shoulder_center(&self) -> Point {
        self.left_shoulder.midpoint(self.right_shoulder)
    }

    /// Midpoint of the hips.
    #[must_use]
    pub fn hip_center(&self) -> Point {
        self.left_hip.midpoint(self.right_hip)
    }

    /// Whether every reported coordinate is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [
            self.left_shoulder,
            self.right_shoulder,
            self.left_hip,
            self.right_hip,
        ]
        .into_iter()
        .chain(self.left_elbow)
        .chain(self.right_elbow)
        .chain(self.left_wrist)
        .chain(self.right_wrist)
        .all(Point::is_finite)
    }
}

/// Reference point a target coordinate is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    LeftShoulder,
    RightShoulder,
    ShoulderCenter,
    HipCenter,
}

impl Basis {
    fn resolve(self, body: &BodyLandmarks) -> Point {
        match self {
            Self::LeftShoulder => body.left_shoulder,
            Self::RightShoulder => body.right_shoulder,
            Self::ShoulderCenter => body.shoulder_center(),
            Self::HipCenter => body.hip_center(),
        }
    }
}

/// Body width a horizontal offset is proportional to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    ShoulderWidth,
    HipWidth,
}

impl Span {
    fn resolve(self, body: &BodyLandmarks) -> f64 {
        match self {
            Self::ShoulderWidth => body.shoulder_width(),
            Self::HipWidth => body.hip_width(),
        }
    }
}

/// How one anchor is placed on the body.
///
/// `x = x_basis.x + x_factor * x_span` and
/// `y = y_basis.y + y_factor * torso_height + y_offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRule {
    pub name: AnchorName,
    pub x_basis: Basis,
    pub x_factor: f64,
    pub x_span: Span,
    pub y_basis: Basis,
    pub y_factor: f64,
    pub y_offset: f64,
}

impl TargetRule {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        name: AnchorName,
        x_basis: Basis,
        x_factor: f64,
        x_span: Span,
        y_basis: Basis,
        y_factor: f64,
        y_offset: f64,
    ) -> Self {
        Self {
            name,
            x_basis,
            x_factor,
            x_span,
            y_basis,
            y_factor,
            y_offset,
        }
    }

    /// Position of this rule's anchor on `body`.
    #[must_use]
    pub fn place(&self, body: &BodyLandmarks) -> Point {
        let x = self
            .x_factor
            .mul_add(self.x_span.resolve(body), self.x_basis.resolve(body).x);
        let y = self
            .y_factor
            .mul_add(body.torso_height(), self.y_basis.resolve(body).y)
            + self.y_offset;
        Point::new(x, y)
    }
}

/// Shoulders are pushed outward by this fraction of shoulder width so
/// the garment has room to drape.
pub const SHOULDER_EXTEND: f64 = 0.15;

/// Vertical pixel offset of the shoulder anchors from the detected
/// shoulder joints (negative is up).
pub const SHOULDER_OFFSET_Y: f64 = -10.0;

const NECK_ROW: f64 = -0.05;
const CHEST_ROW: f64 = 0.20;
const WAIST_ROW: f64 = 0.60;
const HEM_ROW: f64 = 0.10;

/// Placement of every anchor on the body, in canonical order.
#[rustfmt::skip]
pub const TARGET_RULES: [TargetRule; ANCHOR_COUNT] = {
    use AnchorName as A;
    use Basis::{HipCenter, LeftShoulder, RightShoulder, ShoulderCenter};
    use Span::{HipWidth, ShoulderWidth};
    [
        TargetRule::new(A::LeftShoulder, LeftShoulder, -SHOULDER_EXTEND, ShoulderWidth, LeftShoulder, 0.0, SHOULDER_OFFSET_Y),
        TargetRule::new(A::NeckLeft, ShoulderCenter, -0.15, ShoulderWidth, ShoulderCenter, NECK_ROW, 0.0),
        TargetRule::new(A::NeckCenter, ShoulderCenter, 0.0, ShoulderWidth, ShoulderCenter, NECK_ROW, 0.0),
        TargetRule::new(A::NeckRight, ShoulderCenter, 0.15, ShoulderWidth, ShoulderCenter, NECK_ROW, 0.0),
        TargetRule::new(A::RightShoulder, RightShoulder, SHOULDER_EXTEND, ShoulderWidth, RightShoulder, 0.0, SHOULDER_OFFSET_Y),
        TargetRule::new(A::LeftUnderarm, LeftShoulder, -SHOULDER_EXTEND, ShoulderWidth, ShoulderCenter, CHEST_ROW, 0.0),
        TargetRule::new(A::LeftChest, ShoulderCenter, -0.25, ShoulderWidth, ShoulderCenter, CHEST_ROW, 0.0),
        TargetRule::new(A::CenterChest, ShoulderCenter, 0.0, ShoulderWidth, ShoulderCenter, CHEST_ROW, 0.0),
        TargetRule::new(A::RightChest, ShoulderCenter, 0.25, ShoulderWidth, ShoulderCenter, CHEST_ROW, 0.0),
        TargetRule::new(A::RightUnderarm, RightShoulder, SHOULDER_EXTEND, ShoulderWidth, ShoulderCenter, CHEST_ROW, 0.0),
        TargetRule::new(A::LeftWaist, HipCenter, -0.5, HipWidth, ShoulderCenter, WAIST_ROW, 0.0),
        TargetRule::new(A::CenterWaist, HipCenter, 0.0, HipWidth, ShoulderCenter, WAIST_ROW, 0.0),
        TargetRule::new(A::RightWaist, HipCenter, 0.5, HipWidth, ShoulderCenter, WAIST_ROW, 0.0),
        TargetRule::new(A::LeftHem, HipCenter, -0.55, HipWidth, HipCenter, HEM_ROW, 0.0),
        TargetRule::new(A::CenterHem, HipCenter, 0.0, HipWidth, HipCenter, HEM_ROW, 0.0),
        TargetRule::new(A::RightHem, HipCenter, 0.55, HipWidth, HipCenter, HEM_ROW, 0.0),
    ]
};

/// Position every anchor on the body described by `body`.
#[must_use]
pub fn map_targets(body: &BodyLandmarks) -> AnchorSet {
    log::debug!(
        "body shoulder_width={:.1} hip_width={:.1} torso_height={:.1}",
        body.shoulder_width(),
        body.hip_width(),
        body.torso_height()
    );
    TARGET_RULES
        .iter()
        .map(|rule| (rule.name, rule.place(body)))
        .collect()
}
