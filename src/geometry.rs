// Landmark geometry classifier: pure predicates over one hand landmark set.
// A missing landmark yields None, which callers treat as "not detected".
// See DESIGN.md: Landmark Geometry Classifier

use std::f32::consts::PI;

use crate::types::{HandLandmarkSet, LandmarkPoint};

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

/// The four long fingers. The thumb has its own horizontal test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub fn mcp(self) -> usize {
        match self {
            Finger::Index => INDEX_MCP,
            Finger::Middle => MIDDLE_MCP,
            Finger::Ring => RING_MCP,
            Finger::Pinky => PINKY_MCP,
        }
    }

    pub fn pip(self) -> usize {
        self.mcp() + 1
    }

    pub fn dip(self) -> usize {
        self.mcp() + 2
    }

    pub fn tip(self) -> usize {
        self.mcp() + 3
    }
}

/// Joint a fingertip is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Mcp,
    Pip,
}

impl Reference {
    fn index_for(self, finger: Finger) -> usize {
        match self {
            Reference::Mcp => finger.mcp(),
            Reference::Pip => finger.pip(),
        }
    }
}

/// Tip strictly above the reference joint (`y` grows downward).
pub fn is_extended(hand: &HandLandmarkSet, finger: Finger, reference: Reference) -> Option<bool> {
    let tip = hand.get(finger.tip())?;
    let base = hand.get(reference.index_for(finger))?;
    Some(tip.y < base.y)
}

/// Tip strictly below the reference joint.
pub fn is_curled(hand: &HandLandmarkSet, finger: Finger, reference: Reference) -> Option<bool> {
    let tip = hand.get(finger.tip())?;
    let base = hand.get(reference.index_for(finger))?;
    Some(tip.y > base.y)
}

/// Thumb folded across the palm: wrist and thumb tip on the same horizontal side of the thumb MCP.
pub fn is_thumb_curled(hand: &HandLandmarkSet, dead_zone: f32) -> Option<bool> {
    let wrist = hand.get(WRIST)?;
    let mcp = hand.get(THUMB_MCP)?;
    let tip = hand.get(THUMB_TIP)?;
    Some(thumb_projections_curled(
        wrist.x - mcp.x,
        tip.x - mcp.x,
        dead_zone,
    ))
}

/// Same-side rule on the two horizontal projections. Both inside the dead zone counts as same side.
pub fn thumb_projections_curled(wrist_side: f32, tip_side: f32, dead_zone: f32) -> bool {
    if wrist_side.abs() < dead_zone && tip_side.abs() < dead_zone {
        return true;
    }
    wrist_side * tip_side > 0.0
}

/// Distance between index and thumb tips in normalized frame units.
pub fn pinch_distance(hand: &HandLandmarkSet) -> Option<f32> {
    let index = hand.get(INDEX_TIP)?;
    let thumb = hand.get(THUMB_TIP)?;
    Some(Vec2::between(thumb, index).length())
}

/// Averaged horizontal lean of index and middle tips against their PIP joints.
pub fn horizontal_offset(hand: &HandLandmarkSet) -> Option<f32> {
    let index = hand.get(INDEX_TIP)?.x - hand.get(INDEX_PIP)?.x;
    let middle = hand.get(MIDDLE_TIP)?.x - hand.get(MIDDLE_PIP)?.x;
    Some((index + middle) / 2.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn sign(self) -> f32 {
        match self {
            ScrollDirection::Up => -1.0,
            ScrollDirection::Down => 1.0,
        }
    }
}

/// Where the index finger points and how far its last joint is bent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollIntent {
    pub direction: ScrollDirection,
    /// Radians between (tip - DIP) and (PIP - DIP).
    pub bend_angle: f32,
}

/// Scroll intent from the index distal segment.
///
/// `None` when the segment is too short to carry a direction, points mostly sideways,
/// or the bend angle is undefined.
pub fn scroll_intent(
    hand: &HandLandmarkSet,
    direction_threshold: f32,
    min_magnitude: f32,
) -> Option<ScrollIntent> {
    let tip = hand.get(INDEX_TIP)?;
    let dip = hand.get(INDEX_DIP)?;
    let segment = Vec2::between(dip, tip);
    let magnitude = segment.length();
    if magnitude < min_magnitude {
        return None;
    }

    let unit_y = segment.y / magnitude;
    let direction = if unit_y <= -direction_threshold {
        ScrollDirection::Up
    } else if unit_y >= direction_threshold {
        ScrollDirection::Down
    } else {
        return None;
    };

    Some(ScrollIntent {
        direction,
        bend_angle: bend_angle(hand)?,
    })
}

/// Angle at the index DIP between the tip and PIP segments, in [0, PI].
pub fn bend_angle(hand: &HandLandmarkSet) -> Option<f32> {
    let tip = hand.get(INDEX_TIP)?;
    let dip = hand.get(INDEX_DIP)?;
    let pip = hand.get(INDEX_PIP)?;
    angle_between(Vec2::between(dip, tip), Vec2::between(dip, pip))
}

/// Linear speed from bend angle: 0 at 0 rad, `max_speed` at PI.
pub fn scroll_speed(angle: f32, max_speed: f32) -> f32 {
    (angle.clamp(0.0, PI) / PI) * max_speed
}

fn angle_between(a: Vec2, b: Vec2) -> Option<f32> {
    let mag_a = a.length();
    let mag_b = b.length();
    if mag_a == 0.0 || mag_b == 0.0 {
        return None;
    }
    let cos = (a.dot(b) / (mag_a * mag_b)).clamp(-1.0, 1.0);
    Some(cos.acos())
}

#[derive(Debug, Clone, Copy)]
struct Vec2 {
    x: f32,
    y: f32,
}

impl Vec2 {
    fn between(from: LandmarkPoint, to: LandmarkPoint) -> Self {
        Vec2 {
            x: to.x - from.x,
            y: to.y - from.y,
        }
    }

    fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }
}
