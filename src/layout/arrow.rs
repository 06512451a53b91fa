use serde::Serialize;

/// Filled triangle drawn past the end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arrowhead {
    /// Unit vector along the final route segment.
    pub direction: (f32, f32),
    pub tip: (f32, f32),
    pub left: (f32, f32),
    pub right: (f32, f32),
}

impl Arrowhead {
    pub fn points(&self) -> [(f32, f32); 3] {
        [self.tip, self.left, self.right]
    }

    pub fn to_svg_d(&self) -> String {
        format!(
            "M {:.2} {:.2} L {:.2} {:.2} L {:.2} {:.2} Z",
            self.tip.0, self.tip.1, self.left.0, self.left.1, self.right.0, self.right.1
        )
    }
}

/// Half-width of the arrow base. Logarithmic so heavy flows stay readable.
pub fn arrow_width(throughput: f32) -> f32 {
    (throughput.max(0.0) + 10.0).ln() * 2.0 + 5.0
}

/// Colored overlay stroke width for a flow of `throughput`.
pub fn stroke_width(throughput: f32) -> f32 {
    throughput.max(1.0).ln() * 3.5 + 2.0
}

/// Width of the dark underlay drawn behind the colored stroke.
pub fn outline_width(throughput: f32) -> f32 {
    stroke_width(throughput) + 3.0
}

/// Arrowhead for a route ending in `penultimate -> end`.
///
/// Returns `None` when the final segment has no direction (coincident points).
pub fn arrowhead(
    penultimate: (f32, f32),
    end: (f32, f32),
    throughput: f32,
    arrow_length: f32,
) -> Option<Arrowhead> {
    let v = (end.0 - penultimate.0, end.1 - penultimate.1);
    let len = v.0.hypot(v.1);
    if !len.is_finite() || len <= f32::EPSILON {
        return None;
    }
    let u = (v.0 / len, v.1 / len);
    let perp = (u.1, -u.0);
    let half = arrow_width(throughput);
    Some(Arrowhead {
        direction: u,
        tip: (end.0 + arrow_length * u.0, end.1 + arrow_length * u.1),
        left: (end.0 + half * perp.0, end.1 + half * perp.1),
        right: (end.0 - half * perp.0, end.1 - half * perp.1),
    })
}

/// Arrowhead for the last two points of a route section.
pub fn arrowhead_for_route(points: &[(f32, f32)], throughput: f32, arrow_length: f32) -> Option<Arrowhead> {
    match points {
        [.., penultimate, end] => arrowhead(*penultimate, *end, throughput, arrow_length),
        _ => None,
    }
}
