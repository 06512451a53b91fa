//! Orthogonal edge routes between placed node boxes.
//!
//! Used by the dagre-backed engine, which only places nodes. Routes leave and
//! enter through the node sides facing the layout direction; edges between
//! nodes that overlap along the main axis go around through a channel below
//! (or right of) both nodes.

/// Fraction of the edge/node spacing used as loop and channel padding.
const ROUTING_PAD_RATIO: f32 = 0.25;
/// Hard clamp range for that padding.
const ROUTING_PAD_MIN: f32 = 12.0;
const ROUTING_PAD_MAX: f32 = 40.0;

const EPS: f32 = 1e-4;

/// Main axis along which ranks advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAxis {
    Horizontal,
    Vertical,
}

/// `(x, y, width, height)` of a placed node.
pub type Rect = (f32, f32, f32, f32);

pub fn routing_pad(edge_node_spacing: f32) -> f32 {
    (edge_node_spacing * ROUTING_PAD_RATIO).clamp(ROUTING_PAD_MIN, ROUTING_PAD_MAX)
}

/// Route from `from` to `to`, ending on the boundary of `to`.
pub fn route_orthogonal(from: Rect, to: Rect, axis: RouteAxis, edge_node_spacing: f32) -> Vec<(f32, f32)> {
    let pad = routing_pad(edge_node_spacing);
    match axis {
        RouteAxis::Horizontal => route_horizontal(from, to, pad),
        RouteAxis::Vertical => {
            // Route in a transposed frame so one implementation serves both axes.
            route_horizontal(transpose_rect(from), transpose_rect(to), pad)
                .into_iter()
                .map(|(x, y)| (y, x))
                .collect()
        }
    }
}

fn transpose_rect((x, y, w, h): Rect) -> Rect {
    (y, x, h, w)
}

fn route_horizontal(from: Rect, to: Rect, pad: f32) -> Vec<(f32, f32)> {
    let (fx, fy, fw, fh) = from;
    let (tx, ty, tw, th) = to;
    let from_cy = fy + fh / 2.0;
    let to_cy = ty + th / 2.0;

    if same_rect(from, to) {
        return route_self_loop(from, pad);
    }

    if tx >= fx + fw {
        // Target is to the right: right side -> left side with a mid elbow.
        let start = (fx + fw, from_cy);
        let end = (tx, to_cy);
        return elbow(start, end);
    }
    if tx + tw <= fx {
        // Target is to the left: left side -> right side.
        let start = (fx, from_cy);
        let end = (tx + tw, to_cy);
        return elbow(start, end);
    }

    // Overlapping ranks: leave from the bottom and enter from the bottom.
    let channel = (fy + fh).max(ty + th) + pad;
    let start = (fx + fw / 2.0, fy + fh);
    let end = (tx + tw / 2.0, ty + th);
    vec![start, (start.0, channel), (end.0, channel), end]
}

fn elbow(start: (f32, f32), end: (f32, f32)) -> Vec<(f32, f32)> {
    if (start.1 - end.1).abs() <= EPS {
        return vec![start, end];
    }
    let mid_x = (start.0 + end.0) / 2.0;
    vec![start, (mid_x, start.1), (mid_x, end.1), end]
}

fn same_rect(a: Rect, b: Rect) -> bool {
    (a.0 - b.0).abs() <= EPS
        && (a.1 - b.1).abs() <= EPS
        && (a.2 - b.2).abs() <= EPS
        && (a.3 - b.3).abs() <= EPS
}

/// Loop leaving the right side and re-entering from the top.
pub fn route_self_loop(node: Rect, pad: f32) -> Vec<(f32, f32)> {
    let (x, y, w, h) = node;
    let start = (x + w, y + h / 2.0);
    let p1 = (x + w + pad, y + h / 2.0);
    let p2 = (x + w + pad, y - pad);
    let p3 = (x + w / 2.0, y - pad);
    let end = (x + w / 2.0, y);
    vec![start, p1, p2, p3, end]
}

/// Drops duplicate points and interior points on straight runs.
pub fn compress_path(points: &[(f32, f32)]) -> Vec<(f32, f32)> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<(f32, f32)> = Vec::with_capacity(points.len());
    out.push(points[0]);
    for idx in 1..points.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = points[idx];
        if (curr.0 - prev.0).abs() <= EPS && (curr.1 - prev.1).abs() <= EPS {
            continue;
        }
        let next = points[idx + 1];
        let dx1 = curr.0 - prev.0;
        let dy1 = curr.1 - prev.1;
        let dx2 = next.0 - curr.0;
        let dy2 = next.1 - curr.1;
        if (dx1.abs() <= EPS && dx2.abs() <= EPS) || (dy1.abs() <= EPS && dy2.abs() <= EPS) {
            continue;
        }
        out.push(curr);
    }
    let last = points[points.len() - 1];
    let tail = out[out.len() - 1];
    if (last.0 - tail.0).abs() > EPS || (last.1 - tail.1).abs() > EPS || out.len() == 1 {
        out.push(last);
    }
    out
}
