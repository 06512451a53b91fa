use serde::Serialize;
use std::fmt::Write as _;

const EPS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathCommand {
    MoveTo((f32, f32)),
    LineTo((f32, f32)),
    /// Quadratic curve: control point, end point.
    QuadTo((f32, f32), (f32, f32)),
}

/// Stroke-ready path; color and width are applied by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoundedPath {
    pub commands: Vec<PathCommand>,
}

impl RoundedPath {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Appends one route section as its own subpath.
    pub fn push_section(&mut self, points: &[(f32, f32)], radius: f32) {
        self.commands.extend(round_polyline(points, radius));
    }

    pub fn to_svg_d(&self) -> String {
        let mut d = String::new();
        for command in &self.commands {
            if !d.is_empty() {
                d.push(' ');
            }
            let _ = match command {
                PathCommand::MoveTo((x, y)) => write!(d, "M {x:.2} {y:.2}"),
                PathCommand::LineTo((x, y)) => write!(d, "L {x:.2} {y:.2}"),
                PathCommand::QuadTo((cx, cy), (x, y)) => {
                    write!(d, "Q {cx:.2} {cy:.2} {x:.2} {y:.2}")
                }
            };
        }
        d
    }
}

/// `M`/`L` commands for a polyline with every interior corner rounded.
///
/// The radius at each corner is clamped to half of the shorter adjacent
/// segment so neighbouring curves never overlap.
pub fn round_polyline(points: &[(f32, f32)], radius: f32) -> Vec<PathCommand> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let mut commands = Vec::with_capacity(points.len() * 2);
    commands.push(PathCommand::MoveTo(first));
    if points.len() == 1 {
        return commands;
    }

    for window in points.windows(3) {
        let (prev, corner, next) = (window[0], window[1], window[2]);
        let in_len = distance(prev, corner);
        let out_len = distance(corner, next);
        let r = radius.min(in_len / 2.0).min(out_len / 2.0);
        if r <= EPS || is_straight(prev, corner, next) {
            commands.push(PathCommand::LineTo(corner));
            continue;
        }
        let entry = toward(corner, prev, in_len, r);
        let exit = toward(corner, next, out_len, r);
        commands.push(PathCommand::LineTo(entry));
        commands.push(PathCommand::QuadTo(corner, exit));
    }

    commands.push(PathCommand::LineTo(points[points.len() - 1]));
    commands
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Point `dist` along the segment `from -> to` of length `len`.
fn toward(from: (f32, f32), to: (f32, f32), len: f32, dist: f32) -> (f32, f32) {
    (
        from.0 + (to.0 - from.0) / len * dist,
        from.1 + (to.1 - from.1) / len * dist,
    )
}

fn is_straight(prev: (f32, f32), corner: (f32, f32), next: (f32, f32)) -> bool {
    let dx1 = corner.0 - prev.0;
    let dy1 = corner.1 - prev.1;
    let dx2 = next.0 - corner.0;
    let dy2 = next.1 - corner.1;
    let cross = dx1 * dy2 - dy1 * dx2;
    let dot = dx1 * dx2 + dy1 * dy2;
    cross.abs() <= EPS && dot >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_points_are_a_straight_line() {
        let commands = round_polyline(&[(0.0, 0.0), (40.0, 10.0)], 15.0);
        assert_eq!(
            commands,
            vec![
                PathCommand::MoveTo((0.0, 0.0)),
                PathCommand::LineTo((40.0, 10.0))
            ]
        );
        let mut path = RoundedPath::default();
        path.push_section(&[(0.0, 0.0), (40.0, 10.0)], 15.0);
        assert_eq!(path.to_svg_d(), "M 0.00 0.00 L 40.00 10.00");
    }

    #[test]
    fn corner_is_replaced_by_curve() {
        let commands = round_polyline(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)], 15.0);
        assert_eq!(
            commands,
            vec![
                PathCommand::MoveTo((0.0, 0.0)),
                PathCommand::LineTo((85.0, 0.0)),
                PathCommand::QuadTo((100.0, 0.0), (100.0, 15.0)),
                PathCommand::LineTo((100.0, 100.0)),
            ]
        );
    }

    #[test]
    fn radius_is_clamped_on_short_segments() {
        let commands = round_polyline(&[(0.0, 0.0), (10.0, 0.0), (10.0, 100.0)], 15.0);
        assert_eq!(commands[1], PathCommand::LineTo((5.0, 0.0)));
        assert_eq!(commands[2], PathCommand::QuadTo((10.0, 0.0), (10.0, 5.0)));
    }

    #[test]
    fn collinear_points_stay_lines() {
        let commands = round_polyline(&[(0.0, 0.0), (50.0, 0.0), (100.0, 0.0)], 15.0);
        assert!(
            commands
                .iter()
                .all(|c| !matches!(c, PathCommand::QuadTo(..)))
        );
    }

    #[test]
    fn sections_start_new_subpaths() {
        let mut path = RoundedPath::default();
        path.push_section(&[(0.0, 0.0), (10.0, 0.0)], 15.0);
        path.push_section(&[(20.0, 0.0), (30.0, 0.0)], 15.0);
        let moves = path
            .commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
    }
}
