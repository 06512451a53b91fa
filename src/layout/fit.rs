use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn include_point(&self, point: (f32, f32)) -> BoundingBox {
        self.union(&BoundingBox::new(point.0, point.1, 0.0, 0.0))
    }
}

/// Accumulates the extent of placed geometry.
#[derive(Debug, Clone, Default)]
pub struct BoundsBuilder {
    bounds: Option<BoundingBox>,
}

impl BoundsBuilder {
    pub fn add_rect(&mut self, rect: BoundingBox) {
        self.bounds = Some(match self.bounds {
            Some(current) => current.union(&rect),
            None => rect,
        });
    }

    pub fn add_point(&mut self, point: (f32, f32)) {
        self.add_rect(BoundingBox::new(point.0, point.1, 0.0, 0.0));
    }

    /// Zero-sized box at the origin when nothing was added.
    pub fn finish(self) -> BoundingBox {
        self.bounds
            .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }
}

/// Maps diagram space to viewport space: `p * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub translate: (f32, f32),
    pub scale: f32,
}

impl ViewTransform {
    pub fn identity() -> Self {
        Self {
            translate: (0.0, 0.0),
            scale: 1.0,
        }
    }

    pub fn apply(&self, point: (f32, f32)) -> (f32, f32) {
        (
            point.0 * self.scale + self.translate.0,
            point.1 * self.scale + self.translate.1,
        )
    }

    pub fn to_svg_attr(&self) -> String {
        format!(
            "translate({:.4}, {:.4}) scale({:.6})",
            self.translate.0, self.translate.1, self.scale
        )
    }
}

/// Scale that fits `content` inside the viewport, or 1 when that is undefined.
pub fn fit_scale(content: &BoundingBox, viewport_width: f32, viewport_height: f32) -> f32 {
    let scale = (viewport_width / content.width).min(viewport_height / content.height);
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Centers `content` in the viewport at the largest uniform scale that fits.
pub fn fit_view(content: &BoundingBox, viewport_width: f32, viewport_height: f32) -> ViewTransform {
    let scale = fit_scale(content, viewport_width, viewport_height);
    let (cx, cy) = content.center();
    ViewTransform {
        translate: (
            viewport_width / 2.0 - cx * scale,
            viewport_height / 2.0 - cy * scale,
        ),
        scale,
    }
}
