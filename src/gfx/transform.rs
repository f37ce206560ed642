use super::math::Vec2;

/// Structured transform state for one element.
///
/// Effects that share an element each own a component and the surface only
/// ever sees the composed string, so leaving one effect never disturbs
/// another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate: Vec2,
    pub scale: f32,
    pub rotate_deg: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translate: Vec2::ZERO,
        scale: 1.0,
        rotate_deg: 0.0,
    };

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            translate: Vec2::new(x, y),
            ..Self::IDENTITY
        }
    }

    pub fn scaled(scale: f32) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn to_css(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if self.translate != Vec2::ZERO {
            parts.push(format!(
                "translate({}px, {}px)",
                round(self.translate.x),
                round(self.translate.y)
            ));
        }
        if self.scale != 1.0 {
            parts.push(format!("scale({})", round(self.scale)));
        }
        if self.rotate_deg != 0.0 {
            parts.push(format!("rotate({}deg)", round(self.rotate_deg)));
        }
        if parts.is_empty() {
            return "none".to_string();
        }
        parts.join(" ")
    }
}

fn round(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_renders_as_none() {
        assert_eq!(Transform::IDENTITY.to_css(), "none");
        assert!(Transform::default().is_identity());
    }

    #[test]
    fn components_compose_in_fixed_order() {
        let mut t = Transform::translate(12.5, -10.0);
        t.scale = 1.05;
        t.rotate_deg = 5.0;
        assert_eq!(t.to_css(), "translate(12.5px, -10px) scale(1.05) rotate(5deg)");

        t.scale = 1.0;
        assert_eq!(t.to_css(), "translate(12.5px, -10px) rotate(5deg)");
    }
}
