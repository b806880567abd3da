// Fixed field locations on the front of the Moroccan CIN.
// Coordinates are fractions of the preprocessed image size and assume an
// upright card of the current layout; there is no orientation detection.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionOfInterest {
    pub name: &'static str,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl RegionOfInterest {
    pub const fn new(name: &'static str, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        RegionOfInterest { name, x1, y1, x2, y2 }
    }

    /// Pixel rectangle `(x, y, width, height)` inside a `width` × `height`
    /// image. Never empty and never outside the image.
    pub fn to_pixels(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let px = |f: f32, size: u32| ((f.clamp(0.0, 1.0) * size as f32) as u32).min(size);
        let x1 = px(self.x1, width).min(width.saturating_sub(1));
        let y1 = px(self.y1, height).min(height.saturating_sub(1));
        let x2 = px(self.x2, width).max(x1 + 1);
        let y2 = px(self.y2, height).max(y1 + 1);
        (x1, y1, x2 - x1, y2 - y1)
    }
}

/// Birth date, middle right.
pub const BIRTH_DATE_REGION: RegionOfInterest = RegionOfInterest::new("birth_date", 0.56, 0.40, 0.82, 0.54);
/// Expiry date, bottom right.
pub const EXPIRY_DATE_REGION: RegionOfInterest = RegionOfInterest::new("expiry_date", 0.60, 0.88, 0.98, 0.98);
/// Card number after "N°", bottom left.
pub const DOCUMENT_NUMBER_REGION: RegionOfInterest = RegionOfInterest::new("document_number", 0.06, 0.86, 0.38, 0.95);
/// Two-line name block, mid left.
pub const NAMES_REGION: RegionOfInterest = RegionOfInterest::new("names", 0.38, 0.22, 0.70, 0.42);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_to_pixels() {
        let quarter = RegionOfInterest::new("quarter", 0.25, 0.5, 0.75, 1.0);
        assert_eq!(quarter.to_pixels(200, 100), (50, 50, 100, 50));

        let (x, y, w, h) = BIRTH_DATE_REGION.to_pixels(1000, 500);
        assert!((559..=560).contains(&x) && (199..=200).contains(&y));
        assert!((259..=261).contains(&w) && (69..=71).contains(&h));
    }

    #[test]
    fn test_region_never_empty() {
        let sliver = RegionOfInterest::new("sliver", 0.999, 0.999, 1.0, 1.0);
        let (x, y, w, h) = sliver.to_pixels(10, 10);
        assert!(w >= 1 && h >= 1);
        assert!(x + w <= 10 && y + h <= 10);
    }
}
