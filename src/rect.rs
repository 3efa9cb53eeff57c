use cgmath::*;
use serde::*;

/// An axis-aligned pixel region, `start` inclusive and `end` exclusive.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Rect<T> {
    pub start: Point2<T>,
    pub end: Point2<T>,
}

impl<T> Rect<T> {
    pub fn new(start: Point2<T>, end: Point2<T>) -> Self {
        Self { start, end }
    }
}

impl<T: BaseNum> Rect<T> {
    pub fn with_size(start: Point2<T>, size: Vector2<T>) -> Self {
        Self { start, end: start + size }
    }

    /// Returns the size of the `Rect`
    pub fn size(&self) -> Vector2<T> {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_end_minus_start() {
        let rect = Rect::with_size(Point2::new(2, 3), vec2(4, 5));
        assert_eq!(rect.end, Point2::new(6, 8));
        assert_eq!(rect.size(), vec2(4, 5));
    }

    #[test]
    fn deserializes_from_corners() {
        let rect: Rect<i32> = serde_json::from_str(r#"{"start":{"x":0,"y":0},"end":{"x":16,"y":9}}"#).unwrap();
        assert_eq!(rect.size(), vec2(16, 9));
    }
}
