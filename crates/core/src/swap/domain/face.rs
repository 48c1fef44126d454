use ndarray::Array1;

/// Axis-aligned face box in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
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

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// A face reported by the engine's detector.
///
/// The embedding is the engine's identity vector; only its direction is
/// used here, for reference matching.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub bbox: BoundingBox,
    pub score: f32,
    pub embedding: Array1<f32>,
}

impl Face {
    pub fn new(bbox: BoundingBox, score: f32, embedding: Array1<f32>) -> Self {
        Self {
            bbox,
            score,
            embedding,
        }
    }

    pub fn area(&self) -> f32 {
        self.bbox.area()
    }

    /// Cosine distance (`1 - cos θ`) between two embeddings, in `[0, 2]`.
    ///
    /// Mismatched lengths and zero vectors are maximally distant.
    pub fn distance_to(&self, other: &Face) -> f32 {
        if self.embedding.len() != other.embedding.len() {
            return 2.0;
        }
        let norm_a = self.embedding.dot(&self.embedding).sqrt();
        let norm_b = other.embedding.dot(&other.embedding).sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 2.0;
        }
        let cosine = self.embedding.dot(&other.embedding) / (norm_a * norm_b);
        (1.0 - cosine).clamp(0.0, 2.0)
    }
}
