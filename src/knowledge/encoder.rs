/// Dimension of every vector produced by [`MathFeatureEncoder`].
pub const VECTOR_DIM: usize = 384;

const SYMBOLS: [char; 11] = ['+', '-', '*', '/', '=', '^', '√', 'π', 'θ', 'α', 'β'];

const TOPIC_OFFSET: usize = 50;
// algebra, calculus, geometry, trigonometry
const TOPICS: [&[&str]; 4] = [
    &["solve", "equation", "variable", "polynomial", "quadratic"],
    &["derivative", "integral", "limit", "differentiate", "integrate"],
    &["area", "volume", "angle", "triangle", "circle", "radius"],
    &["sin", "cos", "tan", "angle", "triangle"],
];

const WORD_OFFSET: usize = 100;
const MAX_WORDS: usize = 100;

/// Hand-written feature encoder for math questions.
///
/// Layout of the output vector:
///
/// | Dims      | Feature                                                 |
/// |-----------|---------------------------------------------------------|
/// | 0..11     | frequency of each math symbol relative to text length   |
/// | 50..54    | keyword hits for algebra, calculus, geometry, trig      |
/// | 100..200  | 1.0 per word position, first 100 words                  |
///
/// The result is L2-normalised. Topic keywords match as substrings, so
/// "using" counts towards trigonometry via "sin".
#[derive(Debug, Clone, Copy, Default)]
pub struct MathFeatureEncoder;

impl MathFeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn dim(&self) -> usize {
        VECTOR_DIM
    }

    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; VECTOR_DIM];
        if text.is_empty() {
            return vector;
        }

        let char_len = text.chars().count() as f32;
        for (i, symbol) in SYMBOLS.iter().enumerate() {
            let count = text.chars().filter(|c| c == symbol).count();
            vector[i] = count as f32 / char_len;
        }

        let lower = text.to_lowercase();
        for (i, keywords) in TOPICS.iter().enumerate() {
            let hits = keywords.iter().filter(|k| lower.contains(*k)).count();
            vector[TOPIC_OFFSET + i] = hits as f32;
        }

        for (i, _) in lower.split_whitespace().take(MAX_WORDS).enumerate() {
            vector[WORD_OFFSET + i] = 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }

        vector
    }
}
