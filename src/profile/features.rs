use super::types::PersonProfile;

/// Slot names, in the order the forest expects them.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["is_I", "is_S", "is_F", "is_P", "stress", "hrv"];

pub const FEATURE_COUNT: usize = 6;

/// Personality letters tested for slots 0 through 3.
const PERSONALITY_LETTERS: [char; 4] = ['I', 'S', 'F', 'P'];

/// Fixed-length input to the inference engine. The array type keeps the
/// slot count right by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(slots: [f64; FEATURE_COUNT]) -> Self {
        Self(slots)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_array(self) -> [f64; FEATURE_COUNT] {
        self.0
    }
}

pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
}

pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Case-sensitive letter tests on the personality code, then the
    /// (defaulted) stress and heart-rate-variation readings.
    pub fn encode(profile: &PersonProfile) -> FeatureVector {
        let mut slots = [0.0; FEATURE_COUNT];
        for (slot, letter) in slots.iter_mut().zip(PERSONALITY_LETTERS) {
            if profile.mbti.contains(letter) {
                *slot = 1.0;
            }
        }
        slots[4] = profile.stress();
        slots[5] = profile.hrv();
        FeatureVector(slots)
    }
}
