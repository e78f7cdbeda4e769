pub mod gemini;

use crate::deadline::Deadline;

pub use gemini::GeminiClient;

/// One candidate answer: its text segments, in order.
pub type Candidate = Vec<String>;

/// Generative text collaborator.
pub trait TextGenerator {
    fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        deadline: &Deadline,
    ) -> Result<Vec<Candidate>, String>;
}
