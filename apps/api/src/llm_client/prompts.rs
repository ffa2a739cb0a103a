// Cross-cutting prompt fragments used by the inference backend.
// Feature prompts (e.g. review instructions) live next to their feature.

/// Instruction sent with an image when transcribing it to text.
pub const IMAGE_TO_TEXT_INSTRUCTION: &str = "\
    Transcribe all text visible in this image exactly as written. \
    Preserve reading order and line breaks. \
    Do NOT summarize, translate, or add commentary. \
    If the image contains no text, respond with an empty message.";

/// Canned reply returned by chat calls made in test mode.
pub const TEST_MODE_REPLY: &str = "This is a test-mode response. No model was called.";

/// Canned transcription returned by image-to-text calls made in test mode.
pub const TEST_MODE_TRANSCRIPTION: &str = "Test-mode transcription.";
