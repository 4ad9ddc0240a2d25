// Interview Question Generator
// Job description → three Korean interview questions, parsed out of free text
// and stored as the current question set for later TTS rendering.

pub mod generator;
pub mod handlers;
pub mod parser;
pub mod prompts;
