// Recommendation Orchestrator
// Retrieval-augmented job recommendation: vector search + structural formatting,
// with an optional generated narrative. All LLM calls go through llm_client.

pub mod format;
pub mod handlers;
pub mod prompts;
pub mod recommender;
