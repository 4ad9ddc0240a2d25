// Prompt constants for the recommendation pipeline.

/// Instructions for the "stuff documents" narrative job list. The retrieved
/// postings and then the profile follow, see `build_recommendation_prompt`.
pub const RECOMMENDATION_INSTRUCTIONS: &str = "\
You are an assistant for making a personalized job opening list. \
Use the following pieces of retrieved context to make the list. \
The retrieved context is a set of job openings. \
Summarize each job opening into a sublist of up to three items. \
If there is no context, apologize that you cannot find job openings. \
Answer in Korean.";

/// Separator between stuffed documents.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";
