// Prompt constants for resume summarization.

/// Replace `{text}` with the extracted resume text.
pub const SUMMARY_PROMPT_TEMPLATE: &str = "다음 내용을 한 문장으로 요약하세요:
{text}
요약:";
