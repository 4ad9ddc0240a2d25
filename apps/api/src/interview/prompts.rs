// Prompt constants for interview question generation.

/// Number of questions requested per job description.
pub const QUESTION_COUNT: usize = 3;

/// Question generation prompt. Replace `{job_description}` before sending.
pub const QUESTION_PROMPT_TEMPLATE: &str = "\
다음 채용공고를 기반으로 구직자의 역량을 평가할 수 있는 면접 질문 3개를 한국어로 생성하세요. \
각 질문은 한 문장으로 작성하고, \"1. 질문\" 형식의 번호 목록으로만 답하세요:

{job_description}";
