//! Prompt builders for judging and reference generation

use crate::provider::CompletionRequest;

const SIMILARITY_SYSTEM: &str = "你是一个严格的相似度判分助手。";
const REASONABLENESS_SYSTEM: &str = "你是一个严格的答案判分助手。";
const JUDGE_TEMPERATURE: f32 = 0.3;

const REFERENCE_SYSTEM: &str = "你是最常见的小红书用户回答者，请用小红书常见、不长篇大论的方式回答问题。你只需给出最常见的普通人会怎么答，不要写太多。";
const REFERENCE_BOT_NAME: &str = "简洁明了知乎用户";
const REFERENCE_TEMPERATURE: f32 = 0.6;

/// Similarity between one reference answer and the candidate
pub fn similarity(reference: &str, candidate: &str) -> CompletionRequest {
    CompletionRequest::user(format!(
        "AI的标准答案：{}\n用户的回答：{}\n请你用0到1的分数严格判定两者内容的相似度，1为完全相同，0为完全不同，只返回分数，不要解释。",
        reference, candidate
    ))
    .with_system(SIMILARITY_SYSTEM)
    .with_temperature(JUDGE_TEMPERATURE)
}

/// Reasonableness of the candidate as an answer to the question body
pub fn answer_reasonableness(question_body: &str, candidate: &str) -> CompletionRequest {
    CompletionRequest::user(format!(
        "问题：{}\n用户的回答：{}\n请你用0到1的分数严格判定用户回答的合理性，1为完全合理，0为完全不合理，只返回分数，不要解释。",
        question_body, candidate
    ))
    .with_system(REASONABLENESS_SYSTEM)
    .with_temperature(JUDGE_TEMPERATURE)
}

/// Reasonableness of a proposed question
pub fn question_reasonableness(title: &str, body: &str, category: &str) -> CompletionRequest {
    CompletionRequest::user(format!(
        "问题标题：{}\n问题内容：{}\n问题分类：{}\n请你用0到1的分数严格判定这个问题的合理性，1为完全合理，0为完全不合理，只返回分数，不要解释。",
        title, body, category
    ))
    .with_system(REASONABLENESS_SYSTEM)
    .with_temperature(JUDGE_TEMPERATURE)
}

/// Short "what would most people say" answer used as a reference
pub fn reference_answer(question_body: &str) -> CompletionRequest {
    CompletionRequest::user(question_body)
        .with_system(REFERENCE_SYSTEM)
        .with_assistant_name(REFERENCE_BOT_NAME)
        .with_temperature(REFERENCE_TEMPERATURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_prompt() {
        let req = similarity("坐船游漓江", "骑车去阳朔");
        assert!(req.prompt.starts_with("AI的标准答案：坐船游漓江\n用户的回答：骑车去阳朔\n"));
        assert!(req.prompt.contains("相似度"));
        assert_eq!(req.temperature, Some(0.3));
    }

    #[test]
    fn test_question_prompt_carries_category() {
        let req = question_reasonableness("标题", "内容", "旅行 - 国内");
        assert!(req.prompt.contains("问题分类：旅行 - 国内\n"));
        assert!(req.prompt.contains("合理性"));
    }

    #[test]
    fn test_reference_prompt_is_the_body() {
        let req = reference_answer("桂林三天怎么玩？");
        assert_eq!(req.prompt, "桂林三天怎么玩？");
        assert_eq!(req.temperature, Some(0.6));
        assert_eq!(req.assistant_name.as_deref(), Some(REFERENCE_BOT_NAME));
    }
}
