// file: src/summarizer/prompt.rs
// description: summarization prompt construction
// reference: https://ai.google.dev/gemini-api/docs/prompting-strategies

use crate::models::{DetailLevel, LanguageTag, SummaryRequest};

/// Rough prompt size in tokens, at four characters per token.
pub fn estimate_tokens(prompt: &str) -> usize {
    prompt.chars().count() / 4
}

pub fn detail_instruction(level: DetailLevel) -> Option<&'static str> {
    match level {
        DetailLevel::Low => Some("Keep it very brief, focusing only on the main purpose."),
        DetailLevel::Medium => None,
        DetailLevel::High => Some(
            "Provide a detailed analysis including functions, methods, classes, and their interactions.",
        ),
    }
}

pub fn build_prompt(request: &SummaryRequest<'_>) -> String {
    let language = request.language;
    let mut prompt = format!(
        "Provide an overview summary of the code in this {} file.\n\n",
        language
    );

    if let Some(instruction) = detail_instruction(request.options.detail_level) {
        prompt.push_str(instruction);
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "Keep the summary under {} characters.\n\
         Focus on what the code does, not how it's implemented.\n\n\
         Code to analyze:\n```{}\n{}\n```",
        request.options.max_length,
        fence_tag(language),
        request.content
    ));

    prompt
}

fn fence_tag(language: &LanguageTag) -> String {
    if language.is_unknown() {
        String::new()
    } else {
        language.as_str().to_lowercase()
    }
}
