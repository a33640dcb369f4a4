//! Prompt construction for research requests.

/// Instructions sent ahead of every research topic.
pub const SYSTEM_PROMPT: &str = r#"You are an expert research assistant. Research the given topic in depth and prepare a detailed, academic-quality report made of:

1. Executive summary: a concise but complete overview of the topic and the key findings (at least 250 words).
2. Introduction: background and context, including why the topic matters (at least 300 words).
3. Main body: three to five sections, each examining a different aspect of the topic in depth.
4. Findings and insights: the key discoveries and their implications, with data where available.
5. Conclusion: a summary of the research and possible future directions.
6. Sources: every source used, with URLs; aim for at least eight high-quality sources.

Cite a source for each fact or claim. Consider multiple perspectives, address counterarguments and keep an objective tone.

Respond with a single JSON object using this schema:
{
  "summary": "Executive summary in markdown (do not start with an 'Executive Summary' heading)",
  "sections": [
    {
      "title": "Section title",
      "content": "Section body in markdown (do not repeat the section title)"
    }
  ],
  "sources": [
    {
      "title": "Source title",
      "url": "Source URL",
      "snippet": "Short markdown description of the source"
    }
  ]
}

Markdown conventions for every text field:
- # for headings, ## for subheadings, ### below that
- **bold** for emphasis and *italics* for terms
- "- item" for bullet lists and "1. item" for numbered lists
- > for quotations and callouts
- pipe tables with a --- separator row for tabular data

JSON requirements:
- The response must be valid JSON, parseable without any clean-up.
- Escape special characters inside strings: \\ for a backslash, \" for a quote, \n for a newline. Never place a single backslash before any other character.
- Do not wrap the JSON in code fences and do not add any text before or after it."#;

const JSON_ONLY_REMINDER: &str = "IMPORTANT: Your response MUST be a valid JSON object without any markdown formatting or code blocks around it. Escape all special characters inside strings.";

/// Builds the full prompt for `topic` with optional extra context from the requester.
pub fn build_prompt(topic: &str, additional_context: Option<&str>) -> String {
    let mut prompt = String::with_capacity(SYSTEM_PROMPT.len() + topic.len() + 256);
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n\nTopic: ");
    prompt.push_str(topic);
    if let Some(context) = additional_context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\nAdditional context: ");
        prompt.push_str(context);
    }
    prompt.push_str("\n\n");
    prompt.push_str(JSON_ONLY_REMINDER);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_topic_and_context() {
        let prompt = build_prompt("Coral reefs", Some("Focus on bleaching"));
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("\n\nTopic: Coral reefs\nAdditional context: Focus on bleaching"));
        assert!(prompt.ends_with(JSON_ONLY_REMINDER));
    }

    #[test]
    fn test_blank_context_is_omitted() {
        let prompt = build_prompt("Coral reefs", Some("   "));
        assert!(!prompt.contains("Additional context"));
        let prompt = build_prompt("Coral reefs", None);
        assert!(!prompt.contains("Additional context"));
    }
}
