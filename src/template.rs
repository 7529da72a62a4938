use crate::collector::DEFAULT_STYLE;

/// Optional identity line, the question, and a style instruction unless the
/// style is the default one.
pub fn render_query(role: Option<&str>, style: &str, question: &str) -> String {
    let mut sections = Vec::with_capacity(3);
    if let Some(role) = role.filter(|role| !role.trim().is_empty()) {
        sections.push(format!("You are a {role}."));
    }
    sections.push(format!("Question: {question}"));
    if let Some(instruction) = style_instruction(style) {
        sections.push(instruction);
    }
    sections.join("\n\n")
}

pub fn style_instruction(style: &str) -> Option<String> {
    let style = style.trim();
    if style.is_empty() || style.eq_ignore_ascii_case(DEFAULT_STYLE) {
        return None;
    }
    Some(format!("Please provide a {style} answer."))
}

pub fn render_summary(text: &str) -> String {
    format!(
        "Read the following text and create a summary.\n\
         First, list the five most important points in the text as bullet points.\n\
         Then, write a detailed summary paragraph (~250 words).\n\n\
         Text:\n\
         {text}\n\n\
         Summary:\n\
         - "
    )
}

/// Greedy word wrap that never splits words and keeps explicit line breaks.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}
