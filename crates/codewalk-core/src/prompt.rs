//! Prompt rendering for the explanation and Q&A requests.

use codewalk_types::{ConversationTurn, ExplanationContext, VariableInfo};

/// Conversation turns quoted in a Q&A prompt.
const PROMPT_HISTORY_TURNS: usize = 6;

/// Render the prompt asking for an explanation of `ctx.step`.
pub fn render_explanation_prompt(ctx: &ExplanationContext) -> String {
    let lang = &ctx.language;
    format!(
        r#"You are an expert code instructor explaining code to a developer.

## Context
- Language: {lang}
- File: {file}
- Current step: {title}

## Code Being Explained
```{lang}
{step_code}
```

## Full Code Context
```{lang}
{full_code}
```

## Runtime Variables
{variables}

## Instructions
Explain this code step clearly and concisely. Cover:

1. **What** - What does this code do?
2. **Why** - Why is this code here? What problem does it solve?
3. **How** - How does it work? Any important details?

Guidelines:
- Be concise but thorough (2-4 paragraphs)
- Use simple language, avoid jargon unless necessary
- If there are runtime variables, reference their actual values
- Mention any potential issues or edge cases
- If this connects to other parts of the code, explain the relationship

Write your explanation in a friendly, educational tone."#,
        file = ctx.file_name,
        title = ctx.step.title,
        step_code = ctx.step.code_snippet,
        full_code = ctx.full_code,
        variables = format_variables(ctx.variables.as_deref()),
    )
}

/// Render the prompt answering `question` about `ctx.step`.
pub fn render_question_prompt(question: &str, ctx: &ExplanationContext) -> String {
    let lang = &ctx.language;
    format!(
        r#"You are an expert code instructor answering a developer's question.

## Context
- Language: {lang}
- File: {file}
- Current step: {title}

## Code Being Discussed
```{lang}
{step_code}
```

## Conversation History
{history}

## Current Question
{question}

## Instructions
Answer the developer's question directly and helpfully.

Guidelines:
- Be concise and direct
- If the question is about specific code, reference line numbers or variable names
- If you're unsure, say so rather than guessing
- Provide code examples if they would help clarify
- If the question relates to best practices, explain the reasoning

Respond in a conversational but professional tone."#,
        file = ctx.file_name,
        title = ctx.step.title,
        step_code = ctx.step.code_snippet,
        history = format_history(&ctx.conversation_history),
    )
}

fn format_variables(variables: Option<&[VariableInfo]>) -> String {
    match variables {
        Some(vars) if !vars.is_empty() => vars
            .iter()
            .map(|v| format!("- {} ({}): {}", v.name, v.type_name, v.value))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => "No runtime variables available".to_string(),
    }
}

fn format_history(history: &[ConversationTurn]) -> String {
    if history.is_empty() {
        return "No previous conversation".to_string();
    }
    let skip = history.len().saturating_sub(PROMPT_HISTORY_TURNS);
    history[skip..]
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use codewalk_types::{ConversationRole, GeneratedStep, StepType, VariableScope, WalkthroughStep};

    fn context() -> ExplanationContext {
        ExplanationContext {
            step: WalkthroughStep::from_generated(
                0,
                GeneratedStep {
                    start_line: 1,
                    end_line: 1,
                    code_snippet: "const total = sum(items);".to_string(),
                    title: "Initialize total".to_string(),
                    step_type: StepType::Supporting,
                },
            ),
            full_code: "const items = [1, 2];\nconst total = sum(items);".to_string(),
            language: "typescript".to_string(),
            file_name: "cart.ts".to_string(),
            conversation_history: Vec::new(),
            variables: None,
            truncated: false,
            estimated_tokens: 0,
        }
    }

    #[test]
    fn test_explanation_prompt_contents() {
        let prompt = render_explanation_prompt(&context());
        assert!(prompt.contains("- Language: typescript"));
        assert!(prompt.contains("- File: cart.ts"));
        assert!(prompt.contains("- Current step: Initialize total"));
        assert!(prompt.contains("```typescript\nconst total = sum(items);\n```"));
        assert!(prompt.contains("const items = [1, 2];"));
        assert!(prompt.contains("No runtime variables available"));
    }

    #[test]
    fn test_explanation_prompt_lists_variables() {
        let mut ctx = context();
        ctx.variables = Some(vec![VariableInfo {
            name: "total".to_string(),
            value: "3".to_string(),
            type_name: "number".to_string(),
            scope: VariableScope::Local,
            is_expandable: false,
            children: None,
            evaluate_error: None,
        }]);
        let prompt = render_explanation_prompt(&ctx);
        assert!(prompt.contains("- total (number): 3"));
        assert!(!prompt.contains("No runtime variables available"));
    }

    #[test]
    fn test_question_prompt_without_history() {
        let prompt = render_question_prompt("What does sum do?", &context());
        assert!(prompt.contains("## Current Question\nWhat does sum do?"));
        assert!(prompt.contains("No previous conversation"));
        assert!(!prompt.contains("Full Code Context"));
    }

    #[test]
    fn test_question_prompt_quotes_last_six_turns() {
        let mut ctx = context();
        ctx.conversation_history = (0..8)
            .map(|i| {
                let role = if i % 2 == 0 {
                    ConversationRole::User
                } else {
                    ConversationRole::Assistant
                };
                ConversationTurn::new(role, format!("turn {}", i), None)
            })
            .collect();

        let prompt = render_question_prompt("Next?", &ctx);

        assert!(!prompt.contains("turn 1"));
        assert!(prompt.contains("User: turn 2\n\nAssistant: turn 3"));
        assert!(prompt.contains("Assistant: turn 7"));
    }
}
