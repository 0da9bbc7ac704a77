//! Provider-aware conversation history.
//!
//! Back ends disagree on how consecutive assistant turns and tool feedback
//! should be laid out. The layout rule is a [`HistoryPolicy`] chosen once
//! when the history is built; nothing downstream branches on the back end.

use std::fmt;

use crate::config::HostModel;
use crate::types::{ContentPart, MessageContent, ModelMessage, Role};

/// How new content is laid into the message log.
pub trait HistoryPolicy: Send + Sync {
    /// Policy name, used in logs.
    fn name(&self) -> &'static str;

    /// Apply one addition to `messages`. Must never remove entries.
    fn append(&self, messages: &mut Vec<ModelMessage>, role: Role, content: String, mergeable: bool);
}

/// OpenAI-family layout: consecutive assistant content folds into one
/// message as additional text parts.
#[derive(Debug, Default, Clone, Copy)]
pub struct MergingPolicy;

impl HistoryPolicy for MergingPolicy {
    fn name(&self) -> &'static str {
        "merging"
    }

    fn append(&self, messages: &mut Vec<ModelMessage>, role: Role, content: String, _mergeable: bool) {
        if role != Role::Assistant {
            messages.push(ModelMessage::new(role, content));
            return;
        }
        match messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content.push_part(ContentPart::text(content));
            }
            _ => messages.push(ModelMessage::assistant(content)),
        }
    }
}

/// Groq-family layout: every addition is a new entry, and mergeable content
/// (tool feedback, model output that carried a tool call) is recorded as a
/// system message.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplacingPolicy;

impl HistoryPolicy for ReplacingPolicy {
    fn name(&self) -> &'static str {
        "replacing"
    }

    fn append(&self, messages: &mut Vec<ModelMessage>, role: Role, content: String, mergeable: bool) {
        let role = if mergeable { Role::System } else { role };
        messages.push(ModelMessage::new(role, content));
    }
}

/// Policy for a back-end family.
pub fn policy_for(model: HostModel) -> Box<dyn HistoryPolicy> {
    match model {
        HostModel::OpenAi => Box::new(MergingPolicy),
        HostModel::Groq => Box::new(ReplacingPolicy),
    }
}

/// Ordered message log owned by one session. The system prompt is always
/// the first entry.
pub struct ConversationHistory {
    messages: Vec<ModelMessage>,
    policy: Box<dyn HistoryPolicy>,
}

impl fmt::Debug for ConversationHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationHistory")
            .field("policy", &self.policy.name())
            .field("messages", &self.messages)
            .finish()
    }
}

impl ConversationHistory {
    /// Create a history seeded with the system prompt.
    pub fn new(system_prompt: impl Into<String>, policy: Box<dyn HistoryPolicy>) -> Self {
        Self {
            messages: vec![ModelMessage::system(system_prompt)],
            policy,
        }
    }

    /// Create a history using the policy for `model`.
    pub fn for_model(system_prompt: impl Into<String>, model: HostModel) -> Self {
        Self::new(system_prompt, policy_for(model))
    }

    /// Add content according to the policy.
    pub fn append(&mut self, role: Role, content: impl Into<String>, mergeable: bool) {
        self.policy
            .append(&mut self.messages, role, content.into(), mergeable);
    }

    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ModelMessage> {
        self.messages.last()
    }

    pub fn system_prompt(&self) -> Option<&MessageContent> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| &m.content)
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn merging_folds_consecutive_assistant_content() {
        let mut history = ConversationHistory::for_model("sys", HostModel::OpenAi);
        history.append(Role::User, "hi", false);
        history.append(Role::Assistant, "calling a tool", true);
        history.append(Role::Assistant, "Executed tools with results:\n[]", true);

        assert_eq!(history.len(), 3);
        let last = history.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content.part_count(), 2);
        assert_eq!(last.text(), "calling a toolExecuted tools with results:\n[]");
    }

    #[test]
    fn merging_starts_new_assistant_after_user() {
        let mut history = ConversationHistory::for_model("sys", HostModel::OpenAi);
        history.append(Role::Assistant, "one", false);
        history.append(Role::User, "two", false);
        history.append(Role::Assistant, "three", false);

        let roles: Vec<Role> = history.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[test]
    fn replacing_records_mergeable_content_as_system() {
        let mut history = ConversationHistory::for_model("sys", HostModel::Groq);
        history.append(Role::User, "hi", false);
        history.append(Role::Assistant, "<mcp_tool_call>..</mcp_tool_call>", true);
        history.append(Role::Assistant, "Executed tools with results:\n[]", true);
        history.append(Role::Assistant, "done", false);

        let roles: Vec<Role> = history.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::System, Role::System, Role::Assistant]
        );
        assert_eq!(history.policy_name(), "replacing");
    }

    #[test]
    fn system_prompt_stays_first() {
        let mut history = ConversationHistory::for_model("the prompt", HostModel::Groq);
        for i in 0..5 {
            history.append(Role::Assistant, format!("m{i}"), i % 2 == 0);
        }
        assert_eq!(
            history.system_prompt(),
            Some(&MessageContent::Text("the prompt".to_string()))
        );
        assert_eq!(history.len(), 6);
    }
}
