//! Turns transcript snapshots into incremental terminal output.

use agent_chat_core::{
    Role, ToolDisplayRegistry, ToolStatus, Transcript, TurnId,
};

/// A piece of output produced since the previous snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    /// New assistant text, to be printed without a line break.
    Text(String),
    /// A tool has started.
    ToolStarted(String),
    /// A tool has finished.
    ToolCompleted(String),
}

/// Remembers how much of the assistant turn has been printed.
///
/// Every snapshot carries the whole transcript, and only what is new in
/// the last assistant turn gets emitted.
pub struct Renderer {
    registry: ToolDisplayRegistry,
    turn: Option<TurnId>,
    printed_len: usize,
    started_tools: usize,
    completed_tools: usize,
}

impl Renderer {
    pub fn new(registry: ToolDisplayRegistry) -> Self {
        Self {
            registry,
            turn: None,
            printed_len: 0,
            started_tools: 0,
            completed_tools: 0,
        }
    }

    pub fn render(&mut self, transcript: &Transcript) -> Vec<Output> {
        let Some(turn) = transcript.last() else {
            return vec![];
        };
        if turn.role() != Role::Assistant {
            // The placeholder was discarded, nothing to print.
            return vec![];
        }
        if self.turn != Some(turn.id()) {
            self.turn = Some(turn.id());
            self.printed_len = 0;
            self.started_tools = 0;
            self.completed_tools = 0;
        }

        let mut outputs = vec![];
        let invocations = turn.tool_invocations();
        for invocation in &invocations[self.started_tools..] {
            let label = self.registry.resolve(invocation.name()).label.to_string();
            outputs.push(Output::ToolStarted(label));
        }
        self.started_tools = invocations.len();

        let content = turn.content();
        if content.len() > self.printed_len {
            outputs.push(Output::Text(content[self.printed_len..].to_owned()));
            self.printed_len = content.len();
        }

        let completed = invocations
            .iter()
            .filter(|t| t.status() == ToolStatus::Completed)
            .count();
        if completed > self.completed_tools {
            for invocation in &invocations[self.completed_tools..completed] {
                let label =
                    self.registry.resolve(invocation.name()).label.to_string();
                outputs.push(Output::ToolCompleted(label));
            }
            self.completed_tools = completed;
        }
        outputs
    }
}

#[cfg(test)]
mod tests {
    use agent_chat_core::StreamingTranscriptReducer;
    use agent_chat_model::{AgentEvent, ToolCallEvent};

    use super::*;

    fn tool_call(name: &str) -> AgentEvent {
        AgentEvent::ToolCall(ToolCallEvent {
            name: name.to_owned(),
            args: Default::default(),
        })
    }

    #[test]
    fn test_incremental_text() {
        let mut renderer = Renderer::new(ToolDisplayRegistry::default());
        let mut reducer = StreamingTranscriptReducer::new();
        reducer.submit("Hi").unwrap();
        assert!(renderer.render(reducer.transcript()).is_empty());

        reducer.apply(AgentEvent::Text("Hel".to_owned()));
        assert_eq!(
            renderer.render(reducer.transcript()),
            vec![Output::Text("Hel".to_owned())]
        );
        reducer.apply(AgentEvent::Text("lo".to_owned()));
        assert_eq!(
            renderer.render(reducer.transcript()),
            vec![Output::Text("lo".to_owned())]
        );
        reducer.apply(AgentEvent::Done { session_id: None });
        assert!(renderer.render(reducer.transcript()).is_empty());
    }

    #[test]
    fn test_tool_labels() {
        let mut renderer = Renderer::new(ToolDisplayRegistry::default());
        let mut reducer = StreamingTranscriptReducer::new();
        reducer.submit("Analyze").unwrap();

        reducer.apply(tool_call("search_competitors"));
        assert_eq!(
            renderer.render(reducer.transcript()),
            vec![Output::ToolStarted("Researching competitors".to_owned())]
        );
        reducer.apply(tool_call("summon_unicorn"));
        assert_eq!(
            renderer.render(reducer.transcript()),
            vec![Output::ToolStarted("summon_unicorn".to_owned())]
        );

        reducer.apply(AgentEvent::Done { session_id: None });
        assert_eq!(
            renderer.render(reducer.transcript()),
            vec![
                Output::ToolCompleted("Researching competitors".to_owned()),
                Output::ToolCompleted("summon_unicorn".to_owned()),
            ]
        );
    }

    #[test]
    fn test_new_turn_resets_progress() {
        let mut renderer = Renderer::new(ToolDisplayRegistry::default());
        let mut reducer = StreamingTranscriptReducer::new();
        reducer.submit("One").unwrap();
        reducer.apply(AgentEvent::Text("First answer".to_owned()));
        renderer.render(reducer.transcript());
        reducer.apply(AgentEvent::Done { session_id: None });

        reducer.submit("Two").unwrap();
        reducer.apply(AgentEvent::Text("Second".to_owned()));
        assert_eq!(
            renderer.render(reducer.transcript()),
            vec![Output::Text("Second".to_owned())]
        );
    }

    #[test]
    fn test_discarded_turn() {
        let mut renderer = Renderer::new(ToolDisplayRegistry::default());
        let mut reducer = StreamingTranscriptReducer::new();
        reducer.submit("Hi").unwrap();
        reducer.apply(AgentEvent::Text("Part".to_owned()));
        renderer.render(reducer.transcript());
        reducer.fail();
        assert!(renderer.render(reducer.transcript()).is_empty());
    }
}
