//! Slash commands and quick actions.

/// A canned prompt for a common product-marketing workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuickAction {
    pub label: &'static str,
    pub prompt: &'static str,
}

#[rustfmt::skip]
pub static QUICK_ACTIONS: [QuickAction; 8] = [
    QuickAction {
        label: "Competitive Analysis",
        prompt: "Help me analyze the competitive landscape for my product.",
    },
    QuickAction {
        label: "Positioning Statement",
        prompt: "Help me create a positioning statement for my product.",
    },
    QuickAction {
        label: "Messaging Matrix",
        prompt: "Help me build a messaging matrix with value props and proof points.",
    },
    QuickAction {
        label: "Launch Plan",
        prompt: "Help me create a go-to-market launch plan.",
    },
    QuickAction {
        label: "Battlecard",
        prompt: "Help me create a competitive battlecard.",
    },
    QuickAction {
        label: "ICP Definition",
        prompt: "Help me define my Ideal Customer Profile (ICP).",
    },
    QuickAction {
        label: "Pricing Analysis",
        prompt: "Analyze pricing strategies in my competitive landscape.",
    },
    QuickAction {
        label: "Risk Assessment",
        prompt: "Run a market risk assessment on my positioning strategy.",
    },
];

pub const HELP: &str = "\
/help        Show this help
/actions     List quick actions
/1 ... /8    Send a quick action
/reset       Start a new conversation
/quit        Exit";

/// What a line of input asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Message(&'a str),
    Help,
    Actions,
    QuickAction(&'static QuickAction),
    Reset,
    Quit,
    Unknown(&'a str),
}

impl<'a> Input<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Input::Message(line);
        };
        match command {
            "help" | "?" => Input::Help,
            "actions" => Input::Actions,
            "reset" => Input::Reset,
            "quit" | "exit" => Input::Quit,
            _ => command
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| QUICK_ACTIONS.get(idx))
                .map_or(Input::Unknown(line), Input::QuickAction),
        }
    }
}
