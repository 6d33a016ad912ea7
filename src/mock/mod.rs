mod display;
mod script;
mod terminal;

pub use display::{DisplayError, Orientation, TerminalDisplay};
pub use script::{ScriptError, ScriptedRules};
pub use terminal::run_interactive_terminal;
