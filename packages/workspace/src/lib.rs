pub mod script;
pub mod serializer;
pub mod state;

pub use script::{run_script, CommandResult, EditCommand, ScriptReport};
pub use serializer::FORMAT_VERSION;
pub use state::{WorkspaceError, WorkspaceState};
