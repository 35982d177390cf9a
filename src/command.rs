use crate::builtin::{self, Assignment, Cat, Echo, Exit, Grep, Pwd, Wc};
use crate::external::ExternalCommand;
use crate::parser::{CommandDescriptor, CommandKind};
use crate::scope::Scope;
use anyhow::Result;
use log::trace;

impl CommandDescriptor {
    /// Executes this stage.
    ///
    /// `input` is the output of the previous stage, or `None` for the first stage
    /// of a pipeline. The returned text is this stage's output.
    pub fn run(&self, input: Option<String>, scope: &mut Scope) -> Result<String> {
        trace!("running `{}` (piped input: {})", self, input.is_some());
        let args: Vec<&str> = self.args().iter().map(String::as_str).collect();
        match self.kind() {
            CommandKind::Assign => builtin::run::<Assignment>(&args, input, scope),
            CommandKind::Cat => builtin::run::<Cat>(&args, input, scope),
            CommandKind::Echo => builtin::run::<Echo>(&args, input, scope),
            CommandKind::Wc => builtin::run::<Wc>(&args, input, scope),
            CommandKind::Pwd => builtin::run::<Pwd>(&args, input, scope),
            CommandKind::Exit => builtin::run::<Exit>(&args, input, scope),
            CommandKind::Grep => builtin::run::<Grep>(&args, input, scope),
            CommandKind::External(name) => ExternalCommand::resolve(name, &args)?.run(input),
        }
    }
}
