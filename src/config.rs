use argh::FromArgs;

pub const DEFAULT_PROMPT: &str = "my-cli$ ";
pub const DEFAULT_CONTINUATION_PROMPT: &str = "> ";

#[derive(FromArgs, Debug, Clone, PartialEq, Eq)]
/// A small line-oriented shell with quoting, variables and pipes.
pub struct Config {
    #[argh(option, default = "String::from(DEFAULT_PROMPT)")]
    /// prompt shown before each new command
    pub prompt: String,

    #[argh(option, default = "String::from(DEFAULT_CONTINUATION_PROMPT)")]
    /// prompt shown while a quote is still open
    pub continuation_prompt: String,

    #[argh(option, short = 'c')]
    /// run a single command line and exit
    pub command: Option<String>,

    #[argh(switch, short = 'v')]
    /// log debug information to stderr
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            continuation_prompt: DEFAULT_CONTINUATION_PROMPT.to_string(),
            command: None,
            verbose: false,
        }
    }
}
