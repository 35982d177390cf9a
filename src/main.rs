use log::LevelFilter;
use my_cli::{Config, Outcome, Shell};
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let config: Config = argh::from_env();

    let mut logger = env_logger::Builder::from_default_env();
    if config.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let command = config.command.clone();
    let mut shell = Shell::new(config);
    match command {
        Some(line) => match shell.eval(&line, || None) {
            Ok(Outcome::Output(out)) => println!("{}", out),
            Ok(Outcome::Nothing | Outcome::Exit) => {}
            Err(err) => {
                eprintln!("{}", err);
                return Ok(ExitCode::FAILURE);
            }
        },
        None => shell.repl()?,
    }
    Ok(ExitCode::SUCCESS)
}
