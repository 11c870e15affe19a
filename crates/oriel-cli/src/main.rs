mod cli;
mod commands;

fn main() {
    let matches = cli::build_cli().get_matches();

    let code = match matches.subcommand() {
        Some(("compile", m)) => {
            let params = cli::CompileParams::from_matches(m);
            commands::compile::run(params.into())
        }
        _ => unreachable!("clap should have caught this"),
    };
    std::process::exit(code);
}
