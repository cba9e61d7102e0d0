use std::io::{self, BufRead, Write};

use nexshell::backend::Backend;
use nexshell::config::Config;
use nexshell::{ipc, logging};

const USAGE: &str = "\
usage: nexshell [--dump-config | -c <command>]

With no arguments, reads one JSON request per line on stdin and writes one
JSON response per line on stdout.";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::load();

    match args.first().map(String::as_str) {
        None => {}
        Some("--dump-config") => {
            match config.to_toml() {
                Ok(text) => print!("{text}"),
                Err(e) => {
                    eprintln!("nexshell: could not render config: {e}");
                    std::process::exit(1);
                }
            }
            return;
        }
        Some("-c") => {
            let Some(command) = args.get(1) else {
                eprintln!("{USAGE}");
                std::process::exit(2);
            };
            logging::init(&config.logging);
            let result = Backend::new(&config).execute(command);
            if !result.stdout.is_empty() {
                println!("{}", result.stdout);
            }
            if !result.stderr.is_empty() {
                eprintln!("{}", result.stderr);
            }
            std::process::exit(result.exit_code);
        }
        Some("-h" | "--help") => {
            println!("{USAGE}");
            return;
        }
        Some(other) => {
            eprintln!("nexshell: unknown argument '{other}'\n{USAGE}");
            std::process::exit(2);
        }
    }

    logging::init(&config.logging);
    let backend = Backend::new(&config);
    log::info!(
        "nexshell {} serving in {} as {}",
        env!("CARGO_PKG_VERSION"),
        backend.working_directory().display(),
        backend.permission_level()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let response = ipc::handle_line(&backend, &line);
        if writeln!(stdout, "{response}")
            .and_then(|()| stdout.flush())
            .is_err()
        {
            break;
        }
    }
    log::info!("stdin closed, exiting");
}
