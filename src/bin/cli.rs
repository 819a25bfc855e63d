//! rowbase - CLI shell

use std::io::{self, BufRead, Write};

use rowbase::{CancellationToken, Engine};

/// Minimal `log` backend writing to stderr
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Print welcome banner
fn print_banner() {
    println!(
        r#"
rowbase - a minimal relational database engine
Type '.help' for help, '.quit' to exit
"#
    );
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .tables            List all tables
  .quit              Exit (persists the schema)

SQL statements end with ';' and may span lines:
  CREATE TABLE users DEFINITIONS (id int, name string, active bool);
  INSERT INTO users VALUES (1, "Alice", true);
  SELECT id, name FROM users WHERE active == true AND id > 0;
"#
    );
}

fn print_prompt() {
    print!("rowbase> ");
    let _ = io::stdout().flush();
}

fn main() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }

    let root_dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());

    let engine = match Engine::initialize(&root_dir) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("failed to open database at '{}': {}", root_dir, e);
            std::process::exit(1);
        }
    };

    print_banner();

    let cancel = CancellationToken::new();
    let mut buffer = String::new();

    print_prompt();
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();

        // dot-commands only between statements
        if buffer.is_empty() && trimmed.starts_with('.') {
            match trimmed {
                ".help" => print_help(),
                ".tables" => {
                    for name in engine.catalog().table_names() {
                        println!("{}", name);
                    }
                }
                ".quit" => break,
                _ => println!("unknown command: {}", trimmed),
            }
            print_prompt();
            continue;
        }

        buffer.push_str(&line);
        buffer.push('\n');

        if trimmed.ends_with(';') {
            let batch = std::mem::take(&mut buffer);
            let mut stdout = io::stdout();
            if let Err(e) = engine.run(&cancel, &mut stdout, &batch) {
                println!("{}", e);
            }
            let _ = stdout.flush();
        }

        print_prompt();
    }

    if let Err(e) = engine.shutdown() {
        eprintln!("failed to persist schema: {}", e);
        std::process::exit(1);
    }
}
