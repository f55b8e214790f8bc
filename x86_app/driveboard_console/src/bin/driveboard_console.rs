use std::borrow::Cow::{self, Borrowed, Owned};
use std::time::{Duration, Instant};

use clap::Parser;
use driveboard_console::{describe, find_serial_device, Link, BAUD_RATE};
use generic::command_to_wire::parse_command_line;
use generic::status_parser::StatusEvent;
use log::info;
use rustyline::completion::FilenameCompleter;
use rustyline::error::ReadlineError;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::HistoryHinter;
use rustyline::validate::MatchingBracketValidator;
use rustyline::{Cmd, CompletionType, Config, EditMode, Editor, KeyEvent};
use rustyline_derive::{Completer, Helper, Hinter, Validator};

#[derive(Helper, Completer, Hinter, Validator)]
struct MyHelper {
    #[rustyline(Completer)]
    completer: FilenameCompleter,
    highlighter: MatchingBracketHighlighter,
    #[rustyline(Validator)]
    validator: MatchingBracketValidator,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    colored_prompt: String,
}

impl Highlighter for MyHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned("\x1b[1m".to_owned() + hint + "\x1b[m")
    }

    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.highlighter.highlight_char(line, pos, forced)
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(next_line_help = true)]
struct Cli {
    #[arg(long)]
    #[arg(required_unless_present("probe"))]
    port: Option<String>,

    /// USB VID:PID in hex, e.g. 2e8a:000a
    #[arg(long)]
    #[arg(required_unless_present("port"))]
    probe: Option<String>,

    #[arg(long, default_value_t = BAUD_RATE)]
    baud: u32,

    /// How long to print board output after each line
    #[arg(long, default_value_t = 300)]
    listen_ms: u64,
}

fn print_events(events: Vec<StatusEvent>) {
    for event in events {
        match event {
            StatusEvent::Report(report) => println!("{}", describe(&report)),
            StatusEvent::Hello => println!("board says hello"),
            StatusEvent::ChunkProcessed => {}
        }
    }
}

// Lines are whitespace separated tokens, e.g. `x 10 y 20 f 3000 line` or
// `superstatus`. See generic::command_to_wire for the full list.
fn main() -> rustyline::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("cli = {:?}", cli);

    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();
    let h = MyHelper {
        completer: FilenameCompleter::new(),
        highlighter: MatchingBracketHighlighter::new(),
        hinter: HistoryHinter::new(),
        colored_prompt: "".to_owned(),
        validator: MatchingBracketValidator::new(),
    };
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(h));
    rl.bind_sequence(KeyEvent::alt('n'), Cmd::HistorySearchForward);
    rl.bind_sequence(KeyEvent::alt('p'), Cmd::HistorySearchBackward);
    if rl.load_history("history.txt").is_err() {
        println!("No previous history.");
    }

    let port_name = match (cli.port, cli.probe) {
        (Some(port), _) => port,
        (_, Some(probe)) => find_serial_device(probe.as_str())
            .unwrap_or_else(|| panic!("Not found port with probe {}", probe)),
        _ => panic!("No port or probe in your arguments"),
    };
    let port = serialport::new(port_name, cli.baud)
        .timeout(Duration::from_millis(100))
        .open()
        .expect("Failed to open port");
    let mut link = Link::new(port);

    let mut count = 1;
    loop {
        let p = format!("{count}> ");
        rl.helper_mut().expect("No helper").colored_prompt = format!("\x1b[1;32m{p}\x1b[0m");
        let readline = rl.readline(&p);
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let bytes = match parse_command_line(&line) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        println!("Unknown command '{}' ({:?}), ignore", line, err);
                        continue;
                    }
                };
                info!("Line: {}, wire = {:?}", line, bytes.as_slice());
                match link.send(&bytes) {
                    Ok(events) => print_events(events),
                    Err(err) => println!("Send failed: {:?}", err),
                }

                let until = Instant::now() + Duration::from_millis(cli.listen_ms);
                while Instant::now() < until {
                    match link.poll() {
                        Ok(events) => print_events(events),
                        Err(err) => {
                            println!("Receive failed: {:?}", err);
                            break;
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("Encountered Eof");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
        count += 1;
    }
    rl.append_history("history.txt")
}
