mod script;
mod test_runner;

use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::{Parser as _, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use blocks::{Block, BlockTypeRegistry, MarkupParser, ParseError, Parser, Serializer};
use store::{Action, ChangeLog, ListChange, Store, StoreError};

#[derive(clap::Parser)]
#[command(name = "blocks", version, about = "Block document parser and store")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log store decisions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a block document and print it back
    Parse(ParseArgs),

    /// Apply a TOML action script to a block document
    Apply(ApplyArgs),

    /// Run .test.html fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Block markup file
    file: String,

    /// Parse only (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump parsed blocks as JSON
    #[arg(long)]
    json: bool,

    /// List block names with their client ids
    #[arg(long)]
    list_blocks: bool,
}

#[derive(clap::Args)]
struct ApplyArgs {
    /// Block markup file
    file: String,

    /// TOML file with [[step]] tables
    #[arg(short, long)]
    script: String,

    /// Print list notifications after each step
    #[arg(long)]
    changes: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.html file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.no_color);

    let exit_code = match cli.command {
        Command::Parse(args) => do_parse(args, cli.no_color),
        Command::Apply(args) => do_apply(args, cli.no_color),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                0
            } else {
                test_runner::run_tests(path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .init();
}

fn color_choice(no_color: bool) -> ColorChoice {
    if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn read_source(path: &str) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path, e);
            None
        }
    }
}

fn emit_parse_errors(files: &SimpleFiles<String, String>, errors: &[ParseError], no_color: bool) {
    let writer = StandardStream::stderr(color_choice(no_color));
    let config = term::Config::default();
    for error in errors {
        let diagnostic = error.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
    }
}

fn do_parse(args: ParseArgs, no_color: bool) -> i32 {
    let Some(source) = read_source(&args.file) else {
        return 1;
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let registry = Arc::new(BlockTypeRegistry::with_core_types());
    let parser = Parser::new(Arc::clone(&registry)).with_file_id(file_id);
    let blocks = match parser.parse(&source) {
        Ok(blocks) => blocks,
        Err(errors) => {
            emit_parse_errors(&files, &errors, no_color);
            return 1;
        }
    };

    if args.check {
        eprintln!("ok: {} parsed successfully ({} blocks)", args.file, blocks.len());
        return 0;
    }

    if args.json {
        return match serde_json::to_string_pretty(&blocks) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("error: cannot encode blocks: {}", e);
                1
            }
        };
    }

    if args.list_blocks {
        fn print_blocks(blocks: &[Block], indent: usize) {
            for block in blocks {
                let pad = "  ".repeat(indent);
                let marker = if block.is_valid { "" } else { " (invalid)" };
                println!("{}{} {}{}", pad, block.name, block.client_id, marker);
                print_blocks(&block.inner_blocks, indent + 1);
            }
        }
        print_blocks(&blocks, 0);
        return 0;
    }

    let store = Store::new(registry).with_blocks(blocks);
    println!("{}", store.serialize());
    0
}

fn do_apply(args: ApplyArgs, no_color: bool) -> i32 {
    let Some(source) = read_source(&args.file) else {
        return 1;
    };
    let Some(script_text) = read_source(&args.script) else {
        return 1;
    };
    let script = match script::parse_script(&script_text) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("error: invalid script '{}': {}", args.script, e);
            return 1;
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let registry = Arc::new(BlockTypeRegistry::with_core_types());
    let mut store = Store::with_codec(
        Box::new(Parser::new(Arc::clone(&registry)).with_file_id(file_id)),
        Box::new(Serializer::new(Arc::clone(&registry))),
        ChangeLog::new(),
    );

    if let Err(StoreError::MalformedMarkup(errors)) = store.dispatch(Action::Parse { html: source }) {
        emit_parse_errors(&files, &errors, no_color);
        return 1;
    }
    store.notifier_mut().take();

    let applied = match script::apply_steps(&mut store, &script.steps, &registry) {
        Ok(applied) => applied,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };
    if args.changes {
        for (i, step) in applied.iter().enumerate() {
            if !step.outcome.is_changed() {
                eprintln!("step {} ({}): unchanged", i + 1, step.kind);
            }
            for change in &step.changes {
                eprintln!("step {} ({}): {}", i + 1, step.kind, describe_change(change));
            }
        }
    }

    println!("{}", store.serialize());
    0
}

fn describe_change(change: &ListChange) -> String {
    match change {
        ListChange::Set { index, client_id } => format!("set {} <- {}", index, client_id),
        ListChange::Splice {
            index,
            delete_count,
            inserted: Some(client_id),
        } => format!("splice {} -{} +{}", index, delete_count, client_id),
        ListChange::Splice {
            index,
            delete_count,
            inserted: None,
        } => format!("splice {} -{}", index, delete_count),
        ListChange::MoveUp { index } => format!("move up {}", index),
        ListChange::MoveDown { index } => format!("move down {}", index),
        ListChange::Reset { len } => format!("reset ({} blocks)", len),
    }
}
