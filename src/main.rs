use clap::{Args, CommandFactory, Parser, Subcommand};
use june::config::{self, JuneConfig};
use june::generate::{self, HtmlPipeline};
use june::types::RenderOptions;
use june::watch::{self, CancelToken, WatchSession};
use june::{logging, output, version};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "june")]
#[command(about = "A super simple static page generator")]
#[command(long_about = "\
A super simple static page generator

One Markdown file in, one standalone HTML page out. Frontmatter at the top
of the file sets the page metadata:

  ---
  title: My Notes
  description: Things I wrote down
  lang: en
  tags: [notes, misc]
  ---
  # My Notes
  ...

With --watch, june keeps running and regenerates the page every time the
file is saved. Press Ctrl+C to stop.

Defaults for generate can live in ./june.toml.
Run 'june gen-config' to print a documented one.")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print version information
    #[arg(short = 'V', long = "version")]
    version: bool,

    /// Config file (default: ./june.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate HTML output from a Markdown file
    Generate(GenerateArgs),
    /// Show the current version
    Version,
    /// Print a stock june.toml with all options documented
    GenConfig,
}

#[derive(Args)]
struct GenerateArgs {
    /// Input file to generate from
    file: PathBuf,

    /// Where to write the page [default: public/index.html]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat the Markdown as untrusted and sanitize the HTML
    #[arg(long = "ugc", visible_alias = "untrusted")]
    untrusted: bool,

    /// Watch the file for changes and regenerate the page
    #[arg(long)]
    watch: bool,

    /// Path to a CSS file for styling [default: embedded style]
    #[arg(long)]
    style: Option<PathBuf>,

    /// Path to a page template [default: embedded template]
    #[arg(long)]
    template: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", version::version_string());
        return ExitCode::SUCCESS;
    }

    match cli.command {
        Some(Command::Generate(args)) => {
            let config = match config::load_config(cli.config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {e}");
                    return ExitCode::FAILURE;
                }
            };
            logging::init_with_config(&config.logging);
            run_generate(args, &config)
        }
        Some(Command::Version) => {
            println!("{}", version::version_string());
            ExitCode::SUCCESS
        }
        Some(Command::GenConfig) => {
            print!("{}", config::stock_config_toml());
            ExitCode::SUCCESS
        }
        None => {
            // Same as clap's behavior for a missing required subcommand.
            let _ = Cli::command().print_help();
            ExitCode::from(2)
        }
    }
}

fn run_generate(args: GenerateArgs, config: &JuneConfig) -> ExitCode {
    let output_path = config.output_path(args.output);
    let options = config.render_options(RenderOptions {
        untrusted: args.untrusted,
        style: args.style,
        template: args.template,
    });

    if args.watch {
        return run_watch(WatchSession {
            input: args.file,
            output: output_path,
            options,
        });
    }

    match generate::produce(&args.file, &output_path, &options) {
        Ok(()) => {
            output::print_generated(&output_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run a watch session until Ctrl+C. Only setup failures exit non-zero.
fn run_watch(session: WatchSession) -> ExitCode {
    let cancel = CancelToken::new();
    if let Err(e) = watch::install_interrupt_handler(&cancel) {
        eprintln!("Error starting watcher: {e}");
        return ExitCode::FAILURE;
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for status in rx {
            output::print_watch_status(&status);
        }
    });

    let mut pipeline = HtmlPipeline;
    // The sender moves into the session and is dropped when it returns,
    // which ends the printer loop.
    let result = watch::start(&session, &mut pipeline, &cancel, Some(tx));
    if printer.join().is_err() {
        tracing::warn!("status printer thread panicked");
    }

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error starting watcher: {e}");
            ExitCode::FAILURE
        }
    }
}
