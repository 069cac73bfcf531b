use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sales_bot::{logging, ConfigArgs, Interpreter, Ledger, ReplyStatus};

#[derive(Parser)]
#[command(name = "sales-bot", version, about = "Chat with your sales ledger")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the terminal chat (default)
    Chat,
    /// Run a single command and print the reply
    Say {
        /// e.g. add sale apple 5 200
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.into_config();

    match cli.command {
        Some(Command::Say { words }) => {
            logging::init_stderr();
            let ledger = Ledger::open(config).context("Failed to open ledger")?;
            run_say(ledger, &words.join(" "))
        }
        Some(Command::Chat) | None => {
            let log_path = config.data_dir.join("sales-bot.log");
            let ledger = Ledger::open(config).context("Failed to open ledger")?;
            logging::init_file(&log_path).context("Failed to open log file")?;
            run_ui_mode(ledger)
        }
    }
}

fn run_say(ledger: Ledger, utterance: &str) -> Result<()> {
    let mut interpreter = Interpreter::new(ledger);
    let reply = interpreter.interpret(utterance);
    println!("{}", reply.text);

    if let ReplyStatus::StorageFailed(reason) = reply.status {
        bail!("ledger write failed: {}", reason);
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(ledger: Ledger) -> Result<()> {
    use sales_bot::{ui, Session};

    let session = Session::open(&ledger).context("Failed to load tables")?;
    let mut app = ui::App::new(Interpreter::new(ledger), session);
    ui::run_ui(&mut app)?;

    println!("Goodbye 👋");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_ledger: Ledger) -> Result<()> {
    eprintln!("❌ Terminal chat not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or run a single command: sales-bot say add sale apple 5 200");
    std::process::exit(1);
}
