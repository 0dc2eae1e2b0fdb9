//! Binary entrypoint for the babelshelf CLI.
//!
//! Commands:
//! - `init` - write a starter `babelshelf.toml`
//! - `new --name <name> --description <text>` - create a character and shelve their story
//! - `look` - show the current room
//! - `go <north|south|east|west>` - walk to a neighbouring room
//! - `read <book> [--page N]` - read a page of a book in the current room
//! - `status` - generation mode and what the library has stored so far
//! - `reset` - erase every stored catalog, page and record
//!
//! See the library crate docs for module-level details: `babelshelf::`.
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use babelshelf::config::Config;
use babelshelf::library::{Direction, Library, LibrarySession, RoomManager};

#[derive(Parser)]
#[command(name = "babelshelf")]
#[command(about = "Walk an endless library whose books are written as you open them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "babelshelf.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Create a new character and shelve their story somewhere in the library
    New {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        description: String,
    },
    /// Show the current room
    Look,
    /// Walk to a neighbouring room
    Go {
        /// north, south, east or west (or n/s/e/w)
        direction: String,
    },
    /// Read a book in the current room
    Read {
        /// Book number as listed by `look` (1-based)
        book: usize,
        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },
    /// Show generation mode and stored content counts
    Status,
    /// Erase all stored content
    Reset {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Wrote default configuration to {}", cli.config);
        println!("Created {}", cli.config);
        return Ok(());
    }

    let config = Config::load(&cli.config)
        .await
        .with_context(|| format!("run `babelshelf init` to create {}", cli.config))?;
    init_logging(Some(&config), cli.verbose);
    let library = Library::open(&config)?;

    match cli.command {
        Commands::Init => {}
        Commands::New { name, description } => {
            let session = LibrarySession::start_new(library, &name, &description).await?;
            if let Some(story) = session.story() {
                println!("{}\n", story);
            }
            print_room(session.rooms());
        }
        Commands::Look => {
            let session = LibrarySession::resume(library).await?;
            if let Some(character) = session.character() {
                println!("{}, {}\n", character.name, character.description);
            }
            print_room(session.rooms());
        }
        Commands::Go { direction } => {
            let direction = Direction::from_str(&direction).map_err(|e| anyhow!(e))?;
            let mut session = LibrarySession::resume(library).await?;
            if session.rooms_mut().move_to(direction).await? {
                session.record_entrance()?;
                print_room(session.rooms());
            } else {
                println!("You cannot go {}: the shelves end here.", direction);
            }
        }
        Commands::Read { book, page } => {
            let session = LibrarySession::resume(library).await?;
            let mut pager = book
                .checked_sub(1)
                .and_then(|index| session.rooms().book(index))
                .ok_or_else(|| anyhow!("there is no book {} in this room", book))?;
            let text = pager.go_to_page(page).await?;
            println!("{} (page {})\n", pager.title(), pager.current_page());
            println!("{}", text);
        }
        Commands::Status => {
            let store = library.store();
            println!("babelshelf v{}", env!("CARGO_PKG_VERSION"));
            println!("Data directory: {}", config.storage.data_dir);
            println!(
                "Generation: {} ({})",
                library.generator().mode(),
                library.generator().backend_name()
            );
            println!(
                "Library: {}x{} rooms, {} books per room",
                config.library.width, config.library.height, config.library.books_per_room
            );
            println!("Rooms catalogued: {}", store.known_rooms().len());
            println!("Pages written: {}", store.known_books().len());
            if let Some(location) = babelshelf::library::narrative::character_book(&library)? {
                println!(
                    "Your story: book {} in room {}",
                    location.book_index + 1,
                    location.coordinate
                );
            }
        }
        Commands::Reset { yes } => {
            if !yes {
                return Err(anyhow!("refusing to erase the library without --yes"));
            }
            library.store().reset()?;
            println!("Library reset.");
        }
    }

    Ok(())
}

fn print_room(rooms: &RoomManager) {
    let Some(info) = rooms.room_info() else {
        println!("The room is dark.");
        return;
    };
    println!(
        "Room {} of {} rooms. {} books line the shelves:",
        info.coordinate,
        info.total_rooms,
        info.catalog.len()
    );
    for (i, title) in info.catalog.titles().iter().enumerate() {
        println!("{:>4}. {}", i + 1, title);
    }
}

fn init_logging(config: Option<&Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .and_then(|cfg| log::LevelFilter::from_str(&cfg.logging.level).ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let file = std::sync::Mutex::new(f);
        // Only echo to the console when a person is watching it
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
