use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error};
use memeboard_frontend::format::{format_posted, format_ttl, poster_label, size_label};
use memeboard_frontend::models::{DetailedMeme, MemeId};
use memeboard_frontend::upload::{DiskFile, MemeFile};
use memeboard_frontend::{Intent, MemeBoard};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const IMAGE_PREVIEW_CHARS: usize = 48;

/// Drives the board from stdin until `quit` or end of input.
pub fn run(board: MemeBoard, initial_user: Option<&str>) -> Result<()> {
    let lines = spawn_stdin_reader();
    let mut shell = Shell {
        board,
        shown_ids: Vec::new(),
        shown_detail: None,
    };

    println!("Meme board ready. Type 'help' for a list of commands.");
    match initial_user {
        Some(name) => shell.dispatch(Intent::SetUserName(name.to_string())),
        None => println!("Set your name with 'name <your name>' to load the board."),
    }
    prompt()?;

    loop {
        shell.board.pump(POLL_INTERVAL);
        shell.report_changes();

        let line = match lines.try_recv() {
            Ok(line) => line,
            Err(TryRecvError::Empty) => continue,
            Err(TryRecvError::Disconnected) => break,
        };
        let tokens = match shell_words::split(&line) {
            Ok(tokens) => tokens,
            Err(err) => {
                println!("Could not parse input: {err}");
                prompt()?;
                continue;
            }
        };
        if tokens.is_empty() {
            prompt()?;
            continue;
        }

        match shell.handle_command(&tokens) {
            Ok(LoopAction::Continue) => {}
            Ok(LoopAction::Exit) => break,
            Err(err) => println!("Error: {err:#}"),
        }
        shell.report_changes();
        prompt()?;
    }

    Ok(())
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    error!("failed to read stdin: {err}");
                    break;
                }
            }
        }
    });
    rx
}

fn prompt() -> Result<()> {
    print!("memeboard> ");
    io::stdout().flush()?;
    Ok(())
}

enum LoopAction {
    Continue,
    Exit,
}

struct Shell {
    board: MemeBoard,
    shown_ids: Vec<MemeId>,
    shown_detail: Option<MemeId>,
}

impl Shell {
    fn handle_command(&mut self, tokens: &[String]) -> Result<LoopAction> {
        let command = tokens[0].as_str();
        match command {
            "help" => self.print_help(),
            "health" | "ping" => self.dispatch(Intent::CheckHealth),
            "name" => {
                if tokens.len() < 2 {
                    println!("Usage: name <your name>");
                } else {
                    self.dispatch(Intent::SetUserName(tokens[1..].join(" ")));
                }
            }
            "file" | "select" => {
                if tokens.len() < 2 {
                    println!("Usage: file <path to image>");
                } else {
                    self.select_file(&tokens[1])?;
                }
            }
            "post" => self.dispatch(Intent::Post),
            "open" | "view" => match tokens.get(1) {
                Some(id) => self.dispatch(Intent::Open(MemeId::new(id.as_str()))),
                None => println!("Usage: open <meme id>"),
            },
            "like" => {
                let id = tokens
                    .get(1)
                    .map(|id| MemeId::new(id.as_str()))
                    .or_else(|| self.board.detail().map(|meme| meme.id.clone()));
                match id {
                    Some(id) => self.dispatch(Intent::Like(id)),
                    None => println!("Open a meme first with 'open <meme id>'."),
                }
            }
            "close" => self.dispatch(Intent::Close),
            "refresh" => self.dispatch(Intent::Refresh),
            "list" | "ls" => self.print_board(),
            "show" => match self.board.detail() {
                Some(meme) => self.print_detail(&meme),
                None => println!("No meme is open."),
            },
            "status" => self.print_status(),
            "quit" | "exit" => return Ok(LoopAction::Exit),
            other => {
                println!("Unknown command '{other}'. Type 'help' for a list of commands.");
            }
        }
        Ok(LoopAction::Continue)
    }

    fn dispatch(&mut self, intent: Intent) {
        if let Err(err) = self.board.dispatch(intent) {
            debug!("intent rejected locally: {err}");
        }
    }

    fn select_file(&mut self, path: &str) -> Result<()> {
        let file = DiskFile::open(path).with_context(|| format!("failed to open {path}"))?;
        let label = format!("{} ({})", file.name(), size_label(file.size()));
        if self.board.dispatch(Intent::SelectFile(Arc::new(file))).is_ok() {
            println!("Staged {label}. Type 'post' to share it.");
        }
        Ok(())
    }

    /// Prints queued notices and anything that changed on the board since
    /// the last call. Countdown ticks alone are not reported.
    fn report_changes(&mut self) {
        for notice in self.board.drain_notices() {
            println!("{notice}");
        }

        let thumbnails = self.board.thumbnails();
        let ids: Vec<MemeId> = thumbnails.iter().map(|thumb| thumb.id.clone()).collect();
        if ids != self.shown_ids {
            self.shown_ids = ids;
            self.print_board();
        }

        let detail = self.board.detail();
        let detail_id = detail.as_ref().map(|meme| meme.id.clone());
        if detail_id != self.shown_detail {
            match (&detail, &self.shown_detail) {
                (Some(meme), _) => self.print_detail(meme),
                (None, Some(id)) => println!("Meme {id} is no longer open."),
                (None, None) => {}
            }
            self.shown_detail = detail_id;
        }
    }

    fn print_board(&self) {
        let thumbnails = self.board.thumbnails();
        if thumbnails.is_empty() {
            println!("The board is empty.");
            return;
        }
        let user = self.board.user_name();
        println!("{} meme(s) on the board:", thumbnails.len());
        for thumb in thumbnails.iter() {
            println!(
                "  [{}] by {:<16} posted {:<22} expires in {}",
                thumb.id,
                poster_label(&thumb.user_name, user),
                format_posted(thumb.time_posted),
                format_ttl(thumb.time_to_live),
            );
        }
    }

    fn print_detail(&self, meme: &DetailedMeme) {
        let user = self.board.user_name();
        println!("Meme {}", meme.id);
        println!("  posted by   {}", poster_label(&meme.user_name, user));
        println!("  posted at   {}", format_posted(meme.time_posted));
        println!("  expires in  {}", format_ttl(meme.time_to_live));
        println!("  likes       {}", meme.like_count());
        println!("  image       {}", preview(&meme.image_url));
        if self.board.can_like() {
            println!("  Type 'like' to like this meme.");
        }
    }

    fn print_status(&self) {
        match self.board.user_name() {
            Some(name) => println!("Signed in as {name}"),
            None => println!("No user name set."),
        }
        match self.board.staged_file() {
            Some(file) => println!("Staged: {} ({})", file.name(), size_label(file.size())),
            None => println!("Nothing staged."),
        }
        if self.board.is_posting() {
            println!("A post is in flight.");
        }
        if self.board.timer().is_armed() {
            println!("Countdown running.");
        }
    }

    fn print_help(&self) {
        println!("Available commands:");
        println!("  help               Show this help message");
        println!("  health             Ask the gateway whether it is alive");
        println!("  name <name>        Set your user name and load the board");
        println!("  file <path>        Stage an image to post");
        println!("  post               Post the staged image");
        println!("  list               Show the board");
        println!("  refresh            Reload the board from the gateway");
        println!("  open <id>          Open a meme");
        println!("  show               Show the open meme again");
        println!("  like [id]          Like the open meme");
        println!("  close              Close the open meme");
        println!("  status             Show session state");
        println!("  exit               Quit");
    }
}

fn preview(image_url: &str) -> String {
    if image_url.chars().count() <= IMAGE_PREVIEW_CHARS {
        return image_url.to_string();
    }
    let head: String = image_url.chars().take(IMAGE_PREVIEW_CHARS).collect();
    format!("{head}...")
}
