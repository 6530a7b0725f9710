/// Interactive console for SAM Coupe MGT disk images

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use samfile::*;
use std::path::{Path, PathBuf};

/// Command completer for the REPL
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "add",
                "basic",
                "basic-file",
                "cat",
                "create",
                "dir",
                "exit",
                "export",
                "extract-all",
                "help",
                "info",
                "load",
                "ls",
                "map",
                "open",
                "quit",
                "save",
                "stat",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the first word (command name)
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".samfile_history");
        p
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("=== samfile ===");
    println!("Interactive console for SAM Coupe MGT disk images.");
    println!("Type 'help' for available commands\n");

    let mut rl = match Editor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create editor: {}", e);
            return;
        }
    };
    rl.set_helper(Some(CommandCompleter::new()));

    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    let mut image: Option<DiskImage> = None;
    let mut image_path: Option<String> = None;

    loop {
        let input = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }
        let command = parts[0].to_lowercase();

        match command.as_str() {
            "help" => print_help(),
            "quit" | "exit" => break,
            "open" | "load" => {
                if parts.len() < 2 {
                    println!("Usage: open <path>");
                    continue;
                }
                match DiskImage::open(&parts[1]) {
                    Ok(img) => {
                        println!("Opened: {}", parts[1]);
                        image = Some(img);
                        image_path = Some(parts[1].clone());
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "create" => {
                image = Some(DiskImage::blank());
                image_path = None;
                println!("Created blank MGT image");
            }
            "basic-file" => {
                if parts.len() < 2 {
                    println!("Usage: basic-file <path>");
                    continue;
                }
                match std::fs::read(&parts[1]) {
                    Ok(data) => match decode_sam_basic(&data) {
                        Ok(listing) => print!("{}", listing),
                        Err(e) => println!("Error: {}", e),
                    },
                    Err(e) => println!("Error reading file: {}", e),
                }
            }
            _ => {
                let Some(img) = image.as_mut() else {
                    if is_known_command(&command) {
                        println!("No image loaded. Use 'open <path>' or 'create' first.");
                    } else {
                        println!("Unknown command: {}. Type 'help' for available commands.", command);
                    }
                    continue;
                };
                if let Err(e) = run_image_command(img, &mut image_path, &command, &parts[1..]) {
                    println!("Error: {}", e);
                }
            }
        }
    }

    if let Some(history_path) = history_path() {
        let _ = rl.save_history(&history_path);
    }
    if image.as_ref().is_some_and(|img| img.is_changed()) {
        println!("Warning: unsaved changes discarded");
    }
    println!("Goodbye!");
}

fn is_known_command(command: &str) -> bool {
    CommandCompleter::new().commands.contains(&command)
}

/// Run a command that needs an open image
fn run_image_command(
    image: &mut DiskImage,
    image_path: &mut Option<String>,
    command: &str,
    args: &[String],
) -> Result<()> {
    match command {
        "info" => print_info(image),
        "ls" | "dir" => list_files(image),
        "stat" => {
            let Some(name) = args.first() else {
                println!("Usage: stat <file>");
                return Ok(());
            };
            print_stat(image, name)?;
        }
        "cat" => {
            let Some(name) = args.first() else {
                println!("Usage: cat <file>");
                return Ok(());
            };
            let file = image.file(name)?;
            println!("File: {} ({} bytes)", name, file.body.len());
            print_hex_dump(&file.body, usize::MAX);
        }
        "basic" => {
            let Some(name) = args.first() else {
                println!("Usage: basic <file>");
                return Ok(());
            };
            let file = image.file(name)?;
            match decode_sam_basic_file(&file)? {
                Some(listing) => print!("{}", listing),
                None => println!("{} is a {} file, not SAM BASIC", name, file.header.file_type),
            }
        }
        "export" => {
            let Some(name) = args.first() else {
                println!("Usage: export <file> [output_path]");
                return Ok(());
            };
            let output_path = args.get(1).cloned().unwrap_or_else(|| name.clone());
            let file = image.file(name)?;
            std::fs::write(&output_path, &file.body)?;
            println!("Exported {} ({} bytes) to {}", name, file.body.len(), output_path);
        }
        "extract-all" => {
            let dir = PathBuf::from(args.first().map(String::as_str).unwrap_or("."));
            extract_all(image, &dir)?;
        }
        "add" => {
            if args.len() < 2 {
                println!("Usage: add <path> <load> [exec] [name]");
                return Ok(());
            }
            add_file(image, args)?;
        }
        "map" => samfile::map::draw_sector_map(image)?,
        "save" => {
            let Some(path) = args.first().or(image_path.as_ref()).cloned() else {
                println!("Usage: save <path>");
                return Ok(());
            };
            image.save(&path)?;
            println!("Saved to: {}", path);
            *image_path = Some(path);
        }
        _ => println!("Unknown command: {}. Type 'help' for available commands.", command),
    }
    Ok(())
}

/// Parse command line input, respecting quoted strings
fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

/// Parse a decimal or 0x-prefixed hex address
fn parse_address(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  open <path>                    - Open an MGT disk image (use quotes for paths with spaces)");
    println!("  create                         - Create a blank MGT image");
    println!("  info                           - Show disk information");
    println!("  ls, dir                        - List files on disk");
    println!("  stat <file>                    - Show directory entry details");
    println!("  cat <file>                     - Hex dump a file");
    println!("  basic <file>                   - List a SAM BASIC program");
    println!("  basic-file <path>              - List a SAM BASIC program from a host file");
    println!("  export <file> [output_path]    - Export file body to host filesystem");
    println!("  extract-all [dir]              - Export every file to a host directory");
    println!("  add <path> <load> [exec] [name] - Add a host file as CODE (addresses decimal or 0x hex)");
    println!("  map                            - Visual sector map (yellow=directory, white=in use)");
    println!("  save [path]                    - Save image (defaults to the opened file)");
    println!("  help                           - Show this help");
    println!("  quit, exit                     - Exit");
}

fn print_info(image: &DiskImage) {
    if let Some(filename) = image.filename() {
        println!("Filename: {}", filename);
    }
    println!("{}", image.info());
    println!("Changed: {}", if image.is_changed() { "Yes" } else { "No" });
}

fn list_files(image: &DiskImage) {
    let journal = image.directory();
    let entries: Vec<_> = journal.used_entries().collect();
    if entries.is_empty() {
        println!("No files found.");
        return;
    }

    println!(
        "{:>3} {:<10} {:<12} {:>4} {:>6} {:>6} {:>6}",
        "Idx", "Name", "Type", "Sec", "Start", "Length", "Exec"
    );
    println!("{}", "-".repeat(54));
    for (index, entry) in entries {
        let exec = entry
            .execution_address()
            .map(|a| a.to_string())
            .unwrap_or_default();
        println!(
            "{:>3} {:<10} {:<12} {:>4} {:>6} {:>6} {:>6}",
            index,
            entry.name.to_string(),
            entry.file_type.to_string(),
            entry.sectors,
            entry.start_address(),
            entry.length(),
            exec
        );
    }
}

fn print_stat(image: &DiskImage, name: &str) -> Result<()> {
    let journal = image.directory();
    let (index, entry) = journal
        .find(name)
        .ok_or_else(|| SamError::FileNotFound(name.to_string()))?;

    println!("Slot: {}", index);
    println!("Name: {}", entry.name);
    println!("Type: {}", entry.file_type);
    println!(
        "Flags: {}{}",
        if entry.is_hidden() { "H" } else { "-" },
        if entry.is_protected() { "P" } else { "-" }
    );
    println!("Sectors: {} (first {})", entry.sectors, entry.first_sector);
    println!("Start: {}", entry.start_address());
    println!("Length: {}", entry.length());
    match entry.file_type {
        FileType::SamBasic => {
            if let Some(line) = entry.basic_start_line() {
                println!("Auto-run line: {}", line);
            }
            println!("Program length: {}", entry.program_length());
            println!("Numeric variables: +{}", entry.numeric_variables_offset());
            println!("Array variables: +{}", entry.string_array_variables_offset());
        }
        FileType::Screen => {
            if let Some(mode) = entry.screen_mode() {
                println!("Screen mode: {}", mode);
            }
        }
        _ => {
            if let Some(exec) = entry.execution_address() {
                println!("Execution: {}", exec);
            }
        }
    }
    println!("Sector map: {}", entry.sector_map);
    Ok(())
}

fn extract_all(image: &DiskImage, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let journal = image.directory();
    for (index, entry) in journal.used_entries() {
        let name = entry.name.to_string();
        let file = match image.read_entry_file(index, entry) {
            Ok(file) => file,
            Err(e) => {
                println!("Skipping {}: {}", name, e);
                continue;
            }
        };
        let host_name: String = name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        let path = dir.join(host_name);
        std::fs::write(&path, &file.body)?;
        println!("Exported {} ({} bytes) to {}", name, file.body.len(), path.display());
    }
    Ok(())
}

fn add_file(image: &mut DiskImage, args: &[String]) -> Result<()> {
    let path = Path::new(&args[0]);
    let load = parse_address(&args[1])
        .ok_or_else(|| SamError::invalid_address(format!("Cannot parse load address {:?}", args[1])))?;
    let execution = match args.get(2) {
        Some(arg) => Some(parse_address(arg).ok_or_else(|| {
            SamError::invalid_address(format!("Cannot parse execution address {:?}", arg))
        })?),
        None => None,
    };
    let name = match args.get(3) {
        Some(name) => name.clone(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let body = std::fs::read(path)?;
    image.add_code_file(&name, &body, load, execution)?;
    println!("Added {} ({} bytes) at {}", name, body.len(), load);
    Ok(())
}

fn print_hex_dump(data: &[u8], max_bytes: usize) {
    let len = data.len().min(max_bytes);

    for (i, chunk) in data[..len].chunks(16).enumerate() {
        print!("{:04X}: ", i * 16);

        for (j, byte) in chunk.iter().enumerate() {
            print!("{:02X} ", byte);
            if j == 7 {
                print!(" ");
            }
        }

        // Pad if less than 16 bytes
        for j in chunk.len()..16 {
            print!("   ");
            if j == 7 {
                print!(" ");
            }
        }

        print!(" |");
        for byte in chunk {
            let c = if (32..127).contains(byte) {
                *byte as char
            } else {
                '.'
            };
            print!("{}", c);
        }
        println!("|");
    }

    if data.len() > max_bytes {
        println!("... ({} more bytes)", data.len() - max_bytes);
    }
}
