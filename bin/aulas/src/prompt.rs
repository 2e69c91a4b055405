use std::{
    io::{BufRead, Write},
    sync::Mutex,
};

use aulas::hls::{VariantChooser, VariantPlaylist};

/// Prints `message` and reads one trimmed line from stdin.
pub fn read_line(message: &str) -> anyhow::Result<String> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{message}")?;
    stdout.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Asks until a number in `min..=max` is entered.
pub fn read_index(message: &str, min: usize, max: usize) -> anyhow::Result<usize> {
    loop {
        let line = read_line(message)?;
        match parse_index(&line, min, max) {
            Some(index) => return Ok(index),
            None => println!("Enter a number between {min} and {max}."),
        }
    }
}

pub fn confirm(message: &str) -> anyhow::Result<bool> {
    Ok(is_yes(&read_line(&format!("{message} (y/n): "))?))
}

fn parse_index(line: &str, min: usize, max: usize) -> Option<usize> {
    line.trim()
        .parse()
        .ok()
        .filter(|index| (min..=max).contains(index))
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Lets the operator pick a variant on stdin.
///
/// The choice is remembered until [StdinChooser::forget], so resolving the
/// same lesson again does not ask twice.
#[derive(Default)]
pub struct StdinChooser {
    remembered: Mutex<Option<usize>>,
}

impl StdinChooser {
    pub fn forget(&self) {
        if let Ok(mut remembered) = self.remembered.lock() {
            *remembered = None;
        }
    }
}

impl VariantChooser for StdinChooser {
    fn choose(&self, variants: &[VariantPlaylist]) -> Option<usize> {
        let mut remembered = self.remembered.lock().ok()?;
        if let Some(choice) = *remembered {
            if choice <= variants.len() {
                return Some(choice);
            }
        }

        println!("Available qualities:");
        for (i, variant) in variants.iter().enumerate() {
            println!("[{}] - {variant}", i + 1);
        }
        let choice = read_index("Choose the video quality (number): ", 1, variants.len()).ok()?;
        *remembered = Some(choice);
        Some(choice)
    }
}
