//! Interactive prompting
//!
//! Any invocation value not supplied by flag or environment variable is
//! collected here, with its default offered in the prompt.

use anyhow::{Context, Result};
use std::io::{self, Write};

/// Prompts until a non-empty value is entered
pub fn required(label: &str) -> Result<String> {
    loop {
        let input = read_value(&format!("{label}: "))?;
        if !input.is_empty() {
            return Ok(input);
        }
        println!("A value is required.");
    }
}

/// Prompts with a default, returned when the user just presses enter
pub fn with_default(label: &str, default: &str) -> Result<String> {
    let input = read_value(&format!("{label} [{default}]: "))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompts for a port, re-prompting until the input parses
pub fn port(label: &str, default: u16) -> Result<u16> {
    loop {
        let input = read_value(&format!("{label} [{default}]: "))?;
        if input.is_empty() {
            return Ok(default);
        }
        match input.parse::<u16>() {
            Ok(port) => return Ok(port),
            Err(_) => println!("Not a valid port: {input}"),
        }
    }
}

/// Prompts for the password without echoing
///
/// Empty input means no password.
pub fn password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{label} (empty for none): "))
        .context("Failed to read password")
}

fn read_value(prompt_text: &str) -> Result<String> {
    print!("{prompt_text}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read input")?;

    Ok(input.trim().to_string())
}
