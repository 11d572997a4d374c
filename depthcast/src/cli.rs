use std::io::{self, Write};

use dcbase::constants::DEFAULT_PORT;

/// Prompts on stdin for a port number, re-prompting on non-numeric input.
/// Empty input (just pressing enter) defaults to [`DEFAULT_PORT`].
pub fn prompt_for_port() -> io::Result<u16> {
    loop {
        print!("Enter a port number to start sending frames: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(DEFAULT_PORT);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(DEFAULT_PORT);
        }
        match trimmed.parse::<u16>() {
            Ok(port) => return Ok(port),
            Err(_) => {
                println!("'{trimmed}' is not a valid port number, try again.");
            }
        }
    }
}
