// Error handling utilities for consistent error messages and exit codes

use std::process;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate that an ID is a positive integer
pub fn validate_id(id_str: &str, kind: &str) -> Result<i64, String> {
    id_str.trim().parse::<i64>()
        .map_err(|_| format!("Invalid {} ID: '{}'. {} ID must be a number.", kind.to_lowercase(), id_str, kind))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(format!("Invalid {} ID: {}. {} ID must be positive.", kind.to_lowercase(), id, kind))
            }
        })
}

/// Validate a target index within a stage column (non-negative integer)
pub fn validate_index(index_str: &str) -> Result<usize, String> {
    index_str.trim().parse::<usize>()
        .map_err(|_| format!("Invalid index: '{}'. Index must be a non-negative number.", index_str))
}

/// Ask a yes/no question on stderr; anything but y/yes is a no
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    eprint!("{} [y/N]: ", prompt);
    std::io::Write::flush(&mut std::io::stderr())
        .map_err(|e| anyhow::anyhow!("Failed to flush stderr: {}", e))?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)
        .map_err(|e| anyhow::anyhow!("Failed to read input: {}", e))?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
