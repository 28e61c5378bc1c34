//! Terminal output helpers

use owo_colors::OwoColorize;
use rider_location::LocationStatus;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print a location status transition
    pub fn location(status: LocationStatus) {
        let label = status.as_str();
        match status {
            LocationStatus::Ready => println!("{} location {}", "●".green(), label.green()),
            LocationStatus::Checking => println!("{} location {}", "●".dimmed(), label.dimmed()),
            LocationStatus::NoPermission | LocationStatus::GpsOff => {
                println!("{} location {}", "●".red(), label.red())
            }
        }
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// Format a rupee amount
pub fn format_amount(amount: f64) -> String {
    format!("₹{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count_singular() {
        assert_eq!(format_count(1, "order", "orders"), "1 order");
    }

    #[test]
    fn test_format_count_plural() {
        assert_eq!(format_count(0, "order", "orders"), "0 orders");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(420.5), "₹420.50");
    }
}
