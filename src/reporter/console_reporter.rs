//! Console-based server list reporter.

use std::io::{self, Write};

use crate::domain::{SubServer, Target};
use crate::reporter::ServerListReporter;

/// Reports server lists to the console as an aligned table.
pub struct ConsoleReporter {
    /// Whether to show addresses and flags
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Enable or disable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn format_servers(&self, target: &Target, servers: &[SubServer]) -> String {
        let name_width = servers
            .iter()
            .map(|server| server.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("Server".len());

        let mut output = format!("{} - {} server(s)\n", target.name, servers.len());

        if self.verbose {
            output.push_str(&format!(
                "{:<name_width$}  {:>12}  {:<21}  {:>5}  {:>8}\n",
                "Server", "Population", "Address", "State", "Property"
            ));
        } else {
            output.push_str(&format!("{:<name_width$}  {:>12}\n", "Server", "Population"));
        }

        for server in servers {
            let population = server.population.to_string();
            if self.verbose {
                output.push_str(&format!(
                    "{:<name_width$}  {:>12}  {:<21}  {:>5}  {:>8}\n",
                    server.name, population, server.address, server.state, server.property
                ));
            } else {
                output.push_str(&format!("{:<name_width$}  {:>12}\n", server.name, population));
            }
        }

        output
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerListReporter for ConsoleReporter {
    fn on_start(&self, target: &Target) {
        println!("Listening for the {} server list ({})", target.name, target.socket_addr());
        println!("Log in to the game now. Press Ctrl+C to stop.\n");
    }

    fn report(&self, target: &Target, servers: &[SubServer]) {
        let output = self.format_servers(target, servers);
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{}", output);
    }

    fn on_nothing_found(&self, target: &Target) {
        println!("\nNo server list from {} was captured.", target.name);
    }
}
