//! List checks command implementation.

use nbaudit::checks::default_catalog;
use nbaudit::Config;

/// Runs the list-checks command.
pub fn run() {
    println!("Available checks:\n");
    println!("{:<5} {:<15} {:<9} Description", "Tag", "Name", "Group");
    println!("{}", "-".repeat(80));

    for check in default_catalog(&Config::default()) {
        println!(
            "{:<5} {:<15} {:<9} {}",
            check.tag(),
            check.name(),
            check.group().to_string(),
            check.description()
        );
    }

    println!("\nGroups:");
    println!("  lint     - skipped with --skip-lint");
    println!("  build    - skipped with --skip-build");
    println!("  network  - skipped with --offline");

    println!("\nDisable a single check in nbaudit.toml, e.g.:");
    println!("  [checks.security]");
    println!("  enabled = false");
}
