use colored::Colorize;

use crate::reconcile::ReconcileReport;

pub fn print_step(msg: &str) {
    println!("{} {}", "→".cyan(), msg);
}

pub fn print_skip(msg: &str) {
    println!("{} {}", "·".dimmed(), msg);
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_report(report: &ReconcileReport) {
    print_success(&format!(
        "Provisioning finished: {} APIs, {} consumers, {} plugins created",
        report.apis.len(),
        report.consumers.len(),
        report.plugins.len()
    ));
    for (label, names) in [
        ("APIs", &report.apis),
        ("Consumers", &report.consumers),
        ("Plugins", &report.plugins),
    ] {
        if !names.is_empty() {
            println!("  {}: {}", label.cyan(), names.join(", "));
        }
    }
}
