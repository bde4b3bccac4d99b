use console::Style;
use hotspot_core::pipeline::config::Config;
use hotspot_core::scheduler::{JobStatus, RunSummary};

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    ok: Style,
    warn: Style,
    error: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            error: Style::new().red().bold(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_run_summary(config: &Config, summary: &RunSummary) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Track Extraction"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(16)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Source"),
        s.path.apply_to(config.source_folder.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Store"),
        s.path.apply_to(config.database_path().display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Background"),
        s.value.apply_to(config.tracking.background_calc)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Workers"),
        s.value.apply_to(if config.worker_count == 0 {
            "inline".to_string()
        } else {
            config.worker_count.to_string()
        })
    );
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Processed"),
        s.ok.apply_to(summary.processed())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Tracks"),
        s.value.apply_to(summary.tracks())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Skipped"),
        s.warn.apply_to(summary.skipped())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Failed"),
        s.error.apply_to(summary.failed())
    );

    let failures: Vec<_> = summary
        .reports
        .iter()
        .filter_map(|r| match &r.status {
            JobStatus::Failed(message) | JobStatus::Fatal(message) => Some((&r.path, message)),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        println!();
        for (path, message) in failures {
            println!(
                "    {}  {}",
                s.path.apply_to(path.display()),
                s.error.apply_to(message)
            );
        }
    }
    println!();
}
