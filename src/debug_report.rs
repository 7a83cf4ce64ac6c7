use rebulk::{Match, RunResult};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(input: &str, result: &RunResult, color: bool) {
    let palette = ansi::Palette::new(color);
    let RunResult { matches, metrics } = result;
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Matching: \"{}\"", input), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Patterns ━━━", ansi::GRAY));
    if metrics.patterns.is_empty() {
        println!("{}", palette.dim("  No pattern registered"));
    }
    for pattern in &metrics.patterns {
        println!(
            "  {} {}  {}",
            palette.paint(&pattern.label, ansi::BLUE),
            if pattern.produced > 0 {
                palette.paint(format!("✓ {} matches", pattern.produced), ansi::GREEN)
            } else {
                palette.dim(format!("✗ {} matches", pattern.produced))
            },
            palette.dim(format!("{:?}", pattern.duration)),
        );
    }

    println!("\n{}", palette.paint("━━━ Rules ━━━", ansi::GRAY));
    if metrics.fired.is_empty() {
        println!("{}", palette.dim("  No rule fired"));
    } else {
        println!("  {}", metrics.fired.iter().map(|name| palette.paint(name, ansi::CYAN)).collect::<Vec<_>>().join(" → "));
    }

    println!("\n{}", palette.paint("━━━ Matches ━━━", ansi::GRAY));
    if matches.is_empty() {
        println!("{}", palette.dim("  No matches"));
    }
    for (idx, m) in matches.sorted().iter().enumerate() {
        print_match(idx, m, &palette);
    }

    if !matches.markers.is_empty() {
        println!("\n{}", palette.paint("━━━ Markers ━━━", ansi::GRAY));
        for (idx, m) in matches.markers.sorted().iter().enumerate() {
            print_match(idx, m, &palette);
        }
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Patterns: {}  │  Rules: {}",
        palette.paint(format!("{:?}", metrics.total), ansi::GREEN),
        palette.paint(format!("{:?}", metrics.patterns_total), ansi::CYAN),
        palette.dim(format!("{:?}", metrics.rules)),
    );
    println!();
}

fn print_match(idx: usize, m: &Match, palette: &ansi::Palette) {
    let mut line = format!(
        "  {} {} {} {}",
        palette.paint(format!("[{}]", idx), ansi::GRAY),
        palette.bold(palette.paint(m.value().to_string(), ansi::GREEN)),
        palette.dim("│"),
        palette.paint(format!("span {}..{}", m.start, m.end), ansi::YELLOW),
    );
    if let Some(name) = &m.name {
        line.push_str(&format!(" {} {}", palette.dim("│ name:"), palette.paint(name, ansi::BLUE)));
    }
    if !m.tags.is_empty() {
        line.push_str(&format!(" {} {}", palette.dim("│ tags:"), palette.paint(m.tags.join(","), ansi::MAGENTA)));
    }
    if m.private {
        line.push_str(&format!(" {}", palette.dim("(private)")));
    }
    println!("{line}");
    for child in &m.children {
        println!(
            "      {} {} {}",
            palette.paint(format!("{}..{}", child.start, child.end), ansi::YELLOW),
            palette.paint(child.name.as_deref().unwrap_or("-"), ansi::BLUE),
            palette.dim(child.value().to_string()),
        );
    }
}
